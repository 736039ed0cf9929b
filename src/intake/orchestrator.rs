//! IntakeOrchestrator owns the conversation state machine and the
//! turn-processing policy.
//!
//! The service holds no per-user state. History and counters travel inside
//! the request/response payloads, so one orchestrator is shared across all
//! requests without locking.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::IntakeConfig;
use crate::error::IntakeError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

use super::extract::{extract_address, extract_answer, extract_needs};
use super::model::{AddressCheckPayload, TurnRequest, TurnResponse};
use super::prompts::{
    CHAT_ENDED_ANSWER, GREETING, ROLE_PROMPT, address_check_prompt, address_confirmation,
    destination_extraction_prompt, is_confirmed, turn_context,
};
use super::state::ChatStatus;

/// User id reported on responses not tied to a caller.
const SYSTEM_USER: &str = "system";
const PLACEHOLDER_USER: &str = "anonymous";

/// Coordinates one conversation turn: model calls, history, and status.
pub struct IntakeOrchestrator {
    llm: Arc<dyn LlmProvider>,
    config: IntakeConfig,
}

impl IntakeOrchestrator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: IntakeConfig) -> Self {
        Self { llm, config }
    }

    /// Open a conversation with the fixed greeting. No model call.
    pub fn start_chat(&self) -> TurnResponse {
        TurnResponse {
            user_id: SYSTEM_USER.to_string(),
            turn_counter: 0,
            status: ChatStatus::Chatting,
            answer: GREETING.to_string(),
            history: Vec::new(),
            address_info: None,
            needs: None,
        }
    }

    /// Process one inbound turn.
    ///
    /// 1. Address-check submissions are answered locally.
    /// 2. Otherwise ask the model for an answer and extract it.
    /// 3. Append the user text and the answer to history, skipping exact repeats.
    /// 4. Ask the model for a destination (and needs) over the full history.
    /// 5. An unconfirmed destination moves to `addressCheck`; a complete
    ///    needs record moves to `chatEnded`; anything else stays `chatting`.
    ///
    /// Any error aborts the turn without a partial response.
    pub async fn process_turn(&self, request: TurnRequest) -> Result<TurnResponse, IntakeError> {
        if request.address_check {
            return self.process_address_check(&request);
        }

        if !request.status.can_transition_to(ChatStatus::Chatting) {
            return Err(IntakeError::MalformedInput(format!(
                "conversation is already {}",
                request.status
            )));
        }

        let turn_counter = request.turn_counter.saturating_add(1);
        info!(
            user_id = %request.user_id,
            turn_counter = request.turn_counter,
            status = %request.status,
            "Processing chat turn"
        );

        let raw = self
            .complete(
                ROLE_PROMPT.to_string(),
                turn_context(
                    &request.user_id,
                    request.turn_counter,
                    request.status,
                    &request.answer,
                ),
                self.config.answer_temperature,
            )
            .await?;
        let answer = extract_answer(&raw)?;

        let mut history = request.history.clone().unwrap_or_default();
        append_unique(&mut history, &request.answer);
        append_unique(&mut history, &answer);

        let extraction = self.extract_destination(&request.user_id, &history).await?;

        if let Some(destination) = extract_address(&extraction) {
            if !is_confirmed(&history, &destination) {
                info!(
                    user_id = %request.user_id,
                    destination = %destination,
                    "Destination found, asking for confirmation"
                );
                return Ok(TurnResponse {
                    user_id: request.user_id,
                    turn_counter,
                    status: ChatStatus::AddressCheck,
                    answer: address_check_prompt(&destination),
                    history,
                    address_info: Some(destination),
                    needs: None,
                });
            }
            debug!(destination = %destination, "Destination already confirmed");
        }

        if let Some(needs) = extract_needs(&extraction).filter(|n| n.is_complete()) {
            info!(
                user_id = %request.user_id,
                origins = needs.from_where.len(),
                destinations = needs.to_where.len(),
                "Needs extraction complete"
            );
            return Ok(TurnResponse {
                user_id: request.user_id,
                turn_counter,
                status: ChatStatus::ChatEnded,
                answer: CHAT_ENDED_ANSWER.to_string(),
                history,
                address_info: None,
                needs: Some(needs),
            });
        }

        Ok(TurnResponse {
            user_id: request.user_id,
            turn_counter,
            status: ChatStatus::Chatting,
            answer,
            history,
            address_info: None,
            needs: None,
        })
    }

    /// Answer an address-confirmation submission. No model call.
    ///
    /// The confirmation becomes the sole history entry, which later turns use
    /// to recognise the destination as confirmed.
    pub fn process_address_check(&self, request: &TurnRequest) -> Result<TurnResponse, IntakeError> {
        let payload = AddressCheckPayload::from_request_data(request.request_data.as_ref())?;
        let confirmation = address_confirmation(&payload.address);

        info!(
            user_id = %request.user_id,
            address = %payload.address,
            "Address confirmed"
        );

        Ok(TurnResponse {
            user_id: request.user_id.clone(),
            turn_counter: request.turn_counter.saturating_add(1),
            status: ChatStatus::Chatting,
            answer: confirmation.clone(),
            history: vec![confirmation],
            address_info: Some(payload.address),
            needs: None,
        })
    }

    /// Placeholder lookup. There is no store, so nothing is consulted.
    pub fn get_chat_by_session_id(&self, session_id: &str) -> TurnResponse {
        TurnResponse {
            user_id: PLACEHOLDER_USER.to_string(),
            turn_counter: 1,
            status: ChatStatus::Chatting,
            answer: format!("Last message for session {session_id}"),
            history: Vec::new(),
            address_info: None,
            needs: None,
        }
    }

    /// Validate an address payload and acknowledge it for a session.
    pub fn verify_address(&self, payload: &Value, session_id: &str) -> Result<String, IntakeError> {
        let payload = AddressCheckPayload::from_request_data(Some(payload))?;
        Ok(format!(
            "Address {} verified for session {session_id}",
            payload.address
        ))
    }

    /// Second model call: destination and needs over the updated history.
    async fn extract_destination(
        &self,
        user_id: &str,
        history: &[String],
    ) -> Result<String, IntakeError> {
        let counter = u32::try_from(history.len()).unwrap_or(u32::MAX);
        self.complete(
            destination_extraction_prompt(history),
            turn_context(user_id, counter, ChatStatus::Chatting, &history.join("\n")),
            self.config.extraction_temperature,
        )
        .await
    }

    /// Send the (system, user) pair and return the raw text.
    async fn complete(
        &self,
        system: String,
        user: String,
        temperature: f32,
    ) -> Result<String, IntakeError> {
        let request = CompletionRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(temperature);

        match self.llm.complete(request).await {
            Ok(response) => Ok(response.content),
            Err(e) => {
                warn!(model = self.llm.model_name(), error = %e, "LLM call failed");
                Err(IntakeError::UpstreamUnavailable(e))
            }
        }
    }
}

/// Push `entry` unless history already contains that exact string.
///
/// A containment check, not semantic dedup. Blank entries are skipped.
pub fn append_unique(history: &mut Vec<String>, entry: &str) {
    if entry.trim().is_empty() {
        return;
    }
    if !history.iter().any(|h| h == entry) {
        history.push(entry.to_string());
    }
}
