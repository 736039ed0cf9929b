//! Wire types for turns and the extracted commute needs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IntakeError;

use super::state::ChatStatus;

/// Sentinel meaning "no constraint" on a numeric bound.
pub const NO_CONSTRAINT: i32 = -1;

/// A way of getting from origin to destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[serde(alias = "subway")]
    Metro,
    Bus,
    Walk,
}

impl TransportMode {
    /// Parse a label the model (or a user) might produce. Unknown labels are `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "metro" | "subway" | "지하철" => Some(Self::Metro),
            "bus" | "버스" => Some(Self::Bus),
            "walk" | "walking" | "도보" => Some(Self::Walk),
            _ => None,
        }
    }
}

/// The commute requirement extracted at the end of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Needs {
    pub from_where: Vec<String>,
    pub to_where: Vec<String>,
    pub transportation: Vec<TransportMode>,
    /// Whether the listed modes may be mixed on one trip.
    pub interchangeability: bool,
    /// Minutes.
    pub travel_time_min: i32,
    pub travel_time_max: i32,
    pub transfer_count_min: i32,
    pub transfer_count_max: i32,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            from_where: Vec::new(),
            to_where: Vec::new(),
            transportation: Vec::new(),
            interchangeability: true,
            travel_time_min: NO_CONSTRAINT,
            travel_time_max: NO_CONSTRAINT,
            transfer_count_min: NO_CONSTRAINT,
            transfer_count_max: NO_CONSTRAINT,
        }
    }
}

impl Needs {
    /// Both an origin and a destination are known.
    pub fn is_complete(&self) -> bool {
        !self.from_where.is_empty() && !self.to_where.is_empty()
    }

    /// Enforce the bound invariants.
    ///
    /// Values below the sentinel collapse to it. A lone bound is mirrored to
    /// its partner and an inverted pair is swapped, so `max >= min` holds
    /// whenever both are set. Repeated transport modes are dropped.
    pub fn normalized(mut self) -> Self {
        (self.travel_time_min, self.travel_time_max) =
            normalize_bounds(self.travel_time_min, self.travel_time_max);
        (self.transfer_count_min, self.transfer_count_max) =
            normalize_bounds(self.transfer_count_min, self.transfer_count_max);
        let mut seen = Vec::with_capacity(self.transportation.len());
        self.transportation.retain(|mode| {
            if seen.contains(mode) {
                false
            } else {
                seen.push(*mode);
                true
            }
        });
        self
    }
}

fn normalize_bounds(min: i32, max: i32) -> (i32, i32) {
    let min = min.max(NO_CONSTRAINT);
    let max = max.max(NO_CONSTRAINT);
    match (min, max) {
        (NO_CONSTRAINT, NO_CONSTRAINT) => (NO_CONSTRAINT, NO_CONSTRAINT),
        (NO_CONSTRAINT, max) => (max, max),
        (min, NO_CONSTRAINT) => (min, min),
        (min, max) if max < min => (max, min),
        bounds => bounds,
    }
}

/// One inbound chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub user_id: String,
    #[serde(default, alias = "chatNumber")]
    pub turn_counter: u32,
    #[serde(default, alias = "chatStatus")]
    pub status: ChatStatus,
    /// The user's free text.
    #[serde(default)]
    pub answer: String,
    /// Marks this request as an address-confirmation submission.
    #[serde(default)]
    pub address_check: bool,
    /// Side-channel payload. Only read for address checks, via
    /// [`AddressCheckPayload::from_request_data`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_data: Option<Value>,
    #[serde(default, alias = "previousConversations")]
    pub history: Option<Vec<String>>,
}

impl TurnRequest {
    /// A plain chat turn.
    pub fn chat(user_id: impl Into<String>, turn_counter: u32, answer: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            turn_counter,
            status: ChatStatus::Chatting,
            answer: answer.into(),
            address_check: false,
            request_data: None,
            history: None,
        }
    }

    /// An address-confirmation submission carrying `{"address": ...}`.
    pub fn address_check(user_id: impl Into<String>, turn_counter: u32, address: &str) -> Self {
        Self {
            address_check: true,
            status: ChatStatus::AddressCheck,
            request_data: Some(serde_json::json!({ "address": address })),
            ..Self::chat(user_id, turn_counter, "")
        }
    }

    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = Some(history);
        self
    }
}

/// The reply to a [`TurnRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub user_id: String,
    pub turn_counter: u32,
    pub status: ChatStatus,
    /// Text to display to the user.
    pub answer: String,
    #[serde(default)]
    pub history: Vec<String>,
    /// Address under confirmation. Only meaningful for `addressCheck`.
    #[serde(default)]
    pub address_info: Option<String>,
    /// Extracted needs. Only meaningful for `chatEnded`.
    #[serde(default)]
    pub needs: Option<Needs>,
}

/// Typed view of the side-channel bag for address submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressCheckPayload {
    pub address: String,
}

impl AddressCheckPayload {
    /// Validate the open data bag at the boundary.
    ///
    /// Fails with `MalformedInput` when the bag is absent, is not an object,
    /// or its `address` is missing or not a string. The address itself is
    /// kept verbatim, blank or not.
    pub fn from_request_data(data: Option<&Value>) -> Result<Self, IntakeError> {
        let data = data
            .ok_or_else(|| IntakeError::MalformedInput("requestData is required".to_string()))?;
        let obj = data.as_object().ok_or_else(|| {
            IntakeError::MalformedInput("requestData must be a JSON object".to_string())
        })?;
        let address = match obj.get("address") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(IntakeError::MalformedInput(format!(
                    "address must be a string, got {other}"
                )));
            }
            None => {
                return Err(IntakeError::MalformedInput("address is required".to_string()));
            }
        };
        Ok(Self { address })
    }
}
