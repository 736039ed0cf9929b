//! Role prompt, extraction prompts, and the fixed user-facing strings.

use super::state::ChatStatus;

/// First message of every conversation.
pub const GREETING: &str = "Hello! Please tell me the area where you would like to live.";

/// Answer shown when the needs record is attached.
pub const CHAT_ENDED_ANSWER: &str = "Needs extraction is complete.";

const ADDRESS_CONFIRMED_PREFIX: &str = "Address confirmed: ";

/// The fixed system instruction for the answer call.
pub const ROLE_PROMPT: &str = r#"You are a chatbot that extracts a user's commute needs for choosing where to live.
Your role:
- Keep the conversation going until the required commute needs are collected.
- Remember earlier turns so the user can refer back to them.
- Extract the required commute needs from the user's answers.
- End the conversation once the required needs (or everything the user wants to share) are collected.
- Follow the chat manual below.
- Give objective information only. Do not share your own opinions or judgements.

Required commute needs:
- Origin (= preferred residential area)
- Destination (= workplace, university, etc.)
- Travel time (e.g. within 30 minutes, within 10 minutes)
- Transport modes (subway, bus, walking)
- Transfers (e.g. no transfers, one transfer)

Chat manual:
- At least one of origin or destination must be collected. The conversation cannot end without one.
- The destination comes first. Ask for it first; once it is known, do not ask further about the origin.
- If there is no origin, do not ask again about a preferred residential area.
- If the user says they are looking for areas within some travel time, continue without asking for an origin.
- Once an origin or destination is known, collect travel time, transport modes and transfers.
- If an answer is ambiguous, ask a follow-up question. Re-ask at most 2 times for the same ambiguity.
- If a place is ambiguous, confirm its role: "Is this place your origin?" or "Is this place your destination?".
- Transfer information cannot have several values. If the user answers like "30 minutes with no transfer, 20 minutes with one transfer", ask them to choose exactly one transfer option before anything else. Keep only the travel time and modes tied to the chosen option and ignore the other conditions.
- If the user did not give an exact number of transfers, ask for the number.

Output format:
- Reply with ONLY this JSON object and no other text:
{"answer": "<your message to the user>"}
- When the conversation ends, put the closing message in "answer" the same way.
"#;

/// Schema of the `needs` object requested from the extraction call.
const NEEDS_KEYS: &str = r#"| key | value |
| --- | --- |
| fromWhere | list of origins |
| toWhere | list of destinations |
| transportation | one or more of "metro", "bus", "walk" |
| interchangeability | whether modes may be mixed on one trip; true if the user did not say |
| travelTimeMin | minutes; if the user gives a single value use it for both min and max; -1 if travel time does not matter |
| travelTimeMax | minutes; never below travelTimeMin; -1 if travel time does not matter |
| transferCountMin | count; -1 if transfers do not matter |
| transferCountMax | count; never below transferCountMin; -1 if transfers do not matter |"#;

/// The per-turn JSON context block sent as the user message.
///
/// Newlines in the answer are flattened to spaces.
pub fn turn_context(user_id: &str, turn_counter: u32, status: ChatStatus, answer: &str) -> String {
    serde_json::json!({
        "userId": user_id,
        "turnCounter": turn_counter,
        "status": status,
        "answer": answer.replace('\n', " "),
    })
    .to_string()
}

/// Instruction for the second call: find the destination (and, once both
/// ends are known, the full needs) in the accumulated history.
pub fn destination_extraction_prompt(history: &[String]) -> String {
    let conversation = history.join("\n");
    let keys = NEEDS_KEYS;
    format!(
        r#"Extract the place the user specified as their destination from the conversation below, as JSON.

Conversation:
{conversation}

Rules:
- Output ONLY a JSON object, no other text.
- If a destination was mentioned: {{"addressInfo": "<address>"}}
- If no place was mentioned, omit addressInfo: {{}}
- If both an origin and a destination are known, also include a "needs" object with these keys:
{keys}

Example: {{"addressInfo": "Gangnam Station"}}"#
    )
}

/// Answer asking the caller to confirm a parsed destination.
pub fn address_check_prompt(destination: &str) -> String {
    format!("Please confirm the destination address: {destination}")
}

/// History entry recorded when the caller confirms an address.
pub fn address_confirmation(address: &str) -> String {
    format!("{ADDRESS_CONFIRMED_PREFIX}{address}")
}

/// Whether `history` already holds the confirmation entry for `address`.
///
/// Surrounding whitespace on either side is ignored, since confirmations
/// record the address exactly as submitted.
pub fn is_confirmed(history: &[String], address: &str) -> bool {
    let address = address.trim();
    history.iter().any(|h| {
        h.trim_start()
            .strip_prefix(ADDRESS_CONFIRMED_PREFIX)
            .is_some_and(|confirmed| confirmed.trim() == address)
    })
}
