//! Conversation state machine: which status a chat is in.

use serde::{Deserialize, Serialize};

/// Status of a conversation.
///
/// `Chatting` is the default. `AddressCheck` means a destination was parsed
/// from free text and is waiting for the caller to confirm it. `ChatEnded`
/// is terminal and carries the extracted needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChatStatus {
    Chatting,
    AddressCheck,
    ChatEnded,
}

impl ChatStatus {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: ChatStatus) -> bool {
        use ChatStatus::*;
        matches!(
            (self, target),
            (Chatting, Chatting)
                | (Chatting, AddressCheck)
                | (Chatting, ChatEnded)
                | (AddressCheck, Chatting)
                | (AddressCheck, AddressCheck)
                | (AddressCheck, ChatEnded)
        )
    }
}

impl Default for ChatStatus {
    fn default() -> Self {
        Self::Chatting
    }
}

impl std::fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Chatting => "chatting",
            Self::AddressCheck => "addressCheck",
            Self::ChatEnded => "chatEnded",
        };
        write!(f, "{s}")
    }
}
