//! Conversational commute-needs intake.
//!
//! A chat collects where the user wants to live and where they commute to.
//! Each turn is answered by the LLM; a second call looks for a destination
//! to confirm and, once origin and destination are both known, a full
//! `Needs` record that ends the conversation.

pub mod extract;
pub mod model;
pub mod orchestrator;
pub mod prompts;
pub mod routes;
pub mod state;

pub use extract::{build_needs_defaults, extract_address, extract_answer, extract_needs};
pub use model::{AddressCheckPayload, Needs, TransportMode, TurnRequest, TurnResponse};
pub use orchestrator::IntakeOrchestrator;
pub use routes::{IntakeRouteState, intake_routes};
pub use state::ChatStatus;
