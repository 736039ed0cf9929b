//! Commute intake: chat-driven extraction of housing commute needs.

pub mod config;
pub mod error;
pub mod intake;
pub mod llm;
