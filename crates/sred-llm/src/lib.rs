//! SRED Drafter LLM transport
//!
//! The concrete [`sred_agents::LanguageModel`] implementation for
//! OpenAI-compatible chat-completion endpoints.

#![warn(unreachable_pub)]

pub mod client;

pub use client::OpenAiClient;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
