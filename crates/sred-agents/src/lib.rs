//! SRED Drafter Agents
//!
//! The drafting and scoring agents:
//! - `LanguageModel` trait at the model seam
//! - Prompt library (topic instructions, rubric, refinement directive)
//! - `TopicGenerator` with transient-failure retry and backoff
//! - `Reviewer` trait and the model-backed `LlmReviewer`

#![warn(unreachable_pub)]

pub mod generator;
pub mod llm;
pub mod prompts;
pub mod reviewer;

// Re-exports for convenience
pub use generator::{RevisionContext, TopicGenerator};
pub use llm::{CompletionRequest, LanguageModel};
pub use reviewer::{LlmReviewer, Reviewer};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
