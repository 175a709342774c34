//! SRED Drafter Pipeline
//!
//! The orchestrator that drives one generation request through
//! retrieval, concurrent per-topic drafting, and bounded review rounds.
//!
//! # Example
//!
//! ```rust,ignore
//! use sred_agents::{LlmReviewer, TopicGenerator};
//! use sred_core::{GenerationRequest, PipelineConfig};
//! use sred_llm::OpenAiClient;
//! use sred_pipeline::Orchestrator;
//! use sred_retrieval::{JsonExampleStore, Retriever};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::new();
//! let store = Arc::new(JsonExampleStore::from_path("chunks.json")?);
//! let llm = Arc::new(OpenAiClient::new("https://api.openai.com/v1", "key", &config.model)?);
//!
//! let orchestrator = Orchestrator::new(
//!     Retriever::new(store, config.top_k),
//!     TopicGenerator::new(llm.clone(), config.clone()),
//!     Arc::new(LlmReviewer::new(llm, config.clone())),
//!     config,
//! )?;
//!
//! let request = GenerationRequest::new("pharmacy", "01.01", "Predict drug shortages")?;
//! let report = orchestrator.run(request).await?;
//! println!("caveat: {}", report.quality_caveat);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod orchestrator;
pub mod phase;

// Re-exports for convenience
pub use orchestrator::Orchestrator;
pub use phase::{allowed_transitions, Phase};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
