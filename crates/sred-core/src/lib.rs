//! SRED Drafter Core
//!
//! Shared foundation for the drafting pipeline:
//! - Domain types (topics, chunks, drafts, verdicts, reports)
//! - Pipeline configuration
//! - Error taxonomy

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::{PipelineConfig, RubricWeights};
pub use error::{LlmError, PipelineError, StoreError};
pub use types::{
    ChunkStatus, ExampleChunk, FinalReport, GenerationRequest, RequestId, ReviewVerdict,
    SectionDraft, Topic,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the drafting pipeline
    pub use crate::{
        ChunkStatus, ExampleChunk, FinalReport, GenerationRequest, LlmError, PipelineConfig,
        PipelineError, RequestId, ReviewVerdict, SectionDraft, StoreError, Topic,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
