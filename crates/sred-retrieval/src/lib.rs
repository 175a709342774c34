//! SRED Drafter Retrieval
//!
//! Semantic retrieval over the persisted example store:
//! - `ExampleStore` trait (embed + filtered vector query)
//! - JSON-snapshot store with deterministic embedding
//! - `Retriever` with the filter-relaxation ladder

#![warn(unreachable_pub)]

pub mod embed;
pub mod retriever;
pub mod store;

// Re-exports for convenience
pub use embed::{cosine_similarity, embed_text, EMBEDDING_DIM};
pub use retriever::{RetrievalResult, Retriever};
pub use store::{ChunkFilter, ExampleStore, JsonExampleStore, ScoredChunk};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
