//! Ranked retrieval with filter relaxation
//!
//! Each topic gets one retrieval per request. The retriever embeds the
//! query once and walks a relaxation ladder until it has `top_k` chunks:
//! industry is dropped first, then tech code. The approved-only and
//! topic constraints are never relaxed, so rejected chunks can never be
//! surfaced as positive exemplars.

use crate::store::{ChunkFilter, ExampleStore};
use sred_core::{ChunkStatus, ExampleChunk, GenerationRequest, PipelineError, Topic};
use std::collections::HashSet;
use std::sync::Arc;

/// Ranked retrieval output for one topic
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    /// Topic the examples were retrieved for
    pub topic: Topic,
    /// Chunks, most relevant first
    pub chunks: Vec<ExampleChunk>,
}

impl RetrievalResult {
    /// Whether no examples were found
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Retrieves grounded examples from an [`ExampleStore`]
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn ExampleStore>,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever over a shared store
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn ExampleStore>, top_k: usize) -> Self {
        Self { store, top_k }
    }

    /// Retrieve the top-K approved examples for one topic
    ///
    /// # Errors
    /// - `PipelineError::RetrievalUnavailable` when the store cannot be
    ///   reached; fatal to the whole request
    pub async fn retrieve(
        &self,
        topic: Topic,
        request: &GenerationRequest,
    ) -> Result<RetrievalResult, PipelineError> {
        let query = self.store.embed(&request.query_text()).await?;

        let mut chunks: Vec<ExampleChunk> = Vec::with_capacity(self.top_k);
        let mut seen: HashSet<String> = HashSet::new();

        for filter in self.filter_ladder(topic, request) {
            if chunks.len() >= self.top_k {
                break;
            }
            let needed = self.top_k - chunks.len();
            // Over-fetch by what's already collected so relaxed rungs can
            // still fill the remainder after dedup
            let scored = self
                .store
                .query(&query, needed + seen.len(), &filter)
                .await?;

            for s in scored {
                if chunks.len() >= self.top_k {
                    break;
                }
                if seen.insert(s.chunk.id.clone()) {
                    chunks.push(s.chunk);
                }
            }

            tracing::debug!(
                topic = %topic,
                collected = chunks.len(),
                target = self.top_k,
                "retrieval rung complete"
            );
        }

        Ok(RetrievalResult { topic, chunks })
    }

    /// The relaxation ladder, strictest filter first
    ///
    /// Rungs whose optional keys are blank on the request collapse into
    /// the rung below; duplicates are removed so each filter runs once.
    fn filter_ladder(&self, topic: Topic, request: &GenerationRequest) -> Vec<ChunkFilter> {
        let base = ChunkFilter::new()
            .topic(topic)
            .status(ChunkStatus::Approved);

        let mut ladder = Vec::with_capacity(3);
        if !request.industry.is_empty() && !request.tech_code.is_empty() {
            ladder.push(
                base.clone()
                    .industry(request.industry.clone())
                    .tech_code(request.tech_code.clone()),
            );
        }
        if !request.tech_code.is_empty() {
            ladder.push(base.clone().tech_code(request.tech_code.clone()));
        }
        ladder.push(base);
        ladder.dedup();
        ladder
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}
