//! Example store abstraction and the JSON-file-backed implementation
//!
//! The store is read-only from the pipeline's perspective: ingestion
//! happens elsewhere, the pipeline only embeds queries and ranks chunks.

use crate::embed::{cosine_similarity, embed_text};
use async_trait::async_trait;
use sred_core::{ChunkStatus, ExampleChunk, StoreError, Topic};
use std::path::Path;

/// Metadata filter for store queries
///
/// `topic` and `status` are exact-match; `industry`/`tech_code` match
/// case-insensitively. Unset keys match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkFilter {
    /// Topic label the chunk must carry
    pub topic: Option<Topic>,
    /// Required approval status
    pub status: Option<ChunkStatus>,
    /// Required industry label
    pub industry: Option<String>,
    /// Required technology code
    pub tech_code: Option<String>,
}

impl ChunkFilter {
    /// Create an empty (match-all) filter
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a topic
    #[inline]
    #[must_use]
    pub fn topic(mut self, topic: Topic) -> Self {
        self.topic = Some(topic);
        self
    }

    /// Require an approval status
    #[inline]
    #[must_use]
    pub fn status(mut self, status: ChunkStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Require an industry label
    #[inline]
    #[must_use]
    pub fn industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    /// Require a technology code
    #[inline]
    #[must_use]
    pub fn tech_code(mut self, tech_code: impl Into<String>) -> Self {
        self.tech_code = Some(tech_code.into());
        self
    }

    /// Whether a chunk satisfies every set key
    #[must_use]
    pub fn matches(&self, chunk: &ExampleChunk) -> bool {
        if let Some(topic) = self.topic {
            if chunk.topic != topic {
                return false;
            }
        }
        if let Some(status) = self.status {
            if chunk.status != status {
                return false;
            }
        }
        if let Some(industry) = &self.industry {
            if !chunk.industry.eq_ignore_ascii_case(industry) {
                return false;
            }
        }
        if let Some(tech_code) = &self.tech_code {
            if !chunk.tech_code.eq_ignore_ascii_case(tech_code) {
                return false;
            }
        }
        true
    }
}

/// A chunk with its similarity to the query vector
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The stored chunk
    pub chunk: ExampleChunk,
    /// Cosine similarity against the query vector
    pub similarity: f32,
}

/// Semantic index over labeled example chunks
#[async_trait]
pub trait ExampleStore: Send + Sync {
    /// Embed text into the store's vector space
    async fn embed(&self, text: &str) -> Result<Vec<f32>, StoreError>;

    /// Return the `top_k` most similar chunks matching `filter`,
    /// most relevant first, ties broken by insertion order
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &ChunkFilter,
    ) -> Result<Vec<ScoredChunk>, StoreError>;
}

/// In-memory store loaded from an append-only JSON snapshot
///
/// Chunks persisted without an embedding are embedded at load time so
/// hand-written fixtures stay small.
#[derive(Debug, Clone)]
pub struct JsonExampleStore {
    chunks: Vec<ExampleChunk>,
}

impl JsonExampleStore {
    /// Load a store from a JSON file containing an array of chunks
    ///
    /// # Errors
    /// - `StoreError::Unavailable` if the file cannot be read
    /// - `StoreError::Corrupt` if the contents fail to decode
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;
        let chunks: Vec<ExampleChunk> =
            serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Self::from_chunks(chunks))
    }

    /// Build a store from chunks already in memory
    #[must_use]
    pub fn from_chunks(chunks: Vec<ExampleChunk>) -> Self {
        let chunks = chunks
            .into_iter()
            .map(|mut chunk| {
                if chunk.embedding.is_empty() {
                    chunk.embedding = embed_text(&chunk.text);
                }
                chunk
            })
            .collect();
        Self { chunks }
    }

    /// Number of chunks held
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the store holds no chunks
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[async_trait]
impl ExampleStore for JsonExampleStore {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, StoreError> {
        Ok(embed_text(text))
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &ChunkFilter,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        let mut scored: Vec<(usize, ScoredChunk)> = self
            .chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| filter.matches(chunk))
            .map(|(idx, chunk)| {
                let similarity = cosine_similarity(vector, &chunk.embedding);
                (
                    idx,
                    ScoredChunk {
                        chunk: chunk.clone(),
                        similarity,
                    },
                )
            })
            .collect();

        // Similarity descending; insertion order as the stable tie-break
        scored.sort_by(|(ia, a), (ib, b)| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| ia.cmp(ib))
        });
        scored.truncate(top_k);

        Ok(scored.into_iter().map(|(_, s)| s).collect())
    }
}
