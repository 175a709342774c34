//! Error taxonomy for the drafting pipeline
//!
//! Three layers:
//! - `StoreError`: example-store access failures
//! - `LlmError`: language-model call failures, split transient vs. fatal
//!   so the retry policy can branch
//! - `PipelineError`: request-level taxonomy surfaced to callers

use crate::types::Topic;

/// Example-store access errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store cannot be reached at all
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Store reachable but its contents cannot be decoded
    #[error("store corrupt: {0}")]
    Corrupt(String),
}

/// Language-model call errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Worth retrying with backoff (rate limit, timeout, 5xx)
    #[error("transient model error: {0}")]
    Transient(String),

    /// Not worth retrying (invalid request, auth, malformed response)
    #[error("fatal model error: {0}")]
    Fatal(String),
}

impl LlmError {
    /// Whether the retry policy should attempt this call again
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Request-level pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Example store unreachable; fatal to the whole request since
    /// ungrounded generation is disallowed
    #[error("retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// Generation exhausted its retry budget for one topic
    #[error("generation failed for {topic}: {reason}")]
    GenerationFailed {
        /// Topic whose generation failed
        topic: Topic,
        /// Underlying cause
        reason: String,
    },

    /// Scoring failed; fatal, unscored content is never accepted
    #[error("review failed: {0}")]
    ReviewFailed(String),

    /// Request rejected before any work started
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Whether the failure is contained to a single topic
    ///
    /// Topic-local failures let the orchestrator fall back to that
    /// topic's best prior draft instead of failing the request.
    #[inline]
    #[must_use]
    pub fn is_topic_local(&self) -> bool {
        matches!(self, Self::GenerationFailed { .. })
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        Self::RetrievalUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_error_transient_split() {
        assert!(LlmError::Transient("429".to_string()).is_transient());
        assert!(!LlmError::Fatal("bad request".to_string()).is_transient());
    }

    #[test]
    fn store_error_maps_to_retrieval_unavailable() {
        let err: PipelineError = StoreError::Unavailable("connection refused".to_string()).into();
        assert!(matches!(err, PipelineError::RetrievalUnavailable(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn generation_failure_is_topic_local() {
        let err = PipelineError::GenerationFailed {
            topic: Topic::Uncertainty,
            reason: "empty completion".to_string(),
        };
        assert!(err.is_topic_local());
        assert!(!PipelineError::ReviewFailed("x".to_string()).is_topic_local());
    }
}
