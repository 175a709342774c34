//! Language-model seam
//!
//! The pipeline depends on this trait abstractly; concrete transports
//! (HTTP client, scripted stubs) live in their own crates.

use async_trait::async_trait;
use sred_core::LlmError;

/// One completion call: a system instruction plus a user message
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instruction (role, rules, formatting constraints)
    pub system: String,
    /// User message (context, examples, the ask)
    pub user: String,
    /// Completion token cap
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl CompletionRequest {
    /// Create a request
    #[inline]
    #[must_use]
    pub fn new(
        system: impl Into<String>,
        user: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens,
            temperature,
        }
    }
}

/// A completion-capable language model
///
/// Implementations must distinguish transient failures (worth a retry
/// with backoff) from fatal ones via [`LlmError`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Produce a completion for the request
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}
