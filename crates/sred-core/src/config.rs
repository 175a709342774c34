//! Pipeline configuration
//!
//! Passed explicitly into the orchestrator constructor so concurrent
//! requests with different configurations never cross-talk.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// Rubric category weights used by the reviewer
///
/// Weights must sum to 100; they are surfaced verbatim into the reviewer
/// prompt so deployments can re-balance scoring without code changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricWeights {
    /// Does the section address the topic's defining question?
    pub completeness: u8,
    /// Concrete technical detail vs. vague claims
    pub specificity: u8,
    /// Domain-appropriate CRA framing
    pub cra_alignment: u8,
    /// Absence of known rejection pitfalls (business risk, routine work)
    pub pitfall_absence: u8,
}

impl RubricWeights {
    /// Validate that weights sum to 100
    ///
    /// # Errors
    /// - `PipelineError::Config` when the sum is off
    pub fn validate(&self) -> Result<(), PipelineError> {
        let sum = u16::from(self.completeness)
            + u16::from(self.specificity)
            + u16::from(self.cra_alignment)
            + u16::from(self.pitfall_absence);
        if sum != 100 {
            return Err(PipelineError::Config(format!(
                "rubric weights must sum to 100, got {sum}"
            )));
        }
        Ok(())
    }
}

impl Default for RubricWeights {
    fn default() -> Self {
        Self {
            completeness: 30,
            specificity: 30,
            cra_alignment: 20,
            pitfall_absence: 20,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Model identifier passed to the language-model service
    pub model: String,
    /// Sampling temperature, bounded to [0, 1]
    pub temperature: f32,
    /// Completion token cap per model call
    pub max_completion_tokens: u32,
    /// Examples retrieved per topic
    pub top_k: usize,
    /// Minimum passing review score (0-100)
    pub score_threshold: u8,
    /// Maximum feedback-driven regeneration rounds after the first pass
    pub max_rounds: u32,
    /// Attempts per model call before surfacing failure
    pub llm_retry_budget: u32,
    /// First backoff delay in milliseconds; doubles per retry
    pub retry_backoff_base_ms: u64,
    /// Reviewer rubric weights
    pub rubric: RubricWeights,
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With model identifier
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// With retrieval depth
    #[inline]
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// With passing threshold
    #[inline]
    #[must_use]
    pub fn with_score_threshold(mut self, threshold: u8) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// With maximum regeneration rounds
    #[inline]
    #[must_use]
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// With per-call retry budget
    #[inline]
    #[must_use]
    pub fn with_llm_retry_budget(mut self, attempts: u32) -> Self {
        self.llm_retry_budget = attempts;
        self
    }

    /// Parse configuration from a TOML document
    ///
    /// # Errors
    /// - `PipelineError::Config` on parse or validation failure
    pub fn from_toml_str(input: &str) -> Result<Self, PipelineError> {
        let config: Self =
            toml::from_str(input).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate bounds
    ///
    /// # Errors
    /// - `PipelineError::Config` when any field is out of range
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(PipelineError::Config(format!(
                "temperature must be within [0, 1], got {}",
                self.temperature
            )));
        }
        if self.score_threshold > 100 {
            return Err(PipelineError::Config(format!(
                "score threshold must be at most 100, got {}",
                self.score_threshold
            )));
        }
        if self.top_k == 0 {
            return Err(PipelineError::Config(
                "top_k must be at least 1".to_string(),
            ));
        }
        if self.llm_retry_budget == 0 {
            return Err(PipelineError::Config(
                "llm retry budget must be at least 1".to_string(),
            ));
        }
        self.rubric.validate()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_completion_tokens: 1600,
            top_k: 5,
            score_threshold: 70,
            max_rounds: 3,
            llm_retry_budget: 3,
            retry_backoff_base_ms: 250,
            rubric: RubricWeights::default(),
        }
    }
}
