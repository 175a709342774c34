//! Review agent
//!
//! Scores one section at a time against the CRA rubric. Sections are
//! reviewed independently so a rejection on one topic never invalidates
//! the other two drafts.

use crate::llm::{CompletionRequest, LanguageModel};
use crate::prompts;
use async_trait::async_trait;
use serde::Deserialize;
use sred_core::{PipelineConfig, PipelineError, ReviewVerdict, SectionDraft};
use std::sync::Arc;

/// Scores drafted sections
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Score one draft; verdicts for different topics are independent
    async fn review(&self, draft: &SectionDraft) -> Result<ReviewVerdict, PipelineError>;
}

/// Raw verdict shape expected from the model
#[derive(Debug, Deserialize)]
struct RawVerdict {
    score: f64,
    #[serde(default)]
    feedback: Option<String>,
}

/// Language-model-backed reviewer
///
/// Prompts the model with the weighted rubric and parses a JSON verdict
/// from the response. Unscorable responses are `ReviewFailed`: unscored
/// content is never silently accepted.
#[derive(Clone)]
pub struct LlmReviewer {
    llm: Arc<dyn LanguageModel>,
    config: PipelineConfig,
}

impl LlmReviewer {
    /// Create a reviewer over a shared model
    #[inline]
    #[must_use]
    pub fn new(llm: Arc<dyn LanguageModel>, config: PipelineConfig) -> Self {
        Self { llm, config }
    }

    /// Extract the verdict object from a model response
    ///
    /// Tolerates surrounding prose and Markdown code fences; the first
    /// balanced-looking object between `{` and the final `}` is parsed.
    fn parse_verdict(response: &str) -> Result<RawVerdict, PipelineError> {
        let start = response.find('{');
        let end = response.rfind('}');
        let (start, end) = match (start, end) {
            (Some(s), Some(e)) if s < e => (s, e),
            _ => {
                return Err(PipelineError::ReviewFailed(format!(
                    "no verdict object in reviewer response: {response:.120}"
                )))
            }
        };

        serde_json::from_str(&response[start..=end])
            .map_err(|e| PipelineError::ReviewFailed(format!("unparseable verdict: {e}")))
    }
}

#[async_trait]
impl Reviewer for LlmReviewer {
    async fn review(&self, draft: &SectionDraft) -> Result<ReviewVerdict, PipelineError> {
        let request = CompletionRequest::new(
            prompts::reviewer_system_prompt(&self.config.rubric),
            prompts::reviewer_user_message(draft.topic, &draft.text),
            self.config.max_completion_tokens,
            // Scoring wants the most deterministic setting available
            0.0,
        );

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|e| PipelineError::ReviewFailed(e.to_string()))?;

        let raw = Self::parse_verdict(&response)?;
        if !(0.0..=100.0).contains(&raw.score) {
            return Err(PipelineError::ReviewFailed(format!(
                "score out of range: {}",
                raw.score
            )));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let score = raw.score.round() as u8;
        let feedback = raw.feedback.filter(|f| !f.trim().is_empty());
        let verdict = ReviewVerdict::from_score(
            draft.topic,
            score,
            self.config.score_threshold,
            feedback,
        );

        // A failing verdict with nothing to fix is unusable for retry
        if !verdict.passed && verdict.feedback.is_none() {
            return Err(PipelineError::ReviewFailed(format!(
                "failing score {score} for {} carried no feedback",
                draft.topic
            )));
        }

        tracing::info!(
            topic = %draft.topic,
            score = verdict.score,
            passed = verdict.passed,
            "section reviewed"
        );
        Ok(verdict)
    }
}

impl std::fmt::Debug for LlmReviewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmReviewer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
