//! Topic generation agent
//!
//! One generator serves all three topics; the topic selects the
//! instruction block. Transient model failures and empty completions are
//! retried with exponential backoff inside a per-call budget that is
//! independent of the orchestrator's review-round budget.

use crate::llm::{CompletionRequest, LanguageModel};
use crate::prompts;
use sred_core::{
    GenerationRequest, LlmError, PipelineConfig, PipelineError, SectionDraft, Topic,
};
use sred_retrieval::RetrievalResult;
use std::sync::Arc;
use std::time::Duration;

/// Prior draft plus reviewer feedback, present on regeneration rounds
#[derive(Debug, Clone, Copy)]
pub struct RevisionContext<'a> {
    /// The draft the reviewer rejected
    pub prior_draft: &'a SectionDraft,
    /// The reviewer's deficiency description
    pub feedback: &'a str,
}

/// Drafts one section per call against a language model
#[derive(Clone)]
pub struct TopicGenerator {
    llm: Arc<dyn LanguageModel>,
    config: PipelineConfig,
}

impl TopicGenerator {
    /// Create a generator over a shared model
    #[inline]
    #[must_use]
    pub fn new(llm: Arc<dyn LanguageModel>, config: PipelineConfig) -> Self {
        Self { llm, config }
    }

    /// Draft (or refine) the section for one topic
    ///
    /// First pass combines the topic instruction, the request context,
    /// and retrieved exemplars. With a [`RevisionContext`] the prior
    /// draft is rewritten against the reviewer's feedback instead.
    ///
    /// # Errors
    /// - `PipelineError::GenerationFailed` once the retry budget is
    ///   exhausted or the model fails fatally
    pub async fn generate(
        &self,
        topic: Topic,
        request: &GenerationRequest,
        retrieval: &RetrievalResult,
        revision: Option<RevisionContext<'_>>,
    ) -> Result<SectionDraft, PipelineError> {
        let (system, user, iteration) = match revision {
            Some(rev) => (
                prompts::refinement_system_prompt(),
                prompts::refinement_user_message(topic, rev.prior_draft, rev.feedback),
                rev.prior_draft.iteration + 1,
            ),
            None => (
                prompts::drafting_system_prompt(topic),
                prompts::drafting_user_message(topic, request, retrieval),
                1,
            ),
        };

        let completion = CompletionRequest::new(
            system,
            user,
            self.config.max_completion_tokens,
            self.config.temperature,
        );

        let text = self
            .complete_with_retry(topic, completion)
            .await
            .map_err(|e| PipelineError::GenerationFailed {
                topic,
                reason: e.to_string(),
            })?;

        tracing::info!(topic = %topic, iteration, length = text.len(), "section drafted");
        Ok(SectionDraft::new(topic, text, iteration))
    }

    /// Call the model, retrying transient failures with backoff
    ///
    /// Empty completions count as transient: the call "succeeded" but
    /// produced nothing usable.
    async fn complete_with_retry(
        &self,
        topic: Topic,
        request: CompletionRequest,
    ) -> Result<String, LlmError> {
        let budget = self.config.llm_retry_budget;
        let mut last_error = LlmError::Transient("no attempts made".to_string());

        for attempt in 1..=budget {
            match self.llm.complete(request.clone()).await {
                Ok(text) => {
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        return Ok(text);
                    }
                    last_error = LlmError::Transient("empty completion".to_string());
                }
                Err(e) if e.is_transient() => {
                    last_error = e;
                }
                Err(e) => return Err(e),
            }

            if attempt < budget {
                let delay = self.config.retry_backoff_base_ms << (attempt - 1);
                tracing::warn!(
                    topic = %topic,
                    attempt,
                    delay_ms = delay,
                    error = %last_error,
                    "model call failed, backing off"
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(last_error)
    }
}

impl std::fmt::Debug for TopicGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
