//! The orchestrator
//!
//! Drives Retriever -> Topic Generators -> Reviewer through a bounded
//! convergence loop. Topics that pass review are frozen and never
//! regenerated; failing topics carry reviewer feedback into the next
//! round; the round limit makes the worst-case model-call count
//! deterministic: `3 * (1 + max_rounds)` generations and
//! `1 + max_rounds` review passes.

use crate::phase::{transition, Phase};
use futures::future::{join_all, try_join_all};
use sred_agents::{Reviewer, RevisionContext, TopicGenerator};
use sred_core::{
    FinalReport, GenerationRequest, PipelineConfig, PipelineError, RequestId, ReviewVerdict,
    SectionDraft, Topic,
};
use sred_retrieval::{RetrievalResult, Retriever};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Per-topic bookkeeping across rounds
///
/// Exactly one live draft per topic at any point; retrieval happens once
/// and is reused for every round of that topic.
#[derive(Debug)]
struct TopicSlot {
    retrieval: RetrievalResult,
    live: Option<SectionDraft>,
    feedback: Option<String>,
    frozen: bool,
    best: Option<(u8, SectionDraft)>,
    last_verdict: Option<ReviewVerdict>,
}

impl TopicSlot {
    fn new(retrieval: RetrievalResult) -> Self {
        Self {
            retrieval,
            live: None,
            feedback: None,
            frozen: false,
            best: None,
            last_verdict: None,
        }
    }

    #[inline]
    fn topic(&self) -> Topic {
        self.retrieval.topic
    }

    #[inline]
    fn passed(&self) -> bool {
        self.last_verdict.as_ref().is_some_and(|v| v.passed)
    }

    /// Fold a fresh verdict into the slot
    ///
    /// The best draft is replaced only on a strictly greater score, so
    /// the first-seen draft wins score ties.
    fn record_verdict(&mut self, verdict: ReviewVerdict) {
        if let Some(draft) = &self.live {
            let improved = self.best.as_ref().map_or(true, |(s, _)| verdict.score > *s);
            if improved {
                self.best = Some((verdict.score, draft.clone()));
            }
        }
        if verdict.passed {
            self.frozen = true;
            self.feedback = None;
        } else {
            self.feedback = verdict.feedback.clone();
        }
        self.last_verdict = Some(verdict);
    }
}

/// Drives one generation request end to end
///
/// Owns its collaborators; all mutable per-request state lives inside
/// [`Orchestrator::run`], so one instance safely serves concurrent
/// requests. Cancelling the returned future abandons in-flight
/// retriever and model calls; nothing is persisted.
pub struct Orchestrator {
    retriever: Retriever,
    generator: TopicGenerator,
    reviewer: Arc<dyn Reviewer>,
    config: PipelineConfig,
}

impl Orchestrator {
    /// Create an orchestrator
    ///
    /// # Errors
    /// - `PipelineError::Config` when the configuration is invalid
    pub fn new(
        retriever: Retriever,
        generator: TopicGenerator,
        reviewer: Arc<dyn Reviewer>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            retriever,
            generator,
            reviewer,
            config,
        })
    }

    /// Run the full pipeline for one request
    ///
    /// # Errors
    /// - `PipelineError::RetrievalUnavailable` before any generation call
    ///   when the example store is unreachable
    /// - `PipelineError::GenerationFailed` when a topic exhausts its model
    ///   retry budget with no usable prior draft
    /// - `PipelineError::ReviewFailed` on any scoring failure
    pub async fn run(&self, request: GenerationRequest) -> Result<FinalReport, PipelineError> {
        let request_id = RequestId::new();
        tracing::info!(request = %request_id, industry = %request.industry, "pipeline started");

        let mut phase = Phase::Retrieving;

        // One retrieval per topic; store unreachable aborts everything
        let retrievals = try_join_all(
            Topic::ALL
                .iter()
                .map(|&topic| self.retriever.retrieve(topic, &request)),
        )
        .await?;
        let mut slots: Vec<TopicSlot> = retrievals.into_iter().map(TopicSlot::new).collect();

        let mut iterations = 0u32;
        let mut review_passes = 0u32;
        let mut quality_caveat = false;

        transition(&mut phase, Phase::Generating);
        loop {
            // Generate every non-frozen topic concurrently
            let drafted = join_all(slots.iter().enumerate().filter_map(|(idx, slot)| {
                if slot.frozen {
                    return None;
                }
                let revision = match (&slot.live, &slot.feedback) {
                    (Some(prior_draft), Some(feedback)) => Some(RevisionContext {
                        prior_draft,
                        feedback: feedback.as_str(),
                    }),
                    _ => None,
                };
                let request = &request;
                Some(async move {
                    let result = self
                        .generator
                        .generate(slot.topic(), request, &slot.retrieval, revision)
                        .await;
                    (idx, result)
                })
            }))
            .await;

            for (idx, result) in drafted {
                match result {
                    Ok(draft) => slots[idx].live = Some(draft),
                    Err(err) if err.is_topic_local() => {
                        // A topic-local failure with a scored prior draft
                        // falls back to that draft instead of failing the
                        // whole request
                        match slots[idx].best.clone() {
                            Some((score, draft)) => {
                                tracing::warn!(
                                    request = %request_id,
                                    topic = %slots[idx].topic(),
                                    fallback_score = score,
                                    error = %err,
                                    "generation failed, keeping best prior draft"
                                );
                                slots[idx].live = Some(draft);
                                slots[idx].frozen = true;
                                quality_caveat = true;
                            }
                            None => return Err(err),
                        }
                    }
                    Err(err) => return Err(err),
                }
            }

            // Score the just-drafted sections independently
            transition(&mut phase, Phase::Reviewing);
            let reviewable: Vec<(usize, &SectionDraft)> = slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| !slot.frozen)
                .filter_map(|(idx, slot)| slot.live.as_ref().map(|draft| (idx, draft)))
                .collect();
            // Nothing to review when every remaining topic fell back
            if !reviewable.is_empty() {
                let verdicts =
                    try_join_all(reviewable.into_iter().map(|(idx, draft)| async move {
                        self.reviewer.review(draft).await.map(|v| (idx, v))
                    }))
                    .await?;
                review_passes += 1;

                for (idx, verdict) in verdicts {
                    slots[idx].record_verdict(verdict);
                }
            }

            if slots.iter().all(TopicSlot::passed) {
                transition(&mut phase, Phase::Accepted);
                break;
            }

            let regenerable = slots.iter().any(|slot| !slot.frozen);
            if regenerable && iterations < self.config.max_rounds {
                iterations += 1;
                transition(&mut phase, Phase::Iterating);
                transition(&mut phase, Phase::Generating);
                continue;
            }

            quality_caveat = true;
            transition(&mut phase, Phase::Exhausted);
            break;
        }

        let report = Self::assemble(slots, phase, quality_caveat, review_passes)?;
        tracing::info!(
            request = %request_id,
            phase = ?phase,
            rounds = review_passes,
            caveat = report.quality_caveat,
            "pipeline finished"
        );
        Ok(report)
    }

    /// Assemble the final report from terminal slot state
    ///
    /// Accepted requests use the current (passing) drafts; exhausted
    /// requests use the highest-scoring draft each topic ever produced.
    fn assemble(
        slots: Vec<TopicSlot>,
        phase: Phase,
        quality_caveat: bool,
        review_passes: u32,
    ) -> Result<FinalReport, PipelineError> {
        let exhausted = matches!(phase, Phase::Exhausted);
        let mut sections = BTreeMap::new();
        let mut verdicts = BTreeMap::new();

        for slot in slots {
            let topic = slot.topic();
            let draft = if exhausted {
                slot.best.map(|(_, d)| d).or(slot.live)
            } else {
                slot.live
            };
            let Some(draft) = draft else {
                // Every slot is drafted and reviewed at least once before
                // reaching assembly
                return Err(PipelineError::GenerationFailed {
                    topic,
                    reason: "no draft recorded".to_string(),
                });
            };
            sections.insert(topic, draft.text);
            if let Some(verdict) = slot.last_verdict {
                verdicts.insert(topic, verdict);
            }
        }

        Ok(FinalReport {
            sections,
            quality_caveat,
            rounds_used: review_passes,
            verdicts,
        })
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("retriever", &self.retriever)
            .field("generator", &self.generator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
