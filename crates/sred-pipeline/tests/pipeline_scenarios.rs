//! End-to-end scenarios for the orchestrator convergence loop

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use sred_agents::{CompletionRequest, LanguageModel, Reviewer, TopicGenerator};
use sred_core::{LlmError, PipelineConfig, PipelineError, Topic};
use sred_pipeline::Orchestrator;
use sred_retrieval::{ExampleStore, Retriever};
use sred_test_utils::{
    fixture_store, sample_request, BrokenReviewer, EchoModel, FlakyModel, ScriptedReviewer,
    UnreachableStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn config() -> PipelineConfig {
    let mut config = PipelineConfig::new();
    config.retry_backoff_base_ms = 1;
    config
}

fn orchestrator(
    store: Arc<dyn ExampleStore>,
    llm: Arc<dyn LanguageModel>,
    reviewer: Arc<dyn Reviewer>,
    config: PipelineConfig,
) -> Orchestrator {
    Orchestrator::new(
        Retriever::new(store, config.top_k),
        TopicGenerator::new(llm, config.clone()),
        reviewer,
        config,
    )
    .expect("valid configuration")
}

#[tokio::test]
async fn accepting_reviewer_converges_in_one_round() {
    let llm = Arc::new(EchoModel::new());
    let reviewer = Arc::new(ScriptedReviewer::always_pass());
    let pipeline = orchestrator(
        Arc::new(fixture_store()),
        llm.clone(),
        reviewer.clone(),
        config(),
    );

    let report = pipeline.run(sample_request()).await.unwrap();

    assert_eq!(report.sections.len(), 3);
    for topic in Topic::ALL {
        let section = report.section(topic).unwrap();
        assert!(!section.is_empty());
        assert_eq!(llm.calls_for(topic), 1);
    }
    assert!(!report.quality_caveat);
    assert_eq!(report.rounds_used, 1);
    assert_eq!(reviewer.total_reviews(), 3);
    assert!(report.verdicts.values().all(|v| v.passed));
    assert!(report.verdicts.values().all(|v| v.feedback.is_none()));
}

#[tokio::test]
async fn failing_topic_is_regenerated_alone() {
    let llm = Arc::new(EchoModel::new());
    let reviewer = Arc::new(
        ScriptedReviewer::always_pass().with_scores(Topic::Uncertainty, &[40, 90]),
    );
    let pipeline = orchestrator(
        Arc::new(fixture_store()),
        llm.clone(),
        reviewer.clone(),
        config(),
    );

    let report = pipeline.run(sample_request()).await.unwrap();

    assert_eq!(llm.calls_for(Topic::Uncertainty), 2);
    assert_eq!(llm.calls_for(Topic::SystematicInvestigation), 1);
    assert_eq!(llm.calls_for(Topic::TechnologicalAdvancement), 1);
    assert_eq!(reviewer.reviews_for(Topic::Uncertainty), 2);
    assert_eq!(reviewer.reviews_for(Topic::SystematicInvestigation), 1);
    assert!(!report.quality_caveat);
    assert_eq!(report.rounds_used, 2);
    // The accepted draft is the revision, not the rejected first pass
    assert!(report
        .section(Topic::Uncertainty)
        .unwrap()
        .contains("revision 2"));
}

#[tokio::test]
async fn rejecting_reviewer_exhausts_round_budget() {
    let llm = Arc::new(EchoModel::new());
    let reviewer = Arc::new(ScriptedReviewer::always_fail());
    let cfg = config();
    let max_rounds = cfg.max_rounds;
    let pipeline = orchestrator(
        Arc::new(fixture_store()),
        llm.clone(),
        reviewer.clone(),
        cfg,
    );

    let report = pipeline.run(sample_request()).await.unwrap();

    for topic in Topic::ALL {
        assert_eq!(llm.calls_for(topic), max_rounds + 1);
        assert_eq!(reviewer.reviews_for(topic), max_rounds + 1);
        // Constant scores mean the first-seen draft stays the best
        assert!(report.section(topic).unwrap().contains("revision 1"));
    }
    assert!(report.quality_caveat);
    assert_eq!(report.rounds_used, max_rounds + 1);
    assert!(report.verdicts.values().all(|v| !v.passed));
}

#[tokio::test]
async fn mixed_convergence_respects_call_bounds() {
    let llm = Arc::new(EchoModel::new());
    let reviewer = Arc::new(
        ScriptedReviewer::always_pass()
            .with_scores(Topic::Uncertainty, &[40, 40, 90])
            .with_scores(Topic::SystematicInvestigation, &[40, 90]),
    );
    let pipeline = orchestrator(
        Arc::new(fixture_store()),
        llm.clone(),
        reviewer.clone(),
        config(),
    );

    let report = pipeline.run(sample_request()).await.unwrap();

    assert_eq!(llm.calls_for(Topic::Uncertainty), 3);
    assert_eq!(llm.calls_for(Topic::SystematicInvestigation), 2);
    assert_eq!(llm.calls_for(Topic::TechnologicalAdvancement), 1);
    assert!(!report.quality_caveat);
    assert_eq!(report.rounds_used, 3);
    assert!(llm.total_calls() <= 3 * (1 + 3));
    assert!(reviewer.total_reviews() <= 3 * (1 + 3));
}

#[tokio::test]
async fn unreachable_store_aborts_before_any_generation() {
    let llm = Arc::new(EchoModel::new());
    let pipeline = orchestrator(
        Arc::new(UnreachableStore),
        llm.clone(),
        Arc::new(ScriptedReviewer::always_pass()),
        config(),
    );

    let err = pipeline.run(sample_request()).await.unwrap_err();

    assert!(matches!(err, PipelineError::RetrievalUnavailable(_)));
    assert_eq!(llm.total_calls(), 0);
}

#[tokio::test]
async fn transient_model_failures_are_absorbed_by_the_retry_budget() {
    let llm = Arc::new(FlakyModel::transient(2));
    let pipeline = orchestrator(
        Arc::new(fixture_store()),
        llm.clone(),
        Arc::new(ScriptedReviewer::always_pass()),
        config(),
    );

    let report = pipeline.run(sample_request()).await.unwrap();

    assert!(!report.quality_caveat);
    // Three drafts plus the two scripted transient failures
    assert_eq!(llm.total_calls(), 5);
}

#[tokio::test]
async fn review_service_failure_is_fatal() {
    let pipeline = orchestrator(
        Arc::new(fixture_store()),
        Arc::new(EchoModel::new()),
        Arc::new(BrokenReviewer),
        config(),
    );

    let err = pipeline.run(sample_request()).await.unwrap_err();
    assert!(matches!(err, PipelineError::ReviewFailed(_)));
}

#[tokio::test]
async fn identical_requests_produce_identical_reports() {
    let run = || async {
        let pipeline = orchestrator(
            Arc::new(fixture_store()),
            Arc::new(EchoModel::new()),
            Arc::new(
                ScriptedReviewer::always_pass().with_scores(Topic::Uncertainty, &[40, 90]),
            ),
            config(),
        );
        pipeline.run(sample_request()).await.unwrap()
    };

    let first = run().await;
    let second = run().await;
    assert_eq!(first, second);
}

/// Model that drafts fine but fails fatally on every rewrite
#[derive(Default)]
struct RefinementBreaker {
    calls: AtomicUsize,
}

#[async_trait]
impl LanguageModel for RefinementBreaker {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.user.contains("ORIGINAL DRAFT") {
            return Err(LlmError::Fatal("model rejected rewrite".to_string()));
        }
        Ok("First-pass draft with concrete experimental detail.".to_string())
    }
}

#[tokio::test]
async fn failed_rewrite_falls_back_to_best_prior_draft() {
    let llm = Arc::new(RefinementBreaker::default());
    let pipeline = orchestrator(
        Arc::new(fixture_store()),
        llm.clone(),
        Arc::new(ScriptedReviewer::always_fail()),
        config(),
    );

    let report = pipeline.run(sample_request()).await.unwrap();

    assert!(report.quality_caveat);
    for topic in Topic::ALL {
        assert_eq!(
            report.section(topic).unwrap(),
            "First-pass draft with concrete experimental detail."
        );
    }
    // Three first-pass drafts plus three failed rewrites
    assert_eq!(llm.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn first_round_generation_failure_fails_the_request() {
    /// Always-fatal model: no prior draft exists to fall back on
    struct DeadModel;

    #[async_trait]
    impl LanguageModel for DeadModel {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, LlmError> {
            Err(LlmError::Fatal("model offline".to_string()))
        }
    }

    let pipeline = orchestrator(
        Arc::new(fixture_store()),
        Arc::new(DeadModel),
        Arc::new(ScriptedReviewer::always_pass()),
        config(),
    );

    let err = pipeline.run(sample_request()).await.unwrap_err();
    assert!(matches!(err, PipelineError::GenerationFailed { .. }));
}
