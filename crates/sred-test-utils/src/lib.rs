//! Testing utilities for the SRED Drafter workspace
//!
//! Shared stub collaborators, fixtures, and request builders.

#![allow(missing_docs)]

use async_trait::async_trait;
use sred_agents::{CompletionRequest, LanguageModel, Reviewer};
use sred_core::{
    ChunkStatus, ExampleChunk, GenerationRequest, LlmError, PipelineError, ReviewVerdict,
    SectionDraft, StoreError, Topic,
};
use sred_retrieval::{ChunkFilter, ExampleStore, JsonExampleStore, ScoredChunk};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Deterministic language model producing per-topic numbered drafts
///
/// The topic is recovered from the `SECTION:` line of the user message,
/// so call counts can be asserted per topic. Identical call sequences
/// produce identical text, which the idempotence tests rely on.
#[derive(Debug, Default)]
pub struct EchoModel {
    per_section: Mutex<BTreeMap<String, u32>>,
    total: AtomicUsize,
}

impl EchoModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, topic: Topic) -> u32 {
        self.per_section
            .lock()
            .unwrap()
            .get(topic.label())
            .copied()
            .unwrap_or(0)
    }

    fn section_label(user: &str) -> String {
        user.lines()
            .find_map(|line| line.strip_prefix("SECTION: "))
            .unwrap_or("unknown")
            .to_string()
    }
}

#[async_trait]
impl LanguageModel for EchoModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        let label = Self::section_label(&request.user);
        let mut sections = self.per_section.lock().unwrap();
        let count = sections.entry(label.clone()).or_insert(0);
        *count += 1;
        Ok(format!(
            "Draft narrative for {label}, revision {count}. The team investigated the stated \
             unknowns through controlled experiments."
        ))
    }
}

/// Language model that fails a scripted number of times before succeeding
#[derive(Debug)]
pub struct FlakyModel {
    failures_remaining: Mutex<u32>,
    error: fn(String) -> LlmError,
    total: AtomicUsize,
}

impl FlakyModel {
    #[must_use]
    pub fn transient(failures: u32) -> Self {
        Self {
            failures_remaining: Mutex::new(failures),
            error: LlmError::Transient,
            total: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn fatal(failures: u32) -> Self {
        Self {
            failures_remaining: Mutex::new(failures),
            error: LlmError::Fatal,
            total: AtomicUsize::new(0),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for FlakyModel {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, LlmError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        let mut remaining = self.failures_remaining.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err((self.error)("scripted failure".to_string()));
        }
        Ok("Recovered draft after scripted failures.".to_string())
    }
}

/// Reviewer following a per-topic score script, then a default score
///
/// Scores below the threshold carry a canned deficiency message, as the
/// review contract requires.
#[derive(Debug)]
pub struct ScriptedReviewer {
    threshold: u8,
    default_score: u8,
    script: Mutex<BTreeMap<Topic, VecDeque<u8>>>,
    reviews: AtomicUsize,
    per_topic: Mutex<BTreeMap<Topic, u32>>,
}

impl ScriptedReviewer {
    #[must_use]
    pub fn new(threshold: u8, default_score: u8) -> Self {
        Self {
            threshold,
            default_score,
            script: Mutex::new(BTreeMap::new()),
            reviews: AtomicUsize::new(0),
            per_topic: Mutex::new(BTreeMap::new()),
        }
    }

    /// Reviewer that passes everything with a high score
    #[must_use]
    pub fn always_pass() -> Self {
        Self::new(70, 90)
    }

    /// Reviewer that fails everything with a low score
    #[must_use]
    pub fn always_fail() -> Self {
        Self::new(70, 40)
    }

    /// Queue scripted scores for one topic, consumed in order
    #[must_use]
    pub fn with_scores(self, topic: Topic, scores: &[u8]) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(topic, scores.iter().copied().collect());
        self
    }

    pub fn total_reviews(&self) -> usize {
        self.reviews.load(Ordering::SeqCst)
    }

    pub fn reviews_for(&self, topic: Topic) -> u32 {
        self.per_topic
            .lock()
            .unwrap()
            .get(&topic)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Reviewer for ScriptedReviewer {
    async fn review(&self, draft: &SectionDraft) -> Result<ReviewVerdict, PipelineError> {
        self.reviews.fetch_add(1, Ordering::SeqCst);
        *self
            .per_topic
            .lock()
            .unwrap()
            .entry(draft.topic)
            .or_insert(0) += 1;

        let score = self
            .script
            .lock()
            .unwrap()
            .get_mut(&draft.topic)
            .and_then(VecDeque::pop_front)
            .unwrap_or(self.default_score);

        let feedback = if score < self.threshold {
            Some(format!(
                "Vague metrics in the {} section; add concrete figures.",
                draft.topic
            ))
        } else {
            None
        };

        Ok(ReviewVerdict::from_score(
            draft.topic,
            score,
            self.threshold,
            feedback,
        ))
    }
}

/// Reviewer whose scoring service always errors
#[derive(Debug, Default)]
pub struct BrokenReviewer;

#[async_trait]
impl Reviewer for BrokenReviewer {
    async fn review(&self, _draft: &SectionDraft) -> Result<ReviewVerdict, PipelineError> {
        Err(PipelineError::ReviewFailed(
            "scoring service unreachable".to_string(),
        ))
    }
}

/// Example store that is always unreachable
#[derive(Debug, Default)]
pub struct UnreachableStore;

#[async_trait]
impl ExampleStore for UnreachableStore {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn query(
        &self,
        _vector: &[f32],
        _top_k: usize,
        _filter: &ChunkFilter,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// One approved fixture chunk
#[must_use]
pub fn fixture_chunk(id: &str, topic: Topic, text: &str) -> ExampleChunk {
    ExampleChunk {
        id: id.to_string(),
        text: text.to_string(),
        topic,
        status: ChunkStatus::Approved,
        industry: "pharmacy".to_string(),
        tech_code: "01.01".to_string(),
        project_title: Some(format!("Fixture {id}")),
        embedding: Vec::new(),
    }
}

/// Store with two approved chunks per topic
#[must_use]
pub fn fixture_store() -> JsonExampleStore {
    let mut chunks = Vec::new();
    for topic in Topic::ALL {
        chunks.push(fixture_chunk(
            &format!("{}-1", topic.key()),
            topic,
            "The team was unsure whether shortage signals could be predicted from \
             dispensing data alone.",
        ));
        chunks.push(fixture_chunk(
            &format!("{}-2", topic.key()),
            topic,
            "Initial tests failed because supplier lead times dominated the variance.",
        ));
    }
    JsonExampleStore::from_chunks(chunks)
}

/// The canonical pharmacy request used across scenario tests
#[must_use]
pub fn sample_request() -> GenerationRequest {
    GenerationRequest::new(
        "pharmacy",
        "01.01",
        "Developed AI-driven inventory software to predict drug shortages",
    )
    .expect("fixture request is valid")
}
