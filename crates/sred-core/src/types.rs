//! Core types for the drafting pipeline
//!
//! Defines the fundamental types shared by every stage:
//! - The three fixed narrative topics
//! - Example chunks retrieved from the store
//! - Generation requests, drafts, verdicts, and the final report

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ulid::Ulid;

/// Unique request identifier (ULID for sortability in logs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Ulid);

impl RequestId {
    /// Generate new request ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three fixed narrative topics every report must answer
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// What did the team not know at the start?
    Uncertainty,
    /// Hypothesis -> experiment -> result narrative
    SystematicInvestigation,
    /// New knowledge gained, beyond product features
    TechnologicalAdvancement,
}

impl Topic {
    /// All topics in fixed report order
    pub const ALL: [Topic; 3] = [
        Topic::Uncertainty,
        Topic::SystematicInvestigation,
        Topic::TechnologicalAdvancement,
    ];

    /// Snake-case wire key, matching the persisted chunk labels
    #[inline]
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Topic::Uncertainty => "uncertainty",
            Topic::SystematicInvestigation => "systematic_investigation",
            Topic::TechnologicalAdvancement => "technological_advancement",
        }
    }

    /// Human-readable section heading
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Topic::Uncertainty => "Technological Uncertainty",
            Topic::SystematicInvestigation => "Systematic Investigation",
            Topic::TechnologicalAdvancement => "Technological Advancement",
        }
    }

    /// Target word band (min, max) for the section's prose
    #[inline]
    #[must_use]
    pub fn word_band(&self) -> (usize, usize) {
        match self {
            Topic::Uncertainty => (300, 350),
            Topic::SystematicInvestigation => (650, 700),
            Topic::TechnologicalAdvancement => (300, 350),
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Topic {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uncertainty" => Ok(Topic::Uncertainty),
            "systematic_investigation" => Ok(Topic::SystematicInvestigation),
            "technological_advancement" => Ok(Topic::TechnologicalAdvancement),
            other => Err(PipelineError::InvalidRequest(format!(
                "unknown topic: {other}"
            ))),
        }
    }
}

/// Approval status of a stored example chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    /// Chunk from a claim that passed review; usable as an exemplar
    Approved,
    /// Chunk from a rejected claim; never surfaced as a positive exemplar
    Rejected,
}

/// An embedded example chunk from the persisted store
///
/// Created once during ingestion (out of scope here); read-only at
/// generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleChunk {
    /// Opaque store identifier
    pub id: String,
    /// Chunk text
    pub text: String,
    /// Topic label the chunk was filed under
    pub topic: Topic,
    /// Approval status
    pub status: ChunkStatus,
    /// Industry label, e.g. "pharmacy"
    pub industry: String,
    /// Technology code, e.g. "01.01"
    pub tech_code: String,
    /// Source project title, shown in prompt context when present
    #[serde(default)]
    pub project_title: Option<String>,
    /// Fixed-dimension embedding vector
    pub embedding: Vec<f32>,
}

/// One user submission
///
/// Ephemeral; owned exclusively by a single orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Industry or domain, e.g. "pharmacy"
    pub industry: String,
    /// Technology code, e.g. "01.01"
    pub tech_code: String,
    /// Brief project summary
    pub project_description: String,
}

impl GenerationRequest {
    /// Minimum accepted description length after trimming
    pub const MIN_DESCRIPTION_LEN: usize = 10;

    /// Create a validated request
    ///
    /// Fields are whitespace-trimmed; `industry` and `tech_code` may be
    /// empty (they only narrow retrieval filters).
    ///
    /// # Errors
    /// - `PipelineError::InvalidRequest` if the description is blank or
    ///   shorter than [`Self::MIN_DESCRIPTION_LEN`]
    pub fn new(
        industry: impl Into<String>,
        tech_code: impl Into<String>,
        project_description: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        let project_description = project_description.into().trim().to_string();
        if project_description.len() < Self::MIN_DESCRIPTION_LEN {
            return Err(PipelineError::InvalidRequest(format!(
                "project description must be at least {} characters",
                Self::MIN_DESCRIPTION_LEN
            )));
        }
        Ok(Self {
            industry: industry.into().trim().to_string(),
            tech_code: tech_code.into().trim().to_string(),
            project_description,
        })
    }

    /// Query text used for embedding, one labeled line per field
    #[must_use]
    pub fn query_text(&self) -> String {
        format!(
            "Industry: {}\nTech code: {}\nDescription: {}",
            self.industry, self.tech_code, self.project_description
        )
    }
}

/// Candidate text for one topic within one generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDraft {
    /// Topic the draft answers
    pub topic: Topic,
    /// Draft prose
    pub text: String,
    /// How many times this topic has been generated (first pass = 1)
    pub iteration: u32,
}

impl SectionDraft {
    /// Create a new draft
    #[inline]
    #[must_use]
    pub fn new(topic: Topic, text: impl Into<String>, iteration: u32) -> Self {
        Self {
            topic,
            text: text.into(),
            iteration,
        }
    }
}

/// Reviewer judgment for one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    /// Topic reviewed
    pub topic: Topic,
    /// Rubric score, 0-100
    pub score: u8,
    /// Whether the score met the configured threshold
    pub passed: bool,
    /// Deficiency description; always present when `passed` is false
    pub feedback: Option<String>,
}

impl ReviewVerdict {
    /// Build a verdict from a raw score against a threshold
    ///
    /// Scores above 100 are clamped. Feedback is dropped for passing
    /// verdicts (passing sections carry no correction directive forward).
    #[must_use]
    pub fn from_score(
        topic: Topic,
        score: u8,
        threshold: u8,
        feedback: Option<String>,
    ) -> Self {
        let score = score.min(100);
        let passed = score >= threshold;
        Self {
            topic,
            score,
            passed,
            feedback: if passed { None } else { feedback },
        }
    }
}

/// Assembled output of one generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalReport {
    /// Final text per topic; always exactly three entries
    pub sections: BTreeMap<Topic, String>,
    /// Set when any topic never reached a passing verdict
    pub quality_caveat: bool,
    /// Review rounds consumed (1 = accepted on first pass)
    pub rounds_used: u32,
    /// Last verdict recorded per topic
    pub verdicts: BTreeMap<Topic, ReviewVerdict>,
}

impl FinalReport {
    /// Section text for a topic, if present
    #[inline]
    #[must_use]
    pub fn section(&self, topic: Topic) -> Option<&str> {
        self.sections.get(&topic).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn topic_keys_round_trip() {
        for topic in Topic::ALL {
            let parsed: Topic = topic.key().parse().unwrap();
            assert_eq!(parsed, topic);
        }
    }

    #[test]
    fn topic_word_bands() {
        assert_eq!(Topic::Uncertainty.word_band(), (300, 350));
        assert_eq!(Topic::SystematicInvestigation.word_band(), (650, 700));
    }

    #[test]
    fn request_trims_and_validates() {
        let req = GenerationRequest::new(" pharmacy ", "01.01", "  Predict drug shortages with ML  ")
            .unwrap();
        assert_eq!(req.industry, "pharmacy");
        assert_eq!(req.project_description, "Predict drug shortages with ML");

        let err = GenerationRequest::new("", "", "short");
        assert!(matches!(err, Err(PipelineError::InvalidRequest(_))));
    }

    #[test]
    fn request_query_text_shape() {
        let req = GenerationRequest::new("pharmacy", "01.01", "Inventory prediction software")
            .unwrap();
        assert_eq!(
            req.query_text(),
            "Industry: pharmacy\nTech code: 01.01\nDescription: Inventory prediction software"
        );
    }

    #[test]
    fn verdict_threshold_and_clamp() {
        let v = ReviewVerdict::from_score(Topic::Uncertainty, 70, 70, None);
        assert!(v.passed);
        assert!(v.feedback.is_none());

        let v = ReviewVerdict::from_score(
            Topic::Uncertainty,
            69,
            70,
            Some("vague metrics".to_string()),
        );
        assert!(!v.passed);
        assert_eq!(v.feedback.as_deref(), Some("vague metrics"));

        let v = ReviewVerdict::from_score(Topic::Uncertainty, 255, 70, None);
        assert_eq!(v.score, 100);
    }

    #[test]
    fn verdict_drops_feedback_when_passing() {
        let v = ReviewVerdict::from_score(
            Topic::TechnologicalAdvancement,
            90,
            70,
            Some("stale note".to_string()),
        );
        assert!(v.passed);
        assert!(v.feedback.is_none());
    }

    #[test]
    fn chunk_status_serde_snake_case() {
        let json = serde_json::to_string(&ChunkStatus::Approved).unwrap();
        assert_eq!(json, "\"approved\"");
        let status: ChunkStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(status, ChunkStatus::Rejected);
    }
}
