//! Prompt library
//!
//! Fixed instruction blocks per topic, the reviewer rubric, and the
//! refinement directive, plus the builders that assemble user messages
//! from request context and retrieved examples.

use sred_core::{GenerationRequest, RubricWeights, SectionDraft, Topic};
use sred_retrieval::RetrievalResult;

/// Separator between retrieved example blocks
const EXAMPLE_SEPARATOR: &str = "\n\n---\n\n";

/// Placeholder rendered when retrieval found nothing
const NO_EXAMPLES: &str = "No prior examples available.";

/// Formatting rules appended to every drafting system prompt
const FORMATTING_RULES: &str =
    "\n\nFORMATTING: Paragraphs only. No headings. Do not mention you are AI.";

const UNCERTAINTY_PROMPT: &str = "\
You are a technical SR&ED consultant.
Write the 'Technological Uncertainty' section.
Crucial Rules:
1. Focus ONLY on the technical knowledge gap. What did the team NOT know at the start?
2. Explicitly contrast \"Standard Practice\" (what a typical engineer could do easily) vs. the specific \"Unknowns\" (variables, interactions, or limitations) that required experimentation.
3. DO NOT discuss business risks (e.g., cost, market timelines, budget) or routine software bugs.
4. Use phrases like: \"It was unsure if...\", \"Standard frameworks did not support...\", \"The interaction between X and Y was unpredictable.\"
5. Do NOT mention the company name. Use \"The team\" or \"The project\".";

const INVESTIGATION_PROMPT: &str = "\
You are a technical SR&ED consultant.
Write the 'Systematic Investigation' section.
Crucial Rules:
1. Structure this chronologically as a technical narrative: Hypothesis -> Experiment/Test -> Result -> Conclusion/Next Step.
2. Highlight the \"Iterative Process\". Describe failures and what was learned from them. A straight line to success sounds fake.
3. Include quantitative details where possible (e.g., \"Tested 3 configurations,\" \"Latency reduced by 15%,\" \"Dataset of 5000 images\").
4. Use phrases like: \"The team hypothesized...\", \"Initial tests failed because...\", \"To isolate the variable, we modified...\"
5. Do NOT mention the company name.";

const ADVANCEMENT_PROMPT: &str = "\
You are a technical SR&ED consultant.
Write the 'Technological Advancement' section.
Crucial Rules:
1. Focus on the NEW KNOWLEDGE gained, not just the new product features.
2. Explain how the company's technical baseline was elevated. What can they do now that they couldn't do before?
3. If the project failed, explain the \"knowledge gained through failure\" (e.g., knowing that this specific approach is invalid).
4. Use phrases like: \"We generated new insight into...\", \"The team established a new baseline for...\", \"This work extended the capabilities of [Technology] by...\"
5. Do NOT mention the company name.";

const REFINER_PROMPT: &str = "\
You are a Senior SR&ED Technical Writer.
Your goal is to rewrite a draft section based on specific Reviewer feedback.

Instructions:
1. Read the Original Draft.
2. Read the Reviewer Feedback.
3. Rewrite the section to address EVERY point in the feedback.
4. Keep the good technical details from the original; only fix the problems.
5. Ensure the tone remains objective and professional.
6. Do not include any preamble (e.g., \"Here is the rewritten version\"). Just output the text.";

/// Drafting system prompt for a topic, formatting rules included
#[must_use]
pub fn drafting_system_prompt(topic: Topic) -> String {
    let base = match topic {
        Topic::Uncertainty => UNCERTAINTY_PROMPT,
        Topic::SystematicInvestigation => INVESTIGATION_PROMPT,
        Topic::TechnologicalAdvancement => ADVANCEMENT_PROMPT,
    };
    format!("{base}{FORMATTING_RULES}")
}

/// Refinement system prompt, formatting rules included
#[must_use]
pub fn refinement_system_prompt() -> String {
    format!("{REFINER_PROMPT}{FORMATTING_RULES}")
}

/// Render retrieved examples as prompt context
#[must_use]
pub fn render_examples(retrieval: &RetrievalResult) -> String {
    if retrieval.is_empty() {
        return NO_EXAMPLES.to_string();
    }
    retrieval
        .chunks
        .iter()
        .map(|chunk| {
            let title = chunk
                .project_title
                .as_deref()
                .unwrap_or("Example project");
            format!("Project: {title}\n\n{}", chunk.text)
        })
        .collect::<Vec<_>>()
        .join(EXAMPLE_SEPARATOR)
}

/// User message for a first-pass generation
#[must_use]
pub fn drafting_user_message(
    topic: Topic,
    request: &GenerationRequest,
    retrieval: &RetrievalResult,
) -> String {
    let (min_words, max_words) = topic.word_band();
    format!(
        "SECTION: {label}\n\
         CONTEXT: Industry={industry}, Tech Code={tech_code}\n\
         DESCRIPTION: {description}\n\n\
         EXAMPLES:\n{examples}\n\n\
         Write a {min_words}-{max_words} word draft.",
        label = topic.label(),
        industry = request.industry,
        tech_code = request.tech_code,
        description = request.project_description,
        examples = render_examples(retrieval),
    )
}

/// User message for a feedback-driven rewrite
///
/// Includes the prior draft so the rewrite addresses the named
/// deficiency instead of resampling from scratch.
#[must_use]
pub fn refinement_user_message(
    topic: Topic,
    prior_draft: &SectionDraft,
    feedback: &str,
) -> String {
    format!(
        "SECTION: {label}\n\n\
         ORIGINAL DRAFT:\n{draft}\n\n\
         REVIEWER FEEDBACK:\n{feedback}\n\n\
         Please write the final corrected version:",
        label = topic.label(),
        draft = prior_draft.text,
    )
}

/// Reviewer system prompt with the configured rubric weights
#[must_use]
pub fn reviewer_system_prompt(weights: &RubricWeights) -> String {
    format!(
        "You are a strict CRA (Canada Revenue Agency) technical reviewer.\n\
         Critique the following SR&ED draft section.\n\
         Your Goal: Identify reasons this might be REJECTED.\n\n\
         Score the draft from 0 to 100 using this weighted rubric:\n\
         - Completeness ({completeness} pts): does it address the section's defining question?\n\
         - Specificity ({specificity} pts): concrete technical detail, real numbers; penalize \"significant,\" \"huge,\" \"fast\" without figures.\n\
         - CRA alignment ({cra} pts): technical uncertainty framing, not business risk; any mention of costs, budgets, sales, or marketing scores 0 here.\n\
         - Pitfall absence ({pitfalls} pts): no routine bug fixing or library integration passed off as research; no company name (must be anonymous).\n\n\
         Output Format:\n\
         Reply with exactly one JSON object: {{\"score\": <0-100>, \"feedback\": \"<required fixes, naming the offending phrase or claim; empty only when nothing needs fixing>\"}}\n\
         No other text.",
        completeness = weights.completeness,
        specificity = weights.specificity,
        cra = weights.cra_alignment,
        pitfalls = weights.pitfall_absence,
    )
}

/// Reviewer user message for one draft
#[must_use]
pub fn reviewer_user_message(topic: Topic, draft_text: &str) -> String {
    format!(
        "SECTION: {label}\n\nDRAFT TEXT:\n{draft_text}",
        label = topic.label()
    )
}
