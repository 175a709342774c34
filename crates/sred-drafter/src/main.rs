//! SRED Drafter CLI
//!
//! Wires the JSON example store, the chat-completion client, and the
//! orchestrator into one command that drafts all three narrative
//! sections for a project. The API key is read from `OPENAI_API_KEY`;
//! log verbosity follows `RUST_LOG`.

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use sred_agents::{LlmReviewer, TopicGenerator};
use sred_core::{GenerationRequest, PipelineConfig};
use sred_llm::OpenAiClient;
use sred_pipeline::Orchestrator;
use sred_retrieval::{JsonExampleStore, Retriever};
use std::sync::Arc;

fn cli() -> Command {
    Command::new("sred-drafter")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Retrieval-augmented drafting of SR&ED narrative sections")
        .arg(
            Arg::new("examples")
                .long("examples")
                .required(true)
                .help("Path to the JSON example-chunk snapshot"),
        )
        .arg(
            Arg::new("industry")
                .long("industry")
                .required(true)
                .help("Claimant industry, e.g. pharmacy"),
        )
        .arg(
            Arg::new("tech-code")
                .long("tech-code")
                .required(true)
                .help("CRA field-of-technology code, e.g. 01.01"),
        )
        .arg(
            Arg::new("description")
                .long("description")
                .required(true)
                .help("Plain-language description of the project work"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML pipeline configuration file"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .help("Model identifier, overriding the configured one"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .default_value("https://api.openai.com/v1")
                .help("OpenAI-compatible API root"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Emit the full report as JSON"),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let matches = cli().get_matches();
    let examples = matches
        .get_one::<String>("examples")
        .context("missing --examples")?;
    let industry = matches
        .get_one::<String>("industry")
        .context("missing --industry")?;
    let tech_code = matches
        .get_one::<String>("tech-code")
        .context("missing --tech-code")?;
    let description = matches
        .get_one::<String>("description")
        .context("missing --description")?;
    let base_url = matches
        .get_one::<String>("base-url")
        .context("missing --base-url")?;

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            let raw =
                std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            PipelineConfig::from_toml_str(&raw)?
        }
        None => PipelineConfig::new(),
    };
    if let Some(model) = matches.get_one::<String>("model") {
        config.model = model.clone();
    }

    let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;

    let store = Arc::new(
        JsonExampleStore::from_path(examples)
            .with_context(|| format!("loading example store from {examples}"))?,
    );
    let llm = Arc::new(OpenAiClient::new(base_url, api_key, &config.model)?);
    let orchestrator = Orchestrator::new(
        Retriever::new(store, config.top_k),
        TopicGenerator::new(llm.clone(), config.clone()),
        Arc::new(LlmReviewer::new(llm, config.clone())),
        config,
    )?;

    let request = GenerationRequest::new(industry, tech_code, description)?;
    let report = orchestrator.run(request).await?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for (topic, text) in &report.sections {
        println!("## {}", topic.label());
        println!();
        println!("{text}");
        println!();
    }
    for (topic, verdict) in &report.verdicts {
        let status = if verdict.passed {
            "accepted"
        } else {
            "below threshold"
        };
        println!("{}: {} ({status})", topic.label(), verdict.score);
    }
    if report.quality_caveat {
        tracing::warn!(
            rounds = report.rounds_used,
            "one or more sections never reached a passing score"
        );
        eprintln!("warning: report contains sections that never passed review");
    }

    Ok(())
}
