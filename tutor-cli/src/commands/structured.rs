//! Structured output lab
//!
//! Requests a lecture summary in inline-format and tool-call mode and
//! compares how well each result matches the contract.

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::*;
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tutor_client::{AssistantsClient, AsyncJobClient};
use tutor_core::domain::job::{JobStatus, StructuredMode};
use tutor_core::domain::schema::{SchemaContract, Strictness};
use tutor_core::failure::JobFailure;

use super::{load_assistant, print_failure, print_heading};
use crate::config::Config;
use crate::lecture::{self, LectureSummary};

const PERSONA: &str = "You are a Study Q&A Assistant.";

/// Which structured-output modes to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeChoice {
    Inline,
    Tool,
    Both,
}

#[derive(Args)]
pub struct StructuredArgs {
    /// Modes to demonstrate
    #[arg(long, value_enum, default_value_t = ModeChoice::Both)]
    mode: ModeChoice,

    /// Topic for the inline-format request
    #[arg(long, default_value = "Recursion in Programming")]
    inline_topic: String,

    /// Topic for the tool-call request
    #[arg(long, default_value = "Dynamic Programming")]
    tool_topic: String,

    /// Accept fields the contract does not name
    #[arg(long)]
    loose: bool,
}

/// Result of one mode, kept for the comparison
enum Outcome {
    Typed(LectureSummary),
    /// Valid against the contract but not convertible to the typed struct
    Untyped(JsonValue),
    Failed(JobFailure),
}

pub async fn run(
    args: StructuredArgs,
    client: &AssistantsClient,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    println!("{}", "Structured Output Lab (LectureSummary)".bold());

    let assistant = load_assistant(client, config).await?;

    let jobs = AsyncJobClient::new(client.clone(), assistant.id).with_persona(PERSONA);
    let contract = lecture::contract();
    let strictness = if args.loose {
        Strictness::Loose
    } else {
        Strictness::Strict
    };

    let inline = match args.mode {
        ModeChoice::Inline | ModeChoice::Both => Some(
            demonstrate(
                &jobs,
                config,
                cancel,
                &contract,
                strictness,
                StructuredMode::InlineFormat,
                &format!("Create a Lecture Summary for the topic: \"{}\".", args.inline_topic),
            )
            .await,
        ),
        ModeChoice::Tool => None,
    };

    let tool = match args.mode {
        ModeChoice::Tool | ModeChoice::Both if !cancel.is_cancelled() => Some(
            demonstrate(
                &jobs,
                config,
                cancel,
                &contract,
                strictness,
                StructuredMode::ToolCall,
                &format!(
                    "Please summarize the topic '{}'. Include its explanation, examples, key_points, and if possible, its difficulty and some learning resources.",
                    args.tool_topic
                ),
            )
            .await,
        ),
        _ => None,
    };

    compare(inline.as_ref(), tool.as_ref());
    Ok(())
}

async fn demonstrate(
    jobs: &AsyncJobClient<AssistantsClient>,
    config: &Config,
    cancel: &CancellationToken,
    contract: &SchemaContract,
    strictness: Strictness,
    mode: StructuredMode,
    prompt: &str,
) -> Outcome {
    print_heading(&format!("Demonstrating {} mode", mode));

    let result = fetch(jobs, config, cancel, contract, strictness, mode, prompt).await;
    let value = match result {
        Ok(value) => value,
        Err(failure) => {
            print_failure(&failure);
            return Outcome::Failed(failure);
        }
    };

    let pretty = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    println!("{}", "Result payload:".bold());
    println!("{}", pretty.dimmed());

    if let Some(object) = value.as_object() {
        let fields: Vec<&str> = object.keys().map(String::as_str).collect();
        println!("{} Fields found: {}", "▸".cyan(), fields.join(", "));
    }
    println!("{} Validated against {}", "✓".green(), contract.name);

    match serde_json::from_value::<LectureSummary>(value.clone()) {
        Ok(summary) => {
            print_summary(&summary);
            Outcome::Typed(summary)
        }
        Err(e) => {
            println!("  {} Typed conversion failed: {}", "⚠".yellow(), e);
            Outcome::Untyped(value)
        }
    }
}

async fn fetch(
    jobs: &AsyncJobClient<AssistantsClient>,
    config: &Config,
    cancel: &CancellationToken,
    contract: &SchemaContract,
    strictness: Strictness,
    mode: StructuredMode,
    prompt: &str,
) -> Result<JsonValue, JobFailure> {
    let job = jobs.submit_structured(prompt, contract, mode).await?;
    println!("{} Submitted job {} ({})", "▸".cyan(), job.id.dimmed(), job.status);

    let completion = jobs.await_completion(job, &config.poll, cancel).await?;
    let job = completion.into_job();
    println!("{} Job {} is {}", "▸".cyan(), job.id.dimmed(), job.status);

    let result = jobs.extract_and_validate(&job, contract, strictness).await;

    // A tool-call run pauses for our tool output; we never send one.
    if mode == StructuredMode::ToolCall && job.status == JobStatus::Completed {
        if let Err(e) = jobs.cancel(job).await {
            debug!("Run did not need cancelling: {}", e);
        }
    }

    result
}

fn print_summary(summary: &LectureSummary) {
    let snippet: String = summary.explanation.chars().take(100).collect();
    println!("  Topic:       {}", summary.topic.cyan());
    println!("  Explanation: {}...", snippet);
    println!("  Examples:    {} item(s)", summary.examples.len());
    println!("  Key points:  {} item(s)", summary.key_points.len());
    if let Some(difficulty) = &summary.difficulty {
        println!("  Difficulty:  {}", difficulty);
    }
    if let Some(resources) = &summary.resources {
        println!("  Resources:   {} item(s)", resources.len());
    }
}

fn compare(inline: Option<&Outcome>, tool: Option<&Outcome>) {
    print_heading("Comparison of approaches");

    for (label, outcome) in [("Inline format", inline), ("Tool call", tool)] {
        let Some(outcome) = outcome else {
            println!("{}: {}", label.bold(), "not run".dimmed());
            continue;
        };

        match outcome {
            Outcome::Typed(summary) => {
                println!("{}: {}", label.bold(), "valid LectureSummary".green());
                println!("  Topic:      {}", summary.topic);
                println!("  Key points: {} item(s)", summary.key_points.len());
                println!(
                    "  Difficulty: {}",
                    summary.difficulty.as_deref().unwrap_or("not provided")
                );
            }
            Outcome::Untyped(value) => {
                println!("{}: {}", label.bold(), "valid JSON, typed conversion failed".yellow());
                if let Some(object) = value.as_object() {
                    let keys: Vec<&str> = object.keys().map(String::as_str).collect();
                    println!("  Keys: {}", keys.join(", "));
                }
            }
            Outcome::Failed(failure) => {
                println!("{}: {}", label.bold(), failure.class().to_string().red());
            }
        }
    }

    println!();
    println!("{}", "Takeaways:".bold());
    println!("  • Inline format relies on instructions alone, so field adherence is best effort.");
    println!("  • Tool call enforces the parameter schema, so the arguments match the contract.");
}
