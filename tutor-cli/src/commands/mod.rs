//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod cleanup;
mod rag;
mod structured;

pub use cleanup::CleanupArgs;
pub use rag::RagArgs;
pub use structured::StructuredArgs;

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tutor_client::AssistantsClient;
use tutor_core::domain::resource::ReleaseReport;
use tutor_core::dto::assistant::Assistant;
use tutor_core::failure::JobFailure;

use crate::config::Config;
use crate::session;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Compare inline-format and tool-call structured output
    Structured(StructuredArgs),
    /// Answer questions grounded in uploaded documents
    Rag(RagArgs),
    /// Delete old remote resources and local lab files
    Cleanup(CleanupArgs),
    /// Show a snapshot of remote resource usage
    Usage,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(
    command: Commands,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    let client = AssistantsClient::new(config.client.clone())?;

    match command {
        Commands::Structured(args) => structured::run(args, &client, config, cancel).await,
        Commands::Rag(args) => rag::run(args, &client, config, cancel).await,
        Commands::Cleanup(args) => cleanup::run(args, &client, config, cancel).await,
        Commands::Usage => {
            cleanup::show_usage(&client, config).await;
            Ok(())
        }
    }
}

/// Loads the session's assistant and checks that the service knows it
async fn load_assistant(client: &AssistantsClient, config: &Config) -> Result<Assistant> {
    let assistant_id = session::load_assistant_id(&config.session_file)?;
    let assistant = client
        .get_assistant(&assistant_id)
        .await
        .with_context(|| format!("Failed to load assistant {}", assistant_id))?;

    println!(
        "{} Using assistant: {} ({}, model {}, {} tool(s))",
        "✓".green(),
        assistant.name.as_deref().unwrap_or("unnamed").cyan(),
        assistant.id.dimmed(),
        assistant.model,
        assistant.tools.len()
    );
    Ok(assistant)
}

/// Print a section title
fn print_heading(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "=".repeat(60).dimmed());
}

/// Print a failure together with its class and any retained data
fn print_failure(failure: &JobFailure) {
    println!(
        "  {} {}: {}",
        "✗".red(),
        failure.class().to_string().red(),
        failure
    );

    if let Some(raw) = failure.raw_text() {
        println!("    Raw text: {}", raw.dimmed());
    }

    if let Some(value) = failure.partial_value() {
        let keys = value
            .as_object()
            .map(|object| object.keys().cloned().collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        println!("    Fields present: {}", keys.dimmed());
    }
}

/// Print the outcome of a release batch
fn print_release_report(report: &ReleaseReport) {
    for handle in &report.deleted {
        println!("  {} Deleted {}", "✓".green(), handle);
    }
    for failure in &report.failed {
        println!(
            "  {} Could not delete {}: {}",
            "⚠".yellow(),
            failure.handle,
            failure.reason.dimmed()
        );
    }
}

/// Ask a yes/no question on the terminal; anything but "y" means no
///
/// An interrupt while waiting for the answer also counts as no.
async fn confirm(question: &str, cancel: &CancellationToken) -> Result<bool> {
    print!("{} (y/N): ", question);
    io::stdout().flush()?;

    let mut stdin = BufReader::new(tokio::io::stdin());
    read_confirmation(&mut stdin, cancel).await
}

async fn read_confirmation<R>(reader: &mut R, cancel: &CancellationToken) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    let mut answer = String::new();
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            println!();
            Ok(false)
        }
        read = reader.read_line(&mut answer) => {
            read?;
            Ok(is_yes(&answer))
        }
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}
