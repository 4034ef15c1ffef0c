//! Cleanup and usage commands
//!
//! Releases remote resources older than a threshold, optionally deletes the
//! lab assistant, and removes files the labs leave behind locally.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use colored::*;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tutor_client::AssistantsClient;
use tutor_client::job_client::release;
use tutor_core::domain::resource::{ResourceHandle, ResourceKind};
use tutor_core::dto::file::ASSISTANTS_PURPOSE;

use super::{confirm, print_heading, print_release_report};
use crate::config::Config;
use crate::session;

/// Page size used when listing remote resources
const LIST_LIMIT: u32 = 100;

/// Files the labs write next to the project
const LOCAL_LAB_FILES: &[&str] = &[".last_thread", "exam_notes.json"];

#[derive(Args)]
pub struct CleanupArgs {
    /// Only delete resources older than this many hours
    #[arg(long, default_value_t = 24)]
    max_age: u64,

    /// Also delete the lab assistant and its session file
    #[arg(long)]
    delete_assistant: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Data directory to remove if it is empty
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

pub async fn run(
    args: CleanupArgs,
    client: &AssistantsClient,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    println!("{}", "Cleanup Utility".bold());

    show_usage(client, config).await;

    println!();
    println!(
        "This will delete remote resources older than {} hour(s).",
        args.max_age
    );
    if args.delete_assistant {
        println!(
            "{}",
            "WARNING: --delete-assistant is set; the lab assistant will be deleted.".yellow()
        );
    }

    if !args.yes && !confirm("Proceed with cleanup?", cancel).await? {
        println!("{}", "Cleanup cancelled.".yellow());
        return Ok(());
    }

    let now = Utc::now();
    for category in [ResourceKind::Thread, ResourceKind::File, ResourceKind::VectorStore] {
        if interrupted(cancel) {
            return Ok(());
        }
        clean_category(client, category, args.max_age, now).await;
    }

    if interrupted(cancel) {
        return Ok(());
    }
    clean_assistant(client, &config.session_file, args.delete_assistant).await?;

    print_heading("Local lab files");
    let targets: Vec<PathBuf> = LOCAL_LAB_FILES.iter().map(PathBuf::from).collect();
    let removed = remove_local_files(&targets, &args.data_dir);
    for path in &removed {
        println!("  {} Removed {}", "✓".green(), path.display());
    }
    println!("Removed {} local path(s).", removed.len());

    print_heading("Post-cleanup snapshot");
    show_usage(client, config).await;
    println!();
    println!(
        "{}",
        "Tip: use --max-age <hours> and --delete-assistant for finer control.".dimmed()
    );

    Ok(())
}

fn interrupted(cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        println!("{}", "Cleanup interrupted; remaining steps skipped.".yellow());
        return true;
    }
    false
}

/// Handles strictly older than `max_age_hours`
fn stale(handles: Vec<ResourceHandle>, max_age_hours: u64, now: DateTime<Utc>) -> Vec<ResourceHandle> {
    handles
        .into_iter()
        .filter(|h| h.is_older_than(max_age_hours, now))
        .collect()
}

async fn release_stale(
    client: &AssistantsClient,
    kind: ResourceKind,
    handles: Vec<ResourceHandle>,
    max_age_hours: u64,
    now: DateTime<Utc>,
) {
    let handles = stale(handles, max_age_hours, now);
    let report = release(client, &handles).await;
    print_release_report(&report);
    println!(
        "Deleted {} {}(s) older than {} hour(s).",
        report.deleted.len(),
        kind,
        max_age_hours
    );
}

/// Lists one category and releases its stale entries
///
/// A listing failure is reported and leaves the other categories alone.
async fn clean_category(
    client: &AssistantsClient,
    kind: ResourceKind,
    max_age_hours: u64,
    now: DateTime<Utc>,
) {
    let listed: tutor_client::Result<Vec<ResourceHandle>> = match kind {
        ResourceKind::Thread => {
            print_heading("Threads");
            client
                .list_threads(LIST_LIMIT)
                .await
                .map(|threads| threads.data.iter().map(|t| t.handle()).collect())
        }
        ResourceKind::File => {
            print_heading("Assistant files");
            client.list_files(Some(ASSISTANTS_PURPOSE)).await.map(|files| {
                files
                    .data
                    .iter()
                    .filter(|f| f.is_for_assistants())
                    .map(|f| f.handle())
                    .collect()
            })
        }
        ResourceKind::VectorStore => {
            print_heading("Vector stores");
            client
                .list_vector_stores(LIST_LIMIT)
                .await
                .map(|stores| stores.data.iter().filter_map(|s| s.handle()).collect())
        }
        ResourceKind::Assistant => return,
    };

    match listed {
        Ok(handles) => release_stale(client, kind, handles, max_age_hours, now).await,
        Err(e) => {
            warn!("Listing {}s failed: {}", kind, e);
            println!("  {} Could not list {}s: {}", "✗".red(), kind, e);
        }
    }
}

async fn clean_assistant(client: &AssistantsClient, session_file: &Path, delete: bool) -> Result<()> {
    print_heading("Lab assistant");

    let Some(assistant_id) = session::read_assistant_id(session_file)? else {
        println!(
            "No assistant id in {}; skipping assistant cleanup.",
            session_file.display()
        );
        return Ok(());
    };

    if !delete {
        println!(
            "Keeping assistant {} (use --delete-assistant to remove it).",
            assistant_id.cyan()
        );
        return Ok(());
    }

    let handle = match client.get_assistant(&assistant_id).await {
        Ok(assistant) => assistant.handle(),
        Err(e) => {
            warn!("Could not look up assistant {}: {}", assistant_id, e);
            ResourceHandle::new(ResourceKind::Assistant, assistant_id, Utc::now())
        }
    };
    let report = release(client, std::slice::from_ref(&handle)).await;
    print_release_report(&report);

    if report.is_clean() {
        session::forget_assistant(session_file)?;
        println!("  {} Removed session file {}", "✓".green(), session_file.display());
    }

    Ok(())
}

/// Removes the given files and `data_dir` if it is empty
///
/// Returns the paths actually removed; failures are logged and skipped.
fn remove_local_files(files: &[PathBuf], data_dir: &Path) -> Vec<PathBuf> {
    let mut removed = Vec::new();

    for path in files {
        if !path.exists() {
            continue;
        }
        match std::fs::remove_file(path) {
            Ok(()) => removed.push(path.clone()),
            Err(e) => warn!("Could not delete local file {}: {}", path.display(), e),
        }
    }

    let is_empty = std::fs::read_dir(data_dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if is_empty {
        match std::fs::remove_dir(data_dir) {
            Ok(()) => removed.push(data_dir.to_path_buf()),
            Err(e) => warn!("Could not remove data directory {}: {}", data_dir.display(), e),
        }
    } else if data_dir.exists() {
        println!(
            "  {} {} is not empty; leaving it in place",
            "ℹ".blue(),
            data_dir.display()
        );
    }

    removed
}

/// Prints counts of remote resources; each category fails independently
pub async fn show_usage(client: &AssistantsClient, config: &Config) {
    print_heading("Current resource usage");

    match client.list_threads(LIST_LIMIT).await {
        Ok(threads) => println!("  Threads (up to {}):       {}", LIST_LIMIT, threads.data.len()),
        Err(e) => println!("  Threads:                  {} ({})", "unavailable".red(), e),
    }

    match client.list_files(None).await {
        Ok(files) => {
            let assistant_files = files.data.iter().filter(|f| f.is_for_assistants()).count();
            println!(
                "  Assistant files:          {} (out of {} total)",
                assistant_files,
                files.data.len()
            );
        }
        Err(e) => println!("  Files:                    {} ({})", "unavailable".red(), e),
    }

    match client.list_vector_stores(LIST_LIMIT).await {
        Ok(stores) => println!("  Vector stores (up to {}): {}", LIST_LIMIT, stores.data.len()),
        Err(e) => println!("  Vector stores:            {} ({})", "unavailable".red(), e),
    }

    match session::read_assistant_id(&config.session_file) {
        Ok(Some(id)) => match client.get_assistant(&id).await {
            Ok(assistant) => println!(
                "  Lab assistant:            {} ({}, model {})",
                id.cyan(),
                assistant.name.as_deref().unwrap_or("unnamed"),
                assistant.model
            ),
            Err(e) => println!(
                "  Lab assistant:            {} ({}: {})",
                id.cyan(),
                "lookup failed".red(),
                e
            ),
        },
        Ok(None) => println!(
            "  Lab assistant:            {} not found",
            config.session_file.display()
        ),
        Err(e) => println!("  Lab assistant:            {} ({:#})", "unavailable".red(), e),
    }
}
