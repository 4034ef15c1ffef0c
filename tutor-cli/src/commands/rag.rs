//! Retrieval lab
//!
//! Uploads documents into a vector store, answers questions grounded in
//! them, reports citations and file-search usage, then offers to release
//! everything it created.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Args;
use colored::*;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tutor_client::poller::{self, Wait};
use tutor_client::{AssistantsClient, AsyncJobClient, RetrievalAnswer};
use tutor_core::domain::resource::{ResourceHandle, ResourceKind};
use tutor_core::dto::file::ASSISTANTS_PURPOSE;
use tutor_core::dto::vector_store::{CreateVectorStore, ExpirationPolicy, VectorStore};
use tutor_core::failure::JobFailure;

use super::{confirm, load_assistant, print_failure, print_heading, print_release_report};
use crate::config::Config;

const PERSONA: &str = "You are the Study Q&A Assistant.";

/// Cited text is shortened to this many characters when printed
const CITATION_EXCERPT_CHARS: usize = 70;

const DEFAULT_QUERIES: &[&str] = &[
    "According to the document, what is an algorithm?",
    "What are the three characteristics of a good algorithm mentioned in the text?",
    "Explain the Knuth-Morris-Pratt (KMP) Algorithm in your own words, based on the document.",
    "What problem does the KMP algorithm solve, as stated in the material?",
    "How does the KMP algorithm work? Describe the two main phases mentioned.",
    "What is the time complexity for the preprocessing (LPS table) phase of KMP?",
    "What is the time complexity for the search phase of KMP?",
    "What is the overall time complexity of the KMP algorithm according to the document?",
];

#[derive(Args)]
pub struct RagArgs {
    /// Directory holding the documents to upload
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Extension of the documents to upload
    #[arg(long, default_value = "pdf")]
    extension: String,

    /// Question to ask (repeatable); defaults to the KMP question set
    #[arg(short, long = "query")]
    queries: Vec<String>,

    /// Prefix of the vector store name
    #[arg(long, default_value = "VS_lab")]
    store_prefix: String,

    /// Release the vector store and uploaded files without asking
    #[arg(long)]
    cleanup: bool,
}

/// What one query produced, for the final analysis
#[derive(Debug)]
struct QueryOutcome {
    query: String,
    result: std::result::Result<AnswerStats, String>,
}

#[derive(Debug, Clone, Copy)]
struct AnswerStats {
    response_chars: usize,
    file_search_used: bool,
    citations: usize,
}

impl From<&RetrievalAnswer> for AnswerStats {
    fn from(answer: &RetrievalAnswer) -> Self {
        Self {
            response_chars: answer.text.chars().count(),
            file_search_used: answer.retrieval_invoked,
            citations: answer.annotations.len(),
        }
    }
}

/// Aggregate figures over all queries
#[derive(Debug, PartialEq)]
struct Analysis {
    total: usize,
    successful: usize,
    average_chars: Option<f64>,
    file_search_used: usize,
    with_citations: usize,
}

pub async fn run(
    args: RagArgs,
    client: &AssistantsClient,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    println!("{}", "Retrieval Lab (file search)".bold());

    let assistant = load_assistant(client, config).await?;

    let documents = find_documents(&args.data_dir, &args.extension)?;
    println!(
        "{} Found {} document(s) in {}",
        "▸".cyan(),
        documents.len(),
        args.data_dir.display()
    );

    let files = upload_documents(client, &documents).await?;

    let store = match create_store(client, &args.store_prefix, &files).await {
        Ok(store) => store,
        Err(e) => {
            let report = tutor_client::job_client::release(client, &files).await;
            print_release_report(&report);
            return Err(e);
        }
    };
    let store_handle = store
        .handle()
        .unwrap_or_else(|| ResourceHandle::new(ResourceKind::VectorStore, &store.id, Utc::now()));

    let mut created = vec![store_handle.clone()];
    created.extend(files.iter().cloned());

    let jobs = AsyncJobClient::new(client.clone(), assistant.id).with_persona(PERSONA);
    let queries: Vec<String> = if args.queries.is_empty() {
        DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect()
    } else {
        args.queries
    };

    // The store and files exist from here on, so release is offered even
    // when indexing or querying fails.
    let outcome = answer_queries(&jobs, &store_handle, queries, config, cancel, &mut created).await;
    let released = release_or_keep(client, &created, args.cleanup, cancel).await;
    outcome.and(released)
}

/// Waits for the store to be indexed and answers each query against it
///
/// The thread of every answered query is appended to `created`.
async fn answer_queries(
    jobs: &AsyncJobClient<AssistantsClient>,
    store_handle: &ResourceHandle,
    queries: Vec<String>,
    config: &Config,
    cancel: &CancellationToken,
    created: &mut Vec<ResourceHandle>,
) -> Result<()> {
    wait_for_indexing(jobs.backend(), &store_handle.id, config, cancel).await?;

    let mut outcomes = Vec::new();
    for (i, query) in queries.into_iter().enumerate() {
        if cancel.is_cancelled() {
            warn!("Skipping remaining queries after interruption");
            break;
        }

        print_heading(&format!("Query {}: {}", i + 1, query));
        let result = jobs
            .resolve_with_retrieval(&query, std::slice::from_ref(store_handle), &config.poll, cancel)
            .await;
        if let Ok(answer) = &result {
            created.push(answer.job.thread_handle());
        }
        outcomes.push(report_answer(query, result));
    }

    print_analysis(&analyze(&outcomes), &outcomes);
    Ok(())
}

/// Releases `created` when forced or confirmed, otherwise lists what is kept
async fn release_or_keep(
    client: &AssistantsClient,
    created: &[ResourceHandle],
    force: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let release = force
        || confirm("Delete the vector store, uploaded files and query threads now?", cancel)
            .await
            .context("Failed to read confirmation")?;

    if release {
        print_heading("Releasing resources");
        let report = tutor_client::job_client::release(client, created).await;
        print_release_report(&report);
    } else {
        println!(
            "{} Keeping {} resource(s); the vector store expires one day after its last use.",
            "ℹ".blue(),
            created.len()
        );
        for handle in created {
            println!("  {}", handle.to_string().dimmed());
        }
    }

    Ok(())
}

/// Documents with the given extension in `dir`, sorted by path
fn find_documents(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Data directory '{}' not found", dir.display());
    }

    let mut documents = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read data directory {}", dir.display()))?
    {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if path.is_file() && matches {
            documents.push(path);
        }
    }

    if documents.is_empty() {
        bail!("No .{} files found in {}", extension, dir.display());
    }

    documents.sort();
    Ok(documents)
}

/// Uploads each document; fails only if none could be uploaded
async fn upload_documents(client: &AssistantsClient, documents: &[PathBuf]) -> Result<Vec<ResourceHandle>> {
    print_heading("Uploading documents");

    let mut handles = Vec::new();
    for path in documents {
        match client.upload_file(path, ASSISTANTS_PURPOSE).await {
            Ok(file) => {
                println!("  {} {} -> {}", "✓".green(), path.display(), file.id.dimmed());
                handles.push(file.handle());
            }
            Err(e) => {
                warn!("Upload of {} failed: {}", path.display(), e);
                println!("  {} {}: {}", "✗".red(), path.display(), e);
            }
        }
    }

    if handles.is_empty() {
        bail!("No documents could be uploaded");
    }
    Ok(handles)
}

async fn create_store(
    client: &AssistantsClient,
    prefix: &str,
    files: &[ResourceHandle],
) -> Result<VectorStore> {
    let name = format!("{}_{}", prefix, Utc::now().timestamp());
    let store = client
        .create_vector_store(&CreateVectorStore {
            name: name.clone(),
            file_ids: files.iter().map(|f| f.id.clone()).collect(),
            expires_after: Some(ExpirationPolicy::after_last_activity(1)),
        })
        .await
        .with_context(|| format!("Failed to create vector store {}", name))?;

    println!("{} Created vector store {} ({})", "✓".green(), name.cyan(), store.id.dimmed());
    Ok(store)
}

/// Polls the store until no file is still being processed
async fn wait_for_indexing(
    client: &AssistantsClient,
    store_id: &str,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    println!("{} Waiting for file processing...", "▸".cyan());

    let outcome = poller::poll_until(&config.poll, cancel, move || async move {
        let store = client.get_vector_store(store_id).await?;
        if store.is_ready() {
            return Ok(Some(store));
        }
        println!(
            "  ... {} file(s) processing. Status: {}",
            store.file_counts.in_progress, store.status
        );
        Ok::<_, tutor_client::ClientError>(None)
    })
    .await
    .context("Failed to check vector store status")?;

    match outcome {
        Wait::Ready(store) => {
            println!(
                "{} Processing finished: {} completed, {} failed",
                "✓".green(),
                store.file_counts.completed,
                store.file_counts.failed
            );
            if store.file_counts.failed > 0 {
                println!(
                    "  {} {} file(s) failed to process",
                    "⚠".yellow(),
                    store.file_counts.failed
                );
            }
        }
        Wait::TimedOut => {
            warn!("Vector store {} still processing; querying anyway", store_id);
        }
        Wait::Cancelled => {
            warn!("Stopped waiting for vector store {}", store_id);
        }
    }

    Ok(())
}

fn report_answer(query: String, result: std::result::Result<RetrievalAnswer, JobFailure>) -> QueryOutcome {
    let answer = match result {
        Ok(answer) => answer,
        Err(failure) => {
            print_failure(&failure);
            return QueryOutcome {
                query,
                result: Err(failure.class().to_string()),
            };
        }
    };

    println!("{}", "Assistant response:".bold());
    if answer.text.is_empty() {
        println!("{}", "[No text content in the reply]".dimmed());
    } else {
        println!("{}", answer.text);
    }

    if answer.annotations.is_empty() {
        println!("{} No file citations in this response", "ℹ".blue());
    } else {
        println!("{}", "Citations:".bold());
        for annotation in &answer.annotations {
            println!(
                "  - \"{}\" -> source file {}",
                annotation.cited_excerpt(CITATION_EXCERPT_CHARS),
                annotation.source_id.cyan()
            );
        }
    }

    if answer.retrieval_invoked {
        println!("{} file_search was used", "✓".green());
    } else {
        println!("{} file_search was NOT used for this query", "⚠".yellow());
    }

    QueryOutcome {
        query,
        result: Ok(AnswerStats::from(&answer)),
    }
}

fn analyze(outcomes: &[QueryOutcome]) -> Analysis {
    let stats: Vec<&AnswerStats> = outcomes.iter().filter_map(|o| o.result.as_ref().ok()).collect();

    let average_chars = (!stats.is_empty()).then(|| {
        stats.iter().map(|s| s.response_chars).sum::<usize>() as f64 / stats.len() as f64
    });

    Analysis {
        total: outcomes.len(),
        successful: stats.len(),
        average_chars,
        file_search_used: stats.iter().filter(|s| s.file_search_used).count(),
        with_citations: stats.iter().filter(|s| s.citations > 0).count(),
    }
}

fn print_analysis(analysis: &Analysis, outcomes: &[QueryOutcome]) {
    print_heading("Retrieval analysis");

    if analysis.total == 0 {
        println!("{}", "No queries were run.".yellow());
        return;
    }

    println!("  Successful queries:    {}/{}", analysis.successful, analysis.total);
    if let Some(average) = analysis.average_chars {
        println!("  Avg response length:   {:.0} chars", average);
        println!(
            "  file_search used:      {}/{}",
            analysis.file_search_used, analysis.successful
        );
        println!(
            "  Queries with citations: {}/{}",
            analysis.with_citations, analysis.successful
        );
    }

    for outcome in outcomes {
        if let Err(reason) = &outcome.result {
            println!("  {} {}: {}", "✗".red(), outcome.query, reason.dimmed());
        }
    }
}
