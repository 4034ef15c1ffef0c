//! Tutor CLI
//!
//! Command-line labs for a hosted study assistant: structured output,
//! retrieval over uploaded documents, and cleanup of remote resources.

mod commands;
mod config;
mod lecture;
mod session;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser};
use commands::{Commands, handle_command};
use config::Config;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tutor_client::config::{ClientConfig, DEFAULT_BASE_URL};
use tutor_client::PollPolicy;

/// Exit status after Ctrl-C (128 + SIGINT)
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(name = "tutor")]
#[command(about = "Structured-output and retrieval labs for a hosted study assistant", long_about = None)]
struct Cli {
    /// API key for the assistants service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Organization sent with every request
    #[arg(long, env = "OPENAI_ORG")]
    organization: Option<String>,

    /// Service base URL
    #[arg(long, env = "TUTOR_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// File holding the assistant id
    #[arg(long, default_value = ".assistant")]
    session_file: PathBuf,

    #[command(flatten)]
    poll: PollArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Polling behaviour while waiting for runs and vector stores
#[derive(Args)]
struct PollArgs {
    /// Initial delay between status checks, in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Upper bound for the delay between status checks, in milliseconds
    #[arg(long, default_value_t = 8000)]
    max_poll_interval_ms: u64,

    /// Factor the delay grows by after each check (1 = fixed interval)
    #[arg(long, default_value_t = 2)]
    backoff: u32,

    /// Give up waiting after this many seconds
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,
}

impl PollArgs {
    fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_interval: Duration::from_millis(self.max_poll_interval_ms),
            multiplier: self.backoff,
            max_wait: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Values from .env act as environment variables for the flags below
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutor=info,tutor_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let api_key = cli
        .api_key
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY not found in the environment or .env"))?;

    let mut client = ClientConfig::new(api_key).with_base_url(cli.base_url);
    client.organization = cli.organization.filter(|org| !org.is_empty());

    let config = Config::new(client, cli.session_file, cli.poll.policy())?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupted, cancelling pending work (press Ctrl-C again to exit)");
        trigger.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted again, exiting");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });

    let result = handle_command(cli.command, &config, &cancel).await;

    // An abandoned terminal read would keep the runtime from shutting down
    if cancel.is_cancelled() {
        if let Err(e) = &result {
            eprintln!("Error: {:?}", e);
        }
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }

    result
}
