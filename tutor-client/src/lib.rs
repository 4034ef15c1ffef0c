//! Tutor HTTP Client
//!
//! A type-safe client for the hosted assistants service (threads, runs,
//! files, vector stores) plus [`AsyncJobClient`], which turns an
//! asynchronous remote run into a locally validated result.
//!
//! The raw endpoints live on [`AssistantsClient`]. The polling and
//! extraction workflow only depends on the [`JobBackend`] trait, so it can be
//! driven by an in-memory backend in tests.
//!
//! # Example
//!
//! ```no_run
//! use tutor_client::{AssistantsClient, ClientConfig};
//! use tutor_core::dto::ListOrder;
//!
//! #[tokio::main]
//! async fn main() -> tutor_client::Result<()> {
//!     let client = AssistantsClient::new(ClientConfig::from_env()?)?;
//!
//!     let messages = client.list_messages("thread_abc123", ListOrder::Asc, 20).await?;
//!     println!("{} message(s)", messages.data.len());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod job_client;
pub mod poller;

mod assistants;
mod files;
mod messages;
mod runs;
mod threads;
mod vector_stores;

// Re-export commonly used types
pub use backend::JobBackend;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use job_client::{AsyncJobClient, Completion, RetrievalAnswer};
pub use poller::PollPolicy;

use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Header selecting the assistants API version
const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// HTTP client for the assistants service
///
/// Every request carries bearer authentication, the optional organization
/// header and the assistants version header. Endpoints are grouped by
/// resource:
/// - Threads and messages
/// - Runs and run steps
/// - Files
/// - Vector stores
/// - Assistants
#[derive(Debug, Clone)]
pub struct AssistantsClient {
    /// Base URL of the service (e.g., "https://api.openai.com/v1")
    base_url: String,
    api_key: String,
    organization: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl AssistantsClient {
    /// Create a new client from validated configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self::with_client(config, client))
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc.
    pub fn with_client(config: ClientConfig, client: Client) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            organization: config.organization,
            client,
        }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request to `path` with the common headers applied
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self
            .client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER.0, BETA_HEADER.1);

        match &self.organization {
            Some(org) => builder.header("OpenAI-Organization", org),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Error bodies in the service's `{"error": {"message": ...}}` shape are
    /// reduced to their message; anything else is passed through verbatim.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(
                status.as_u16(),
                error_message(&error_text),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string())
}
