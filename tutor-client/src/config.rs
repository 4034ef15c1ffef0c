//! Client configuration
//!
//! Connection settings for the assistants service, read from the
//! environment the same way the lab scripts expect them.

use std::time::Duration;

use crate::error::{ClientError, Result};

/// Default endpoint of the hosted service
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings for [`crate::AssistantsClient`]
#[derive(Clone)]
pub struct ClientConfig {
    /// Bearer token sent with every request
    pub api_key: String,

    /// Optional organization header
    pub organization: Option<String>,

    /// Base URL including the API version segment
    pub base_url: String,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration with defaults for everything but the key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            organization: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - OPENAI_API_KEY (required)
    /// - OPENAI_ORG (optional)
    /// - TUTOR_BASE_URL (optional, default: https://api.openai.com/v1)
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ClientError::Configuration("OPENAI_API_KEY environment variable not set".to_string())
            })?;

        let mut config = Self::new(api_key);

        if let Some(org) = std::env::var("OPENAI_ORG").ok().filter(|o| !o.is_empty()) {
            config.organization = Some(org);
        }

        if let Ok(base_url) = std::env::var("TUTOR_BASE_URL") {
            config.base_url = base_url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::Configuration(
                "api_key cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::Configuration(
                "base_url must start with http:// or https://".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ClientError::Configuration(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("organization", &self.organization)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
