//! Configuration module
//!
//! Resolved CLI settings shared by every command.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use tutor_client::{ClientConfig, PollPolicy};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection settings for the assistants service
    pub client: ClientConfig,

    /// File holding the assistant id
    pub session_file: PathBuf,

    /// How to wait for runs and vector stores
    pub poll: PollPolicy,
}

impl Config {
    /// Builds and validates the configuration
    pub fn new(client: ClientConfig, session_file: PathBuf, poll: PollPolicy) -> Result<Self> {
        let config = Self {
            client,
            session_file,
            poll,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.client.validate()?;
        self.poll.validate().map_err(|e| anyhow!(e))?;

        if self.session_file.as_os_str().is_empty() {
            anyhow::bail!("session file path cannot be empty");
        }

        Ok(())
    }
}
