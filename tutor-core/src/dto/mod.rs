//! Data Transfer Objects for the remote assistants service
//!
//! Wire representations of the service's JSON payloads, plus conversions into
//! the domain types in [`crate::domain`]. Unknown enum tags decode into an
//! `Unknown`/`Other` variant so new service features do not break decoding.

pub mod assistant;
pub mod file;
pub mod message;
pub mod run;
pub mod step;
pub mod thread;
pub mod vector_store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Paginated list envelope used by every list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    pub first_id: Option<String>,
    pub last_id: Option<String>,
}

/// Response of every delete endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionStatus {
    pub id: String,
    pub deleted: bool,
}

/// Sort order for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOrder {
    Asc,
    Desc,
}

impl ListOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Converts a unix timestamp (seconds) from the service
pub(crate) fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
