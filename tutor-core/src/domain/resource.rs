//! Remote resource handles

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A remote, cost-bearing artifact owned by the invoking session
///
/// Handles are created as a side effect of running the labs (uploaded files,
/// vector stores, threads) and must eventually be released or left to expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub kind: ResourceKind,
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Display name (file name, vector store name)
    pub label: Option<String>,
}

/// Kinds of remote resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    File,
    VectorStore,
    Thread,
    Assistant,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::File => "file",
            Self::VectorStore => "vector store",
            Self::Thread => "thread",
            Self::Assistant => "assistant",
        };
        f.write_str(name)
    }
}

impl ResourceHandle {
    pub fn new(kind: ResourceKind, id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            id: id.into(),
            created_at,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Age of the resource relative to `now`
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }

    /// Age in fractional hours, for display
    pub fn age_hours_at(&self, now: DateTime<Utc>) -> f64 {
        self.age_at(now).num_seconds() as f64 / 3600.0
    }

    /// Whether the resource is strictly older than `max_age_hours`
    pub fn is_older_than(&self, max_age_hours: u64, now: DateTime<Utc>) -> bool {
        let max_age_hours = i64::try_from(max_age_hours).unwrap_or(i64::MAX);
        self.age_at(now) > Duration::try_hours(max_age_hours).unwrap_or(Duration::MAX)
    }
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} {} ({})", self.kind, self.id, label),
            None => write!(f, "{} {}", self.kind, self.id),
        }
    }
}

/// Outcome of releasing a batch of handles
#[derive(Debug, Clone, Default)]
pub struct ReleaseReport {
    pub deleted: Vec<ResourceHandle>,
    pub failed: Vec<ReleaseFailure>,
}

/// A handle that could not be released
#[derive(Debug, Clone)]
pub struct ReleaseFailure {
    pub handle: ResourceHandle,
    pub reason: String,
}

impl ReleaseReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
