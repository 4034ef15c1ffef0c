//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::resource::{ResourceHandle, ResourceKind};

/// A unit of work submitted to the remote service and tracked to completion
///
/// The identifier is the remote run id; `thread_id` names the conversation the
/// run belongs to. Status only ever moves forward (see [`Job::observe`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub thread_id: String,
    pub submission: Submission,
    pub status: JobStatus,
    pub error: Option<JobError>,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(
        id: impl Into<String>,
        thread_id: impl Into<String>,
        submission: Submission,
        status: JobStatus,
    ) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            submission,
            status,
            error: None,
            submitted_at: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Handle of the conversation the job ran in, for later release
    pub fn thread_handle(&self) -> ResourceHandle {
        ResourceHandle::new(ResourceKind::Thread, &self.thread_id, self.submitted_at)
    }

    /// Applies a status observed from the service
    ///
    /// Observations that would move the job backwards, or change it after it
    /// reached a terminal state, are ignored. Returns whether the status changed.
    pub fn observe(&mut self, status: JobStatus, error: Option<JobError>) -> bool {
        if !self.status.can_advance_to(status) {
            return false;
        }

        self.status = status;
        if error.is_some() {
            self.error = error;
        }
        true
    }

    /// Name of the capability whose invocation carries this job's result
    pub fn capability(&self) -> Option<&str> {
        match &self.submission.mode {
            SubmissionMode::ToolCall { capability } => Some(capability),
            _ => None,
        }
    }
}

/// Job status as seen by this toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Completed | Self::Failed | Self::Cancelled => 2,
        }
    }

    /// Whether moving from `self` to `next` is a forward transition
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error detail reported by the service for a failed job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    pub code: Option<String>,
    pub message: String,
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

/// What was sent to the service for a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub prompt: String,
    pub instructions: Option<String>,
    pub mode: SubmissionMode,
    /// Tools declared for this run only
    pub tools: Vec<ToolDeclaration>,
}

/// How a job's result is expected to come back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum SubmissionMode {
    /// Freeform assistant text that should itself be JSON
    InlineFormat,
    /// Arguments of an invoked function tool
    ToolCall { capability: String },
    /// Grounded answer with citations
    Retrieval,
}

/// Structured-output strategy requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredMode {
    InlineFormat,
    ToolCall,
}

impl std::fmt::Display for StructuredMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InlineFormat => f.write_str("inline-format"),
            Self::ToolCall => f.write_str("tool-call"),
        }
    }
}

/// A tool the service may invoke during a run
///
/// Serializes in the service's tool declaration format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDeclaration {
    FileSearch,
    Function { function: FunctionDefinition },
}

/// Declaration of an invokable function and its parameter schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub strict: bool,
    pub parameters: JsonValue,
}
