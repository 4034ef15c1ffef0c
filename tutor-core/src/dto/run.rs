//! Run DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::{JobError, JobStatus, ToolDeclaration};

/// A run of an assistant over a thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub assistant_id: String,
    pub status: RunStatus,
    pub last_error: Option<RunError>,
    pub created_at: i64,
}

/// Run status as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl From<RunStatus> for JobStatus {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Queued => JobStatus::Pending,
            RunStatus::InProgress | RunStatus::Cancelling | RunStatus::Unknown => {
                JobStatus::Running
            }
            // The run paused to hand us the function call: that call is the result.
            RunStatus::RequiresAction | RunStatus::Completed => JobStatus::Completed,
            RunStatus::Failed | RunStatus::Incomplete | RunStatus::Expired => JobStatus::Failed,
            RunStatus::Cancelled => JobStatus::Cancelled,
        }
    }
}

/// Error detail attached to a failed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    pub code: Option<String>,
    pub message: String,
}

impl From<RunError> for JobError {
    fn from(err: RunError) -> Self {
        JobError {
            code: err.code,
            message: err.message,
        }
    }
}

impl Run {
    pub fn job_status(&self) -> JobStatus {
        self.status.into()
    }

    pub fn job_error(&self) -> Option<JobError> {
        self.last_error.clone().map(Into::into)
    }

    /// Whether the run is paused waiting for tool outputs
    pub fn awaits_tool_output(&self) -> bool {
        self.status == RunStatus::RequiresAction
    }
}

/// Request to start a run
///
/// `tools` overrides the assistant's tool set for this run only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRun {
    pub assistant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDeclaration>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// Output format requested for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    JsonObject,
}
