//! Failure taxonomy
//!
//! Every way a job can fail to produce a validated result, for both
//! structured-output modes and retrieval. Each failure belongs to one of four
//! user-visible classes (see [`FailureClass`]).

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::domain::job::{JobError, JobStatus};
use crate::domain::schema::Violation;

/// Why a job did not yield a validated result
#[derive(Debug, Error)]
pub enum JobFailure {
    /// The service could not be reached at all
    #[error("could not reach the service: {0}")]
    Unreachable(String),

    /// The service answered a request with an error
    #[error("service returned an error{}: {message}", status.map(|s| format!(" (status {})", s)).unwrap_or_default())]
    Service { status: Option<u16>, message: String },

    /// Local configuration is missing or invalid
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The job ended without completing, or was still running at the deadline
    #[error("job {job_id} did not complete: {}", describe_outcome(*status, *timed_out, detail.as_ref()))]
    NotCompleted {
        job_id: String,
        status: JobStatus,
        timed_out: bool,
        detail: Option<JobError>,
    },

    /// The job completed but produced no assistant text
    #[error("job {job_id} produced no content")]
    NoContent { job_id: String },

    /// The expected capability was never invoked
    #[error("capability '{capability}' was not invoked by job {job_id}")]
    CapabilityNotInvoked { job_id: String, capability: String },

    /// The payload is not valid JSON
    #[error("result was not valid JSON: {message}")]
    InvalidJson { raw: String, message: String },

    /// The payload parsed but does not match the schema
    #[error("result did not match schema '{schema}': {}", join_violations(violations))]
    SchemaMismatch {
        schema: String,
        value: JsonValue,
        violations: Vec<Violation>,
    },
}

/// The four failure classes a user must be able to tell apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Unreachable,
    ServiceError,
    InvalidJson,
    SchemaMismatch,
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Unreachable => "could not reach the service",
            Self::ServiceError => "service returned an error",
            Self::InvalidJson => "result was not valid JSON",
            Self::SchemaMismatch => "result did not match expected schema",
        };
        f.write_str(label)
    }
}

impl JobFailure {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Unreachable(_) => FailureClass::Unreachable,
            Self::Service { .. }
            | Self::Configuration(_)
            | Self::NotCompleted { .. }
            | Self::NoContent { .. }
            | Self::CapabilityNotInvoked { .. } => FailureClass::ServiceError,
            Self::InvalidJson { .. } => FailureClass::InvalidJson,
            Self::SchemaMismatch { .. } => FailureClass::SchemaMismatch,
        }
    }

    /// Parsed data retained by a schema mismatch, for partial inspection
    pub fn partial_value(&self) -> Option<&JsonValue> {
        match self {
            Self::SchemaMismatch { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Unparseable text retained by a JSON failure
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::InvalidJson { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

fn describe_outcome(status: JobStatus, timed_out: bool, detail: Option<&JobError>) -> String {
    let mut out = if timed_out {
        format!("timed out while {}", status)
    } else {
        format!("status {}", status)
    };
    if let Some(detail) = detail {
        out.push_str(&format!(" ({})", detail));
    }
    out
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
