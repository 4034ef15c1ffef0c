//! Execution traces
//!
//! What the service recorded while running a job: the conversation's messages
//! and the run's steps. Extraction works on a trace rather than on the
//! service directly so it can be exercised without a network.

use serde::{Deserialize, Serialize};

use crate::domain::annotation::RetrievalAnnotation;

/// Messages and run steps observed for a job
///
/// Messages are kept in chronological order (oldest first).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionTrace {
    pub messages: Vec<TraceMessage>,
    pub steps: Vec<TraceStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceMessage {
    pub id: String,
    pub role: Role,
    pub segments: Vec<TextSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One text content block of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    pub annotations: Vec<RetrievalAnnotation>,
}

/// A step the service took while running the job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceStep {
    MessageCreation { message_id: String },
    ToolCalls { calls: Vec<ToolInvocation> },
}

/// A tool the service invoked during a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolInvocation {
    Function { name: String, arguments: String },
    FileSearch,
    CodeInterpreter,
    Other { kind: String },
}

impl TraceMessage {
    /// Text of every segment, concatenated in order
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn annotations(&self) -> impl Iterator<Item = &RetrievalAnnotation> {
        self.segments.iter().flat_map(|s| s.annotations.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.text.is_empty())
    }
}

impl ExecutionTrace {
    /// The most recent message written by the assistant
    pub fn latest_assistant_message(&self) -> Option<&TraceMessage> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// Every tool invocation across all steps, in step order
    pub fn invocations(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.steps.iter().flat_map(|step| match step {
            TraceStep::ToolCalls { calls } => calls.as_slice(),
            TraceStep::MessageCreation { .. } => &[][..],
        })
    }

    /// Arguments of the first invocation of the named function
    pub fn function_arguments(&self, name: &str) -> Option<&str> {
        self.invocations().find_map(|call| match call {
            ToolInvocation::Function {
                name: called,
                arguments,
            } if called == name => Some(arguments.as_str()),
            _ => None,
        })
    }

    /// Whether the retrieval capability actually ran
    pub fn used_file_search(&self) -> bool {
        self.invocations()
            .any(|call| matches!(call, ToolInvocation::FileSearch))
    }
}
