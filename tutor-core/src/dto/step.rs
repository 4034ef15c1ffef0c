//! Run step DTOs

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::trace::{ToolInvocation, TraceStep};

/// One step the service took while executing a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStep {
    pub id: String,
    pub run_id: String,
    pub status: String,
    pub step_details: StepDetails,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepDetails {
    MessageCreation { message_creation: MessageCreation },
    ToolCalls { tool_calls: Vec<ToolCall> },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreation {
    pub message_id: String,
}

/// A tool call recorded in a step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolCall {
    Function {
        id: String,
        function: FunctionCall,
    },
    FileSearch {
        id: String,
        #[serde(default)]
        file_search: JsonValue,
    },
    CodeInterpreter {
        id: String,
        #[serde(default)]
        code_interpreter: JsonValue,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
    pub output: Option<String>,
}

impl From<ToolCall> for ToolInvocation {
    fn from(call: ToolCall) -> Self {
        match call {
            ToolCall::Function { function, .. } => ToolInvocation::Function {
                name: function.name,
                arguments: function.arguments,
            },
            ToolCall::FileSearch { .. } => ToolInvocation::FileSearch,
            ToolCall::CodeInterpreter { .. } => ToolInvocation::CodeInterpreter,
            ToolCall::Unknown => ToolInvocation::Other {
                kind: "unknown".to_string(),
            },
        }
    }
}

impl RunStep {
    /// Converts into a trace step; steps of unknown type are dropped
    pub fn into_trace_step(self) -> Option<TraceStep> {
        match self.step_details {
            StepDetails::MessageCreation { message_creation } => Some(TraceStep::MessageCreation {
                message_id: message_creation.message_id,
            }),
            StepDetails::ToolCalls { tool_calls } => Some(TraceStep::ToolCalls {
                calls: tool_calls.into_iter().map(Into::into).collect(),
            }),
            StepDetails::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_call_step_decodes() {
        let step: RunStep = serde_json::from_value(serde_json::json!({
            "id": "step_abc123",
            "object": "thread.run.step",
            "created_at": 1699063291,
            "run_id": "run_abc123",
            "assistant_id": "asst_abc123",
            "thread_id": "thread_abc123",
            "type": "tool_calls",
            "status": "completed",
            "step_details": {
                "type": "tool_calls",
                "tool_calls": [
                    {"id": "call_1", "type": "file_search", "file_search": {}},
                    {
                        "id": "call_2",
                        "type": "function",
                        "function": {
                            "name": "summarize_lecture_topic",
                            "arguments": "{\"topic\":\"DP\"}",
                            "output": null
                        }
                    }
                ]
            }
        }))
        .unwrap();

        let Some(TraceStep::ToolCalls { calls }) = step.into_trace_step() else {
            panic!("expected tool calls");
        };
        assert_eq!(calls[0], ToolInvocation::FileSearch);
        assert_eq!(
            calls[1],
            ToolInvocation::Function {
                name: "summarize_lecture_topic".to_string(),
                arguments: "{\"topic\":\"DP\"}".to_string(),
            }
        );
    }

    #[test]
    fn test_message_creation_step_decodes() {
        let step: RunStep = serde_json::from_value(serde_json::json!({
            "id": "step_1",
            "run_id": "run_1",
            "type": "message_creation",
            "status": "completed",
            "created_at": 1699063291,
            "step_details": {
                "type": "message_creation",
                "message_creation": {"message_id": "msg_1"}
            }
        }))
        .unwrap();

        assert!(matches!(
            step.into_trace_step(),
            Some(TraceStep::MessageCreation { message_id }) if message_id == "msg_1"
        ));
    }

    #[test]
    fn test_unknown_tool_call_type() {
        let call: ToolCall =
            serde_json::from_value(serde_json::json!({"id": "call_9", "type": "web_search"}))
                .unwrap();
        assert!(matches!(call, ToolCall::Unknown));
    }
}
