//! Result extraction
//!
//! Turns a completed job's execution trace into a validated JSON value:
//! locate the raw payload, strip any code fence, parse, then validate against
//! the job's schema contract. Failures are returned as [`JobFailure`] values,
//! never raised past this boundary.

use serde_json::Value as JsonValue;

use crate::domain::job::{Job, JobStatus, SubmissionMode};
use crate::domain::schema::{SchemaContract, Strictness};
use crate::domain::trace::ExecutionTrace;
use crate::failure::JobFailure;
use crate::fence::{self, Fenced};

/// Fails unless the job reached the completed state
pub fn ensure_completed(job: &Job) -> Result<(), JobFailure> {
    if job.status == JobStatus::Completed {
        return Ok(());
    }

    Err(JobFailure::NotCompleted {
        job_id: job.id.clone(),
        status: job.status,
        timed_out: !job.status.is_terminal(),
        detail: job.error.clone(),
    })
}

/// Finds the raw result text for a job
///
/// Inline-format and retrieval jobs answer with the latest assistant message;
/// tool-call jobs answer with the arguments of the matching function call.
pub fn locate_payload(job: &Job, trace: &ExecutionTrace) -> Result<String, JobFailure> {
    match &job.submission.mode {
        SubmissionMode::ToolCall { capability } => trace
            .function_arguments(capability)
            .map(str::to_string)
            .ok_or_else(|| JobFailure::CapabilityNotInvoked {
                job_id: job.id.clone(),
                capability: capability.clone(),
            }),
        SubmissionMode::InlineFormat | SubmissionMode::Retrieval => trace
            .latest_assistant_message()
            .filter(|message| !message.is_empty())
            .map(|message| message.text())
            .ok_or_else(|| JobFailure::NoContent {
                job_id: job.id.clone(),
            }),
    }
}

/// Parses raw result text and validates it against `schema`
///
/// On success the parsed value is returned unchanged.
pub fn parse_and_validate(
    raw: &str,
    schema: &SchemaContract,
    strictness: Strictness,
) -> Result<JsonValue, JobFailure> {
    let fenced = fence::parse(raw);
    let value: JsonValue =
        serde_json::from_str(fenced.body).map_err(|e| JobFailure::InvalidJson {
            raw: raw.to_string(),
            message: describe_parse_error(&e, &fenced),
        })?;

    match schema.validate(&value, strictness) {
        Ok(()) => Ok(value),
        Err(violations) => Err(JobFailure::SchemaMismatch {
            schema: schema.name.clone(),
            value,
            violations,
        }),
    }
}

/// Parser message plus hints from the fence around the payload
fn describe_parse_error(err: &serde_json::Error, fenced: &Fenced<'_>) -> String {
    let mut message = err.to_string();
    if fenced.opened && !fenced.closed {
        message.push_str(" (code fence was not closed)");
    }
    if let Some(language) = fenced.language.filter(|tag| !tag.eq_ignore_ascii_case("json")) {
        message.push_str(&format!(" (fenced as {})", language));
    }
    message
}

/// Full extraction pipeline for a job and its trace
pub fn extract_and_validate(
    job: &Job,
    trace: &ExecutionTrace,
    schema: &SchemaContract,
    strictness: Strictness,
) -> Result<JsonValue, JobFailure> {
    ensure_completed(job)?;
    let raw = locate_payload(job, trace)?;
    parse_and_validate(&raw, schema, strictness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::{JobError, Submission};
    use crate::domain::schema::{FieldSpec, FieldType, Violation};
    use crate::domain::trace::{Role, TextSegment, ToolInvocation, TraceMessage, TraceStep};
    use crate::failure::FailureClass;
    use serde_json::json;

    fn contract() -> SchemaContract {
        SchemaContract::new("LectureSummary", "summarize_lecture_topic", "Summarizes a topic")
            .field(FieldSpec::required("topic", FieldType::String, "Topic"))
            .field(FieldSpec::required("explanation", FieldType::String, "Explanation"))
            .field(FieldSpec::required("examples", FieldType::StringList, "Examples"))
            .field(FieldSpec::required("key_points", FieldType::StringList, "Key points"))
            .field(FieldSpec::optional("difficulty", FieldType::String, "Difficulty"))
    }

    fn job(mode: SubmissionMode, status: JobStatus) -> Job {
        Job::new(
            "run_1",
            "thread_1",
            Submission {
                prompt: "Summarize".to_string(),
                instructions: None,
                mode,
                tools: Vec::new(),
            },
            status,
        )
    }

    fn text_trace(text: &str) -> ExecutionTrace {
        ExecutionTrace {
            messages: vec![
                TraceMessage {
                    id: "msg_user".to_string(),
                    role: Role::User,
                    segments: vec![TextSegment {
                        text: "Summarize".to_string(),
                        annotations: Vec::new(),
                    }],
                },
                TraceMessage {
                    id: "msg_assistant".to_string(),
                    role: Role::Assistant,
                    segments: vec![TextSegment {
                        text: text.to_string(),
                        annotations: Vec::new(),
                    }],
                },
            ],
            steps: Vec::new(),
        }
    }

    fn tool_trace(name: &str, arguments: &str) -> ExecutionTrace {
        ExecutionTrace {
            messages: Vec::new(),
            steps: vec![TraceStep::ToolCalls {
                calls: vec![ToolInvocation::Function {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                }],
            }],
        }
    }

    #[test]
    fn test_inline_fenced_payload_validates() {
        let trace = text_trace(
            "```json\n{\"topic\":\"X\",\"explanation\":\"Y\",\"examples\":[],\"key_points\":[]}\n```",
        );
        let job = job(SubmissionMode::InlineFormat, JobStatus::Completed);

        let value = extract_and_validate(&job, &trace, &contract(), Strictness::Strict).unwrap();
        assert_eq!(
            value,
            json!({"topic": "X", "explanation": "Y", "examples": [], "key_points": []})
        );
    }

    #[test]
    fn test_valid_payload_round_trips() {
        let samples = [
            json!({"topic": "Recursion", "explanation": "Calls itself", "examples": ["factorial"], "key_points": ["base case"]}),
            json!({"topic": "DP", "explanation": "Memoize", "examples": [], "key_points": [], "difficulty": "Advanced"}),
            json!({"topic": "KMP", "explanation": "Prefix table", "examples": ["search"], "key_points": ["O(n+m)"], "difficulty": null}),
        ];

        for expected in samples {
            let raw = serde_json::to_string(&expected).unwrap();
            let value = parse_and_validate(&raw, &contract(), Strictness::Strict).unwrap();
            assert_eq!(value, expected);
        }
    }

    #[test]
    fn test_tool_call_arguments_are_extracted() {
        let trace = tool_trace(
            "summarize_lecture_topic",
            "{\"topic\":\"DP\",\"explanation\":\"E\",\"examples\":[\"fib\"],\"key_points\":[\"overlap\"],\"difficulty\":null}",
        );
        let job = job(
            SubmissionMode::ToolCall {
                capability: "summarize_lecture_topic".to_string(),
            },
            JobStatus::Completed,
        );

        let value = extract_and_validate(&job, &trace, &contract(), Strictness::Strict).unwrap();
        assert_eq!(value["topic"], "DP");
        assert!(value["difficulty"].is_null());
    }

    #[test]
    fn test_capability_not_invoked_is_distinct_from_parse_failure() {
        let trace = tool_trace("some_other_function", "not json at all");
        let job = job(
            SubmissionMode::ToolCall {
                capability: "summarize_lecture_topic".to_string(),
            },
            JobStatus::Completed,
        );

        let err = extract_and_validate(&job, &trace, &contract(), Strictness::Strict).unwrap_err();
        assert!(matches!(
            err,
            JobFailure::CapabilityNotInvoked { ref capability, .. } if capability == "summarize_lecture_topic"
        ));
        assert_eq!(err.class(), FailureClass::ServiceError);
    }

    #[test]
    fn test_parse_failure_keeps_raw_text() {
        let trace = text_trace("Sure! Here is your summary: topic = X");
        let job = job(SubmissionMode::InlineFormat, JobStatus::Completed);

        let err = extract_and_validate(&job, &trace, &contract(), Strictness::Strict).unwrap_err();
        assert_eq!(err.class(), FailureClass::InvalidJson);
        assert_eq!(err.raw_text(), Some("Sure! Here is your summary: topic = X"));
    }

    #[test]
    fn test_parse_failure_mentions_fence_problems() {
        let err = parse_and_validate("```json\n{\"topic\": \"X\"", &contract(), Strictness::Strict)
            .unwrap_err();
        let JobFailure::InvalidJson { message, .. } = err else {
            panic!("expected invalid JSON");
        };
        assert!(message.contains("code fence was not closed"), "{}", message);

        let err = parse_and_validate("```yaml\ntopic: X\n```", &contract(), Strictness::Strict)
            .unwrap_err();
        let JobFailure::InvalidJson { message, .. } = err else {
            panic!("expected invalid JSON");
        };
        assert!(message.contains("fenced as yaml"), "{}", message);
        assert!(!message.contains("not closed"));
    }

    #[test]
    fn test_schema_mismatch_keeps_partial_value() {
        let trace = text_trace("{\"topic\":\"X\",\"examples\":[]}");
        let job = job(SubmissionMode::InlineFormat, JobStatus::Completed);

        let err = extract_and_validate(&job, &trace, &contract(), Strictness::Strict).unwrap_err();
        assert_eq!(err.class(), FailureClass::SchemaMismatch);
        assert_eq!(err.partial_value(), Some(&json!({"topic": "X", "examples": []})));

        let JobFailure::SchemaMismatch { violations, .. } = err else {
            panic!("expected schema mismatch");
        };
        assert_eq!(
            violations,
            vec![
                Violation::MissingField {
                    field: "explanation".to_string()
                },
                Violation::MissingField {
                    field: "key_points".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_missing_assistant_text_is_no_content() {
        let mut trace = text_trace("");
        let job = job(SubmissionMode::InlineFormat, JobStatus::Completed);

        let err = extract_and_validate(&job, &trace, &contract(), Strictness::Strict).unwrap_err();
        assert!(matches!(err, JobFailure::NoContent { .. }));

        trace.messages.truncate(1);
        let err = extract_and_validate(&job, &trace, &contract(), Strictness::Strict).unwrap_err();
        assert!(matches!(err, JobFailure::NoContent { .. }));
    }

    #[test]
    fn test_failed_job_is_not_completed() {
        let mut job = job(SubmissionMode::InlineFormat, JobStatus::Running);
        job.observe(
            JobStatus::Failed,
            Some(JobError {
                code: Some("server_error".to_string()),
                message: "Something went wrong".to_string(),
            }),
        );

        let err = ensure_completed(&job).unwrap_err();
        match err {
            JobFailure::NotCompleted {
                status,
                timed_out,
                detail,
                ..
            } => {
                assert_eq!(status, JobStatus::Failed);
                assert!(!timed_out);
                assert_eq!(detail.unwrap().message, "Something went wrong");
            }
            other => panic!("unexpected failure: {:?}", other),
        }
    }

    #[test]
    fn test_running_job_reads_as_timed_out() {
        let job = job(SubmissionMode::InlineFormat, JobStatus::Running);
        let err = ensure_completed(&job).unwrap_err();
        assert!(matches!(err, JobFailure::NotCompleted { timed_out: true, .. }));
    }
}
