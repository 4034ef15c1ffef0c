//! Asynchronous job workflow
//!
//! [`AsyncJobClient`] submits prompts as remote runs, waits for them with a
//! cancellable backoff, and turns the finished run into a validated JSON
//! value or a [`JobFailure`]. It also resolves retrieval queries against
//! vector stores and releases the remote resources a session created.
//!
//! Capability changes are passed as per-run tool overrides, so the shared
//! assistant is never modified.

use std::sync::{Mutex, PoisonError};

use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tutor_core::domain::annotation::RetrievalAnnotation;
use tutor_core::domain::job::{
    Job, JobStatus, StructuredMode, Submission, SubmissionMode, ToolDeclaration,
};
use tutor_core::domain::resource::{ReleaseFailure, ReleaseReport, ResourceHandle, ResourceKind};
use tutor_core::domain::schema::{SchemaContract, Strictness};
use tutor_core::domain::trace::{ExecutionTrace, TraceMessage};
use tutor_core::dto::run::{CreateRun, ResponseFormat};
use tutor_core::dto::thread::{CreateThread, NewMessage, ToolResources};
use tutor_core::extract;
use tutor_core::failure::JobFailure;

use crate::backend::JobBackend;
use crate::poller::{self, PollPolicy, Wait};

/// How a wait for a job ended
#[derive(Debug, Clone)]
pub enum Completion {
    /// The job reached a terminal status
    Settled(Job),
    /// The deadline passed; the job keeps its last non-terminal status
    TimedOut(Job),
}

impl Completion {
    pub fn job(&self) -> &Job {
        match self {
            Self::Settled(job) | Self::TimedOut(job) => job,
        }
    }

    pub fn into_job(self) -> Job {
        match self {
            Self::Settled(job) | Self::TimedOut(job) => job,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }
}

/// A grounded answer to a retrieval query
#[derive(Debug, Clone)]
pub struct RetrievalAnswer {
    pub job: Job,
    /// Text of every segment of the assistant's reply, concatenated
    pub text: String,
    pub annotations: Vec<RetrievalAnnotation>,
    /// Whether a file-search call appears in the run steps
    pub retrieval_invoked: bool,
}

/// Drives remote runs of one assistant to validated results
pub struct AsyncJobClient<B: JobBackend> {
    backend: B,
    assistant_id: String,
    /// Prepended to the instructions of every run
    persona: Option<String>,
}

impl<B: JobBackend> AsyncJobClient<B> {
    pub fn new(backend: B, assistant_id: impl Into<String>) -> Self {
        Self {
            backend,
            assistant_id: assistant_id.into(),
            persona: None,
        }
    }

    /// Sets a persona line prepended to every run's instructions
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    fn instructions(&self, task: &str) -> String {
        match &self.persona {
            Some(persona) => format!("{} {}", persona, task),
            None => task.to_string(),
        }
    }

    // =============================================================================
    // Submission
    // =============================================================================

    /// Submits a prompt whose result should match `schema`
    ///
    /// Inline-format asks for a JSON object by instruction only. Tool-call
    /// declares the schema as a strict function for this run, next to the
    /// file-search tool so the run keeps its retrieval capability.
    pub async fn submit_structured(
        &self,
        prompt: &str,
        schema: &SchemaContract,
        mode: StructuredMode,
    ) -> Result<Job, JobFailure> {
        let submission = match mode {
            StructuredMode::InlineFormat => Submission {
                prompt: format!(
                    "{}\n\nRespond with a JSON object with the following fields: {}.",
                    prompt,
                    schema.field_summary()
                ),
                instructions: Some(self.instructions(&format!(
                    "Respond with valid JSON matching the requested {} structure. Populate all requested fields accurately.",
                    schema.name
                ))),
                mode: SubmissionMode::InlineFormat,
                tools: Vec::new(),
            },
            StructuredMode::ToolCall => Submission {
                prompt: format!(
                    "{}\n\nUse the {} function to provide the result.",
                    prompt, schema.capability
                ),
                instructions: Some(self.instructions(&format!(
                    "Use the {} function to provide a structured result for the request.",
                    schema.capability
                ))),
                mode: SubmissionMode::ToolCall {
                    capability: schema.capability.clone(),
                },
                tools: vec![ToolDeclaration::FileSearch, schema.function_tool()],
            },
        };

        let response_format = match mode {
            StructuredMode::InlineFormat => Some(ResponseFormat::JsonObject),
            StructuredMode::ToolCall => None,
        };

        let job = self.submit(submission, None, response_format).await?;
        info!("Submitted {} job {} for {}", mode, job.id, schema.name);
        Ok(job)
    }

    async fn submit(
        &self,
        submission: Submission,
        tool_resources: Option<ToolResources>,
        response_format: Option<ResponseFormat>,
    ) -> Result<Job, JobFailure> {
        let thread = self
            .backend
            .create_thread(CreateThread {
                messages: vec![NewMessage::user(submission.prompt.clone())],
                tool_resources,
            })
            .await?;
        debug!("Created thread {}", thread.id);

        let run = self
            .backend
            .create_run(
                &thread.id,
                CreateRun {
                    assistant_id: self.assistant_id.clone(),
                    instructions: submission.instructions.clone(),
                    tools: (!submission.tools.is_empty()).then(|| submission.tools.clone()),
                    response_format,
                },
            )
            .await
            .inspect_err(|e| warn!("Failed to start run on thread {}: {}", thread.id, e))?;

        let mut job = Job::new(&run.id, &thread.id, submission, JobStatus::Pending);
        job.observe(run.job_status(), run.job_error());
        Ok(job)
    }

    // =============================================================================
    // Tracking
    // =============================================================================

    /// Polls a job until it is terminal, `policy.max_wait` elapses, or
    /// `cancel` fires
    ///
    /// Stale observations never move the job backwards. On cancellation the
    /// remote run is asked to stop (best effort) and the job settles as
    /// cancelled.
    pub async fn await_completion(
        &self,
        job: Job,
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<Completion, JobFailure> {
        if job.is_terminal() {
            return Ok(Completion::Settled(job));
        }

        let thread_id = job.thread_id.clone();
        let run_id = job.id.clone();
        let tracked = Mutex::new(job);

        let backend = &self.backend;
        let (thread_id, run_id, tracked_ref) = (thread_id.as_str(), run_id.as_str(), &tracked);

        let outcome = poller::poll_until(policy, cancel, move || async move {
            let run = backend.get_run(thread_id, run_id).await?;
            let observed = run.job_status();
            if run.awaits_tool_output() {
                debug!("Job {} is waiting for tool output; its result is ready", run_id);
            }

            let mut job = tracked_ref.lock().unwrap_or_else(PoisonError::into_inner);
            if job.observe(observed, run.job_error()) {
                debug!("Job {} is now {}", job.id, job.status);
            } else if observed != job.status {
                debug!("Ignoring stale status {} for job {}", observed, job.id);
            }
            Ok::<_, JobFailure>(job.is_terminal().then_some(()))
        })
        .await?;

        let job = tracked.into_inner().unwrap_or_else(PoisonError::into_inner);
        match outcome {
            Wait::Ready(()) => {
                info!("Job {} finished: {}", job.id, job.status);
                Ok(Completion::Settled(job))
            }
            Wait::TimedOut => {
                warn!(
                    "Job {} still {} after {:?}; giving up",
                    job.id, job.status, policy.max_wait
                );
                Ok(Completion::TimedOut(job))
            }
            Wait::Cancelled => Ok(Completion::Settled(self.settle_cancelled(job).await)),
        }
    }

    async fn settle_cancelled(&self, mut job: Job) -> Job {
        info!("Cancelling job {}", job.id);
        if let Err(e) = self.backend.cancel_run(&job.thread_id, &job.id).await {
            warn!("Remote cancellation of job {} failed: {}", job.id, e);
        }
        job.observe(JobStatus::Cancelled, None);
        job
    }

    /// Requests remote cancellation and records the status the service reports
    pub async fn cancel(&self, mut job: Job) -> Result<Job, JobFailure> {
        let run = self.backend.cancel_run(&job.thread_id, &job.id).await?;
        job.observe(run.job_status(), run.job_error());
        info!("Requested cancellation of job {} ({})", job.id, run.job_status());
        Ok(job)
    }

    // =============================================================================
    // Extraction
    // =============================================================================

    /// Messages and steps the service recorded for a job
    pub async fn fetch_trace(&self, job: &Job) -> Result<ExecutionTrace, JobFailure> {
        let messages = self.backend.list_messages(&job.thread_id).await?;
        let steps = self.backend.list_run_steps(&job.thread_id, &job.id).await?;

        Ok(ExecutionTrace {
            messages: messages.into_iter().map(TraceMessage::from).collect(),
            steps: steps.into_iter().filter_map(|s| s.into_trace_step()).collect(),
        })
    }

    /// Locates, parses and validates the result of a completed job
    pub async fn extract_and_validate(
        &self,
        job: &Job,
        schema: &SchemaContract,
        strictness: Strictness,
    ) -> Result<JsonValue, JobFailure> {
        extract::ensure_completed(job)?;
        let trace = self.fetch_trace(job).await?;
        extract::extract_and_validate(job, &trace, schema, strictness)
    }

    // =============================================================================
    // Retrieval
    // =============================================================================

    /// Answers a query grounded in the given vector stores
    ///
    /// The stores are attached to the query's own thread. Handles of any
    /// other kind are skipped.
    pub async fn resolve_with_retrieval(
        &self,
        prompt: &str,
        handles: &[ResourceHandle],
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<RetrievalAnswer, JobFailure> {
        let mut store_ids = Vec::new();
        for handle in handles {
            if handle.kind == ResourceKind::VectorStore {
                store_ids.push(handle.id.clone());
            } else {
                warn!("Skipping {}: only vector stores can ground a query", handle);
            }
        }

        let tool_resources = (!store_ids.is_empty()).then(|| ToolResources::file_search(store_ids));

        let submission = Submission {
            prompt: format!(
                "{}\n\nPlease answer based only on the information found in the uploaded documents. Cite specific information if possible.",
                prompt
            ),
            instructions: Some(self.instructions(
                "Answer questions strictly based on the provided documents. Use your file_search tool and provide citations.",
            )),
            mode: SubmissionMode::Retrieval,
            tools: vec![ToolDeclaration::FileSearch],
        };

        let job = self.submit(submission, tool_resources, None).await?;
        let job = self.await_completion(job, policy, cancel).await?.into_job();
        extract::ensure_completed(&job)?;

        let trace = self.fetch_trace(&job).await?;
        let Some(reply) = trace
            .latest_assistant_message()
            .filter(|message| !message.is_empty())
        else {
            return Err(JobFailure::NoContent { job_id: job.id });
        };

        Ok(RetrievalAnswer {
            text: reply.text(),
            annotations: reply.annotations().cloned().collect(),
            retrieval_invoked: trace.used_file_search(),
            job,
        })
    }

    // =============================================================================
    // Cleanup
    // =============================================================================

    /// Deletes every handle independently (see [`release`])
    pub async fn release(&self, handles: &[ResourceHandle]) -> ReleaseReport {
        release(&self.backend, handles).await
    }
}

/// Deletes every handle independently
///
/// Failures, including resources that no longer exist, are logged and
/// recorded per handle; the batch always runs to the end.
pub async fn release<B: JobBackend>(backend: &B, handles: &[ResourceHandle]) -> ReleaseReport {
    let mut report = ReleaseReport::default();

    for handle in handles {
        let reason = match backend.delete(handle).await {
            Ok(status) if status.deleted => {
                info!("Deleted {}", handle);
                report.deleted.push(handle.clone());
                continue;
            }
            Ok(_) => "service reported the resource was not deleted".to_string(),
            Err(e) => e.to_string(),
        };

        warn!("Could not delete {}: {}", handle, reason);
        report.failed.push(ReleaseFailure {
            handle: handle.clone(),
            reason,
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, Result};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;
    use tutor_core::domain::annotation::AnnotationKind;
    use tutor_core::domain::schema::{FieldSpec, FieldType};
    use tutor_core::domain::trace::Role;
    use tutor_core::dto::DeletionStatus;
    use tutor_core::dto::message::{
        Annotation, FileReference, Message, MessageContent, TextContent,
    };
    use tutor_core::dto::run::{Run, RunError, RunStatus};
    use tutor_core::dto::step::{FunctionCall, RunStep, StepDetails, ToolCall};
    use tutor_core::dto::thread::Thread;
    use tutor_core::failure::FailureClass;

    /// In-memory backend replaying scripted run statuses
    #[derive(Default)]
    struct FakeBackend {
        statuses: Mutex<VecDeque<RunStatus>>,
        last_error: Mutex<Option<RunError>>,
        messages: Mutex<Vec<Message>>,
        steps: Mutex<Vec<RunStep>>,
        existing: Mutex<HashSet<String>>,
        threads: Mutex<Vec<CreateThread>>,
        runs: Mutex<Vec<CreateRun>>,
        cancel_calls: Mutex<u32>,
        fail_polls: Mutex<bool>,
    }

    impl FakeBackend {
        fn with_statuses(statuses: &[RunStatus]) -> Self {
            let backend = Self::default();
            backend.statuses.lock().unwrap().extend(statuses.iter().copied());
            backend
        }

        fn run(&self, status: RunStatus) -> Run {
            Run {
                id: "run_1".to_string(),
                thread_id: "thread_1".to_string(),
                assistant_id: "asst_1".to_string(),
                status,
                last_error: self.last_error.lock().unwrap().clone(),
                created_at: 1_700_000_000,
            }
        }

        /// Next scripted status; the last one repeats
        fn next_status(&self) -> RunStatus {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                statuses.pop_front().unwrap()
            } else {
                statuses.front().copied().unwrap_or(RunStatus::InProgress)
            }
        }

        fn reply(&self, text: &str, annotations: Vec<Annotation>) {
            let mut messages = self.messages.lock().unwrap();
            let id = format!("msg_{}", messages.len());
            messages.push(Message {
                id,
                role: Role::Assistant,
                content: vec![MessageContent::Text {
                    text: TextContent {
                        value: text.to_string(),
                        annotations,
                    },
                }],
                run_id: Some("run_1".to_string()),
                created_at: 1_700_000_001,
            });
        }

        fn tool_calls(&self, calls: Vec<ToolCall>) {
            self.steps.lock().unwrap().push(RunStep {
                id: "step_1".to_string(),
                run_id: "run_1".to_string(),
                status: "completed".to_string(),
                step_details: StepDetails::ToolCalls { tool_calls: calls },
                created_at: 1_700_000_001,
            });
        }
    }

    #[async_trait]
    impl JobBackend for FakeBackend {
        async fn create_thread(&self, req: CreateThread) -> Result<Thread> {
            self.threads.lock().unwrap().push(req);
            Ok(Thread {
                id: "thread_1".to_string(),
                created_at: 1_700_000_000,
                tool_resources: None,
            })
        }

        async fn create_run(&self, _thread_id: &str, req: CreateRun) -> Result<Run> {
            self.runs.lock().unwrap().push(req);
            Ok(self.run(RunStatus::Queued))
        }

        async fn get_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run> {
            if *self.fail_polls.lock().unwrap() {
                return Err(ClientError::api_error(500, "The server had an error"));
            }
            Ok(self.run(self.next_status()))
        }

        async fn cancel_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run> {
            *self.cancel_calls.lock().unwrap() += 1;
            Ok(self.run(RunStatus::Cancelling))
        }

        async fn list_run_steps(&self, _thread_id: &str, _run_id: &str) -> Result<Vec<RunStep>> {
            Ok(self.steps.lock().unwrap().clone())
        }

        async fn list_messages(&self, _thread_id: &str) -> Result<Vec<Message>> {
            Ok(self.messages.lock().unwrap().clone())
        }

        async fn delete(&self, handle: &ResourceHandle) -> Result<DeletionStatus> {
            if self.existing.lock().unwrap().remove(&handle.id) {
                Ok(DeletionStatus {
                    id: handle.id.clone(),
                    deleted: true,
                })
            } else {
                Err(ClientError::api_error(404, format!("No such resource: {}", handle.id)))
            }
        }
    }

    fn contract() -> SchemaContract {
        SchemaContract::new("LectureSummary", "summarize_lecture_topic", "Summarizes a topic")
            .field(FieldSpec::required("topic", FieldType::String, "Topic"))
            .field(FieldSpec::required("explanation", FieldType::String, "Explanation"))
            .field(FieldSpec::required("examples", FieldType::StringList, "Examples"))
            .field(FieldSpec::required("key_points", FieldType::StringList, "Key points"))
            .field(FieldSpec::optional("difficulty", FieldType::String, "Difficulty"))
    }

    fn quick_policy() -> PollPolicy {
        PollPolicy::fixed(Duration::from_secs(1), Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_inline_format_end_to_end() {
        let backend = FakeBackend::with_statuses(&[RunStatus::InProgress, RunStatus::Completed]);
        backend.reply(
            "```json\n{\"topic\":\"Recursion\",\"explanation\":\"A function calling itself\",\"examples\":[\"factorial\"],\"key_points\":[\"base case\"]}\n```",
            Vec::new(),
        );
        let client = AsyncJobClient::new(backend, "asst_1").with_persona("You are a Study Q&A Assistant.");

        let job = client
            .submit_structured("Create a Lecture Summary for Recursion", &contract(), StructuredMode::InlineFormat)
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Pending);

        let completion = client
            .await_completion(job, &quick_policy(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(!completion.is_timed_out());
        let job = completion.into_job();
        assert_eq!(job.status, JobStatus::Completed);

        let value = client
            .extract_and_validate(&job, &contract(), Strictness::Strict)
            .await
            .unwrap();
        assert_eq!(value["topic"], "Recursion");

        let runs = client.backend().runs.lock().unwrap();
        assert_eq!(runs[0].response_format, Some(ResponseFormat::JsonObject));
        assert!(runs[0].tools.is_none());
        assert!(
            runs[0]
                .instructions
                .as_deref()
                .unwrap()
                .starts_with("You are a Study Q&A Assistant.")
        );

        let threads = client.backend().threads.lock().unwrap();
        assert!(threads[0].messages[0].content.contains("examples (list)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tool_call_uses_per_run_tools() {
        let backend = FakeBackend::with_statuses(&[RunStatus::RequiresAction]);
        backend.tool_calls(vec![ToolCall::Function {
            id: "call_1".to_string(),
            function: FunctionCall {
                name: "summarize_lecture_topic".to_string(),
                arguments: "{\"topic\":\"DP\",\"explanation\":\"E\",\"examples\":[],\"key_points\":[],\"difficulty\":null}".to_string(),
                output: None,
            },
        }]);
        let client = AsyncJobClient::new(backend, "asst_1");

        let job = client
            .submit_structured("Summarize Dynamic Programming", &contract(), StructuredMode::ToolCall)
            .await
            .unwrap();
        assert_eq!(job.capability(), Some("summarize_lecture_topic"));

        let job = client
            .await_completion(job, &quick_policy(), &CancellationToken::new())
            .await
            .unwrap()
            .into_job();
        assert_eq!(job.status, JobStatus::Completed);

        let value = client
            .extract_and_validate(&job, &contract(), Strictness::Strict)
            .await
            .unwrap();
        assert_eq!(value["topic"], "DP");

        let runs = client.backend().runs.lock().unwrap();
        let tools = runs[0].tools.as_ref().unwrap();
        assert_eq!(tools[0], ToolDeclaration::FileSearch);
        assert!(matches!(
            &tools[1],
            ToolDeclaration::Function { function } if function.strict && function.name == "summarize_lecture_topic"
        ));
        assert!(runs[0].response_format.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_times_out_with_last_status() {
        let backend = FakeBackend::with_statuses(&[RunStatus::InProgress]);
        let client = AsyncJobClient::new(backend, "asst_1");
        let job = client
            .submit_structured("x", &contract(), StructuredMode::InlineFormat)
            .await
            .unwrap();

        let completion = client
            .await_completion(job, &quick_policy(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(completion.is_timed_out());
        assert_eq!(completion.job().status, JobStatus::Running);

        let err = client
            .extract_and_validate(completion.job(), &contract(), Strictness::Strict)
            .await
            .unwrap_err();
        assert!(matches!(err, JobFailure::NotCompleted { timed_out: true, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_poll_does_not_downgrade_status() {
        let backend = FakeBackend::with_statuses(&[RunStatus::InProgress, RunStatus::Queued]);
        let client = AsyncJobClient::new(backend, "asst_1");
        let job = client
            .submit_structured("x", &contract(), StructuredMode::InlineFormat)
            .await
            .unwrap();

        let completion = client
            .await_completion(job, &quick_policy(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(completion.job().status, JobStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_settles_as_cancelled() {
        let backend = FakeBackend::with_statuses(&[RunStatus::InProgress]);
        let client = AsyncJobClient::new(backend, "asst_1");
        let job = client
            .submit_structured("x", &contract(), StructuredMode::InlineFormat)
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            trigger.cancel();
        });

        let completion = client
            .await_completion(job, &quick_policy(), &cancel)
            .await
            .unwrap();
        assert!(!completion.is_timed_out());
        assert_eq!(completion.job().status, JobStatus::Cancelled);
        assert_eq!(*client.backend().cancel_calls.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_ends_the_wait() {
        let backend = FakeBackend::with_statuses(&[RunStatus::InProgress]);
        *backend.fail_polls.lock().unwrap() = true;
        let client = AsyncJobClient::new(backend, "asst_1");
        let job = client
            .submit_structured("x", &contract(), StructuredMode::InlineFormat)
            .await
            .unwrap();

        let err = client
            .await_completion(job, &quick_policy(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, JobFailure::Service { status: Some(500), .. }));
        assert_eq!(*client.backend().cancel_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_run_reports_service_detail() {
        let backend = FakeBackend::with_statuses(&[RunStatus::Failed]);
        *backend.last_error.lock().unwrap() = Some(RunError {
            code: Some("rate_limit_exceeded".to_string()),
            message: "Rate limit reached".to_string(),
        });
        let client = AsyncJobClient::new(backend, "asst_1");
        let job = client
            .submit_structured("x", &contract(), StructuredMode::InlineFormat)
            .await
            .unwrap();
        let job = client
            .await_completion(job, &quick_policy(), &CancellationToken::new())
            .await
            .unwrap()
            .into_job();

        let err = client
            .extract_and_validate(&job, &contract(), Strictness::Strict)
            .await
            .unwrap_err();
        assert_eq!(err.class(), FailureClass::ServiceError);
        assert!(err.to_string().contains("Rate limit reached"));
    }

    #[tokio::test]
    async fn test_resolve_with_retrieval() {
        let backend = FakeBackend::with_statuses(&[RunStatus::Completed]);
        backend.tool_calls(vec![ToolCall::FileSearch {
            id: "call_fs".to_string(),
            file_search: serde_json::json!({}),
        }]);
        backend.reply(
            "KMP runs in O(n + m)【4:0†kmp.pdf】.",
            vec![Annotation::FileCitation {
                text: "【4:0†kmp.pdf】".to_string(),
                file_citation: FileReference {
                    file_id: "file-kmp".to_string(),
                },
                start_index: Some(20),
                end_index: Some(33),
            }],
        );
        let client = AsyncJobClient::new(backend, "asst_1");

        let now = Utc::now();
        let handles = vec![
            ResourceHandle::new(ResourceKind::VectorStore, "vs_1", now),
            ResourceHandle::new(ResourceKind::File, "file-kmp", now),
        ];

        let answer = client
            .resolve_with_retrieval(
                "What is the time complexity of KMP?",
                &handles,
                &quick_policy(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(answer.text, "KMP runs in O(n + m)【4:0†kmp.pdf】.");
        assert_eq!(answer.annotations.len(), 1);
        assert_eq!(answer.annotations[0].kind, AnnotationKind::FileCitation);
        assert_eq!(answer.annotations[0].source_id, "file-kmp");
        assert!(answer.retrieval_invoked);
        assert_eq!(answer.job.thread_handle().id, "thread_1");

        let threads = client.backend().threads.lock().unwrap();
        assert_eq!(
            threads[0].tool_resources,
            Some(ToolResources::file_search(vec!["vs_1".to_string()]))
        );
        let runs = client.backend().runs.lock().unwrap();
        assert_eq!(runs[0].tools, Some(vec![ToolDeclaration::FileSearch]));
    }

    #[tokio::test]
    async fn test_retrieval_without_reply_is_no_content() {
        let backend = FakeBackend::with_statuses(&[RunStatus::Completed]);
        let client = AsyncJobClient::new(backend, "asst_1");

        let err = client
            .resolve_with_retrieval("q", &[], &quick_policy(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, JobFailure::NoContent { .. }));
    }

    #[tokio::test]
    async fn test_release_empty_batch() {
        let client = AsyncJobClient::new(FakeBackend::default(), "asst_1");
        let report = client.release(&[]).await;
        assert!(report.deleted.is_empty());
        assert!(report.failed.is_empty());
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_release_continues_past_failures() {
        let backend = FakeBackend::default();
        backend.existing.lock().unwrap().insert("vs_real".to_string());
        let client = AsyncJobClient::new(backend, "asst_1");

        let now = Utc::now();
        let handles = vec![
            ResourceHandle::new(ResourceKind::File, "file-gone", now),
            ResourceHandle::new(ResourceKind::VectorStore, "vs_real", now),
        ];

        let report = client.release(&handles).await;
        assert_eq!(report.deleted.len(), 1);
        assert_eq!(report.deleted[0].id, "vs_real");
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].handle.id, "file-gone");
        assert!(report.failed[0].reason.contains("404"));
    }
}
