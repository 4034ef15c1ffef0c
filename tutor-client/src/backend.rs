//! Backend seam for the job workflow
//!
//! [`AsyncJobClient`](crate::AsyncJobClient) talks to the service only
//! through this trait. The HTTP implementation forwards to
//! [`AssistantsClient`]; tests substitute an in-memory backend.

use async_trait::async_trait;
use tutor_core::domain::resource::{ResourceHandle, ResourceKind};
use tutor_core::dto::message::Message;
use tutor_core::dto::run::{CreateRun, Run};
use tutor_core::dto::step::RunStep;
use tutor_core::dto::thread::{CreateThread, Thread};
use tutor_core::dto::{DeletionStatus, ListOrder};

use crate::AssistantsClient;
use crate::error::Result;

/// Largest page the service returns for message listings
const MESSAGE_PAGE_LIMIT: u32 = 100;

/// Remote operations needed to submit, track and clean up jobs
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Creates a thread seeded with the submission's messages
    async fn create_thread(&self, req: CreateThread) -> Result<Thread>;

    /// Starts a run over a thread
    async fn create_run(&self, thread_id: &str, req: CreateRun) -> Result<Run>;

    /// Reads the current state of a run
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Requests cancellation of a run
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Steps of a run, in execution order
    async fn list_run_steps(&self, thread_id: &str, run_id: &str) -> Result<Vec<RunStep>>;

    /// Messages of a thread, oldest first
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>>;

    /// Deletes the remote resource behind a handle
    async fn delete(&self, handle: &ResourceHandle) -> Result<DeletionStatus>;
}

#[async_trait]
impl JobBackend for AssistantsClient {
    async fn create_thread(&self, req: CreateThread) -> Result<Thread> {
        AssistantsClient::create_thread(self, &req).await
    }

    async fn create_run(&self, thread_id: &str, req: CreateRun) -> Result<Run> {
        AssistantsClient::create_run(self, thread_id, &req).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        AssistantsClient::get_run(self, thread_id, run_id).await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        AssistantsClient::cancel_run(self, thread_id, run_id).await
    }

    async fn list_run_steps(&self, thread_id: &str, run_id: &str) -> Result<Vec<RunStep>> {
        let steps = AssistantsClient::list_run_steps(self, thread_id, run_id).await?;
        Ok(steps.data)
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>> {
        let messages =
            AssistantsClient::list_messages(self, thread_id, ListOrder::Asc, MESSAGE_PAGE_LIMIT)
                .await?;
        Ok(messages.data)
    }

    async fn delete(&self, handle: &ResourceHandle) -> Result<DeletionStatus> {
        match handle.kind {
            ResourceKind::File => self.delete_file(&handle.id).await,
            ResourceKind::VectorStore => self.delete_vector_store(&handle.id).await,
            ResourceKind::Thread => self.delete_thread(&handle.id).await,
            ResourceKind::Assistant => self.delete_assistant(&handle.id).await,
        }
    }
}
