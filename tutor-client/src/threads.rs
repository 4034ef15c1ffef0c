//! Thread endpoints

use reqwest::Method;
use tutor_core::dto::thread::{CreateThread, Thread};
use tutor_core::dto::{DeletionStatus, ListResponse};

use crate::AssistantsClient;
use crate::error::Result;

impl AssistantsClient {
    /// Create a thread, optionally seeded with messages and tool resources
    pub async fn create_thread(&self, req: &CreateThread) -> Result<Thread> {
        let response = self.request(Method::POST, "/threads").json(req).send().await?;

        self.handle_response(response).await
    }

    /// List threads, newest first
    pub async fn list_threads(&self, limit: u32) -> Result<ListResponse<Thread>> {
        let limit = limit.to_string();
        let response = self
            .request(Method::GET, "/threads")
            .query(&[("limit", limit.as_str())])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete a thread
    pub async fn delete_thread(&self, thread_id: &str) -> Result<DeletionStatus> {
        let path = format!("/threads/{}", thread_id);
        let response = self.request(Method::DELETE, &path).send().await?;

        self.handle_response(response).await
    }
}
