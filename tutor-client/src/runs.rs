//! Run endpoints

use reqwest::Method;
use tutor_core::dto::run::{CreateRun, Run};
use tutor_core::dto::step::RunStep;
use tutor_core::dto::{ListOrder, ListResponse};

use crate::AssistantsClient;
use crate::error::Result;

impl AssistantsClient {
    // =============================================================================
    // Run Lifecycle
    // =============================================================================

    /// Start a run of an assistant over a thread
    pub async fn create_run(&self, thread_id: &str, req: &CreateRun) -> Result<Run> {
        let path = format!("/threads/{}/runs", thread_id);
        let response = self.request(Method::POST, &path).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Get the current state of a run
    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let path = format!("/threads/{}/runs/{}", thread_id, run_id);
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    /// Ask the service to cancel a run
    ///
    /// The returned run usually reports `cancelling`; the final `cancelled`
    /// status is observed by polling.
    pub async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let path = format!("/threads/{}/runs/{}/cancel", thread_id, run_id);
        let response = self.request(Method::POST, &path).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Run Steps
    // =============================================================================

    /// List the steps of a run in execution order
    pub async fn list_run_steps(&self, thread_id: &str, run_id: &str) -> Result<ListResponse<RunStep>> {
        let path = format!("/threads/{}/runs/{}/steps", thread_id, run_id);
        let response = self
            .request(Method::GET, &path)
            .query(&[("order", ListOrder::Asc.as_str())])
            .send()
            .await?;

        self.handle_response(response).await
    }
}
