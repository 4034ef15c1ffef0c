//! Assistant endpoints

use reqwest::Method;
use tutor_core::dto::DeletionStatus;
use tutor_core::dto::assistant::Assistant;

use crate::AssistantsClient;
use crate::error::Result;

impl AssistantsClient {
    pub async fn get_assistant(&self, assistant_id: &str) -> Result<Assistant> {
        let path = format!("/assistants/{}", assistant_id);
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    pub async fn delete_assistant(&self, assistant_id: &str) -> Result<DeletionStatus> {
        let path = format!("/assistants/{}", assistant_id);
        let response = self.request(Method::DELETE, &path).send().await?;

        self.handle_response(response).await
    }
}
