//! Vector store endpoints

use reqwest::Method;
use tutor_core::dto::vector_store::{CreateVectorStore, VectorStore};
use tutor_core::dto::{DeletionStatus, ListResponse};

use crate::AssistantsClient;
use crate::error::Result;

impl AssistantsClient {
    /// Create a vector store over already uploaded files
    pub async fn create_vector_store(&self, req: &CreateVectorStore) -> Result<VectorStore> {
        let response = self
            .request(Method::POST, "/vector_stores")
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a vector store, including its file processing counts
    pub async fn get_vector_store(&self, vector_store_id: &str) -> Result<VectorStore> {
        let path = format!("/vector_stores/{}", vector_store_id);
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    pub async fn list_vector_stores(&self, limit: u32) -> Result<ListResponse<VectorStore>> {
        let limit = limit.to_string();
        let response = self
            .request(Method::GET, "/vector_stores")
            .query(&[("limit", limit.as_str())])
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn delete_vector_store(&self, vector_store_id: &str) -> Result<DeletionStatus> {
        let path = format!("/vector_stores/{}", vector_store_id);
        let response = self.request(Method::DELETE, &path).send().await?;

        self.handle_response(response).await
    }
}
