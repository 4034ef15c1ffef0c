//! Message endpoints

use reqwest::Method;
use tutor_core::dto::message::Message;
use tutor_core::dto::{ListOrder, ListResponse};

use crate::AssistantsClient;
use crate::error::Result;

impl AssistantsClient {
    /// List the messages of a thread
    ///
    /// # Arguments
    /// * `thread_id` - The thread to read
    /// * `order` - `Asc` for chronological order
    /// * `limit` - Page size (the service caps it at 100)
    pub async fn list_messages(
        &self,
        thread_id: &str,
        order: ListOrder,
        limit: u32,
    ) -> Result<ListResponse<Message>> {
        let path = format!("/threads/{}/messages", thread_id);
        let limit = limit.to_string();
        let response = self
            .request(Method::GET, &path)
            .query(&[("order", order.as_str()), ("limit", limit.as_str())])
            .send()
            .await?;

        self.handle_response(response).await
    }
}
