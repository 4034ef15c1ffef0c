//! Thread DTOs

use serde::{Deserialize, Serialize};

use crate::domain::resource::{ResourceHandle, ResourceKind};
use crate::dto::timestamp;

/// A conversation on the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub created_at: i64,
    #[serde(default)]
    pub tool_resources: Option<ToolResources>,
}

impl Thread {
    pub fn handle(&self) -> ResourceHandle {
        ResourceHandle::new(ResourceKind::Thread, &self.id, timestamp(self.created_at))
    }
}

/// Request to create a thread
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateThread {
    pub messages: Vec<NewMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<ToolResources>,
}

/// A message to seed a thread with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub role: String,
    pub content: String,
}

impl NewMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Resources made available to a thread's tools
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResources {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_search: Option<FileSearchResources>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSearchResources {
    pub vector_store_ids: Vec<String>,
}

impl ToolResources {
    /// File-search resources over the given vector stores
    pub fn file_search(vector_store_ids: Vec<String>) -> Self {
        Self {
            file_search: Some(FileSearchResources { vector_store_ids }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_thread_omits_empty_resources() {
        let req = CreateThread {
            messages: vec![NewMessage::user("hi")],
            tool_resources: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"messages": [{"role": "user", "content": "hi"}]})
        );
    }

    #[test]
    fn test_create_thread_with_file_search() {
        let req = CreateThread {
            messages: vec![NewMessage::user("hi")],
            tool_resources: Some(ToolResources::file_search(vec!["vs_1".to_string()])),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value["tool_resources"]["file_search"]["vector_store_ids"],
            serde_json::json!(["vs_1"])
        );
    }
}
