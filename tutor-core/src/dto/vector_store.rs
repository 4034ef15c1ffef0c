//! Vector store DTOs

use serde::{Deserialize, Serialize};

use crate::domain::resource::{ResourceHandle, ResourceKind};
use crate::dto::timestamp;

/// An indexed document collection hosted by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStore {
    pub id: String,
    pub name: Option<String>,
    pub status: VectorStoreStatus,
    pub file_counts: FileCounts,
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreStatus {
    InProgress,
    Completed,
    Expired,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for VectorStoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Processing state of the files in a vector store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCounts {
    pub in_progress: u32,
    pub completed: u32,
    pub failed: u32,
    pub cancelled: u32,
    pub total: u32,
}

impl VectorStore {
    /// Handle for this store; stores without a creation time cannot be aged
    pub fn handle(&self) -> Option<ResourceHandle> {
        let created_at = self.created_at?;
        let handle = ResourceHandle::new(ResourceKind::VectorStore, &self.id, timestamp(created_at));
        Some(match &self.name {
            Some(name) => handle.with_label(name),
            None => handle,
        })
    }

    /// Whether every file has finished processing
    pub fn is_ready(&self) -> bool {
        self.file_counts.in_progress == 0
    }
}

/// Request to create a vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVectorStore {
    pub name: String,
    pub file_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_after: Option<ExpirationPolicy>,
}

/// When a vector store expires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationPolicy {
    pub anchor: String,
    pub days: u32,
}

impl ExpirationPolicy {
    /// Expire `days` after the store was last used
    pub fn after_last_activity(days: u32) -> Self {
        Self {
            anchor: "last_active_at".to_string(),
            days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_store_decodes() {
        let store: VectorStore = serde_json::from_value(serde_json::json!({
            "id": "vs_abc123",
            "object": "vector_store",
            "created_at": 1699061776,
            "name": "VS_KMP_asst_1_1699061776",
            "usage_bytes": 139920,
            "status": "in_progress",
            "file_counts": {
                "in_progress": 1,
                "completed": 2,
                "failed": 0,
                "cancelled": 0,
                "total": 3
            }
        }))
        .unwrap();

        assert!(!store.is_ready());
        assert_eq!(store.status, VectorStoreStatus::InProgress);
        let handle = store.handle().unwrap();
        assert_eq!(handle.label.as_deref(), Some("VS_KMP_asst_1_1699061776"));
    }

    #[test]
    fn test_store_without_creation_time_has_no_handle() {
        let store = VectorStore {
            id: "vs_1".to_string(),
            name: None,
            status: VectorStoreStatus::Completed,
            file_counts: FileCounts::default(),
            created_at: None,
        };
        assert!(store.handle().is_none());
        assert!(store.is_ready());
    }

    #[test]
    fn test_expiration_policy_wire_format() {
        let req = CreateVectorStore {
            name: "VS".to_string(),
            file_ids: vec!["file-1".to_string()],
            expires_after: Some(ExpirationPolicy::after_last_activity(1)),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value["expires_after"],
            serde_json::json!({"anchor": "last_active_at", "days": 1})
        );
    }
}
