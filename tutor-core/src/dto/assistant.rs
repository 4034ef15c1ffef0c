//! Assistant DTOs

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::resource::{ResourceHandle, ResourceKind};
use crate::dto::timestamp;

/// A configured assistant on the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assistant {
    pub id: String,
    pub name: Option<String>,
    pub model: String,
    #[serde(default)]
    pub tools: Vec<JsonValue>,
    pub created_at: i64,
}

impl Assistant {
    pub fn handle(&self) -> ResourceHandle {
        let handle = ResourceHandle::new(ResourceKind::Assistant, &self.id, timestamp(self.created_at));
        match &self.name {
            Some(name) => handle.with_label(name),
            None => handle,
        }
    }
}
