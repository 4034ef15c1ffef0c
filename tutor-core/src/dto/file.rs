//! File DTOs

use serde::{Deserialize, Serialize};

use crate::domain::resource::{ResourceHandle, ResourceKind};
use crate::dto::timestamp;

/// Purpose used for documents uploaded for assistants
pub const ASSISTANTS_PURPOSE: &str = "assistants";

/// An uploaded file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    pub id: String,
    pub filename: String,
    pub purpose: String,
    #[serde(default)]
    pub bytes: Option<u64>,
    pub created_at: i64,
}

impl FileObject {
    pub fn handle(&self) -> ResourceHandle {
        ResourceHandle::new(ResourceKind::File, &self.id, timestamp(self.created_at))
            .with_label(&self.filename)
    }

    pub fn is_for_assistants(&self) -> bool {
        self.purpose == ASSISTANTS_PURPOSE
    }
}
