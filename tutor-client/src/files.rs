//! File endpoints

use std::path::Path;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::debug;
use tutor_core::dto::file::FileObject;
use tutor_core::dto::{DeletionStatus, ListResponse};

use crate::AssistantsClient;
use crate::error::{ClientError, Result};

impl AssistantsClient {
    /// Upload a local file
    ///
    /// # Arguments
    /// * `path` - File to read and upload
    /// * `purpose` - Intended use, e.g. "assistants"
    pub async fn upload_file(&self, path: &Path, purpose: &str) -> Result<FileObject> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ClientError::Configuration(format!("not a file path: {}", path.display()))
            })?
            .to_string();

        let bytes = tokio::fs::read(path).await?;
        debug!("Uploading {} ({} bytes)", filename, bytes.len());

        let form = Form::new()
            .text("purpose", purpose.to_string())
            .part("file", Part::bytes(bytes).file_name(filename));

        let response = self.request(Method::POST, "/files").multipart(form).send().await?;

        self.handle_response(response).await
    }

    /// List uploaded files, optionally filtered by purpose
    pub async fn list_files(&self, purpose: Option<&str>) -> Result<ListResponse<FileObject>> {
        let mut request = self.request(Method::GET, "/files");
        if let Some(purpose) = purpose {
            request = request.query(&[("purpose", purpose)]);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// Delete an uploaded file
    pub async fn delete_file(&self, file_id: &str) -> Result<DeletionStatus> {
        let path = format!("/files/{}", file_id);
        let response = self.request(Method::DELETE, &path).send().await?;

        self.handle_response(response).await
    }
}
