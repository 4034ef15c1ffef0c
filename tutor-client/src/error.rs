//! Error types for the assistants client

use thiserror::Error;
use tutor_core::failure::JobFailure;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the assistants service
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Local configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reading a local file for upload failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }
}

impl From<ClientError> for JobFailure {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::RequestFailed(e) => match e.status() {
                Some(status) => JobFailure::Service {
                    status: Some(status.as_u16()),
                    message: e.to_string(),
                },
                None => JobFailure::Unreachable(e.to_string()),
            },
            ClientError::ApiError { status, message } => JobFailure::Service {
                status: Some(status),
                message,
            },
            ClientError::ParseError(message) => JobFailure::Service {
                status: None,
                message,
            },
            ClientError::Configuration(message) => JobFailure::Configuration(message),
            ClientError::Io(e) => JobFailure::Configuration(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::failure::FailureClass;

    #[test]
    fn test_status_helpers() {
        let err = ClientError::api_error(404, "No thread found with id 'thread_x'.");
        assert!(err.is_not_found());

        let err = ClientError::api_error(503, "overloaded");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_api_error_maps_to_service_class() {
        let failure: JobFailure = ClientError::api_error(429, "Rate limit reached").into();
        assert_eq!(failure.class(), FailureClass::ServiceError);
        assert!(failure.to_string().contains("status 429"));
    }

    #[test]
    fn test_parse_error_maps_to_service_class() {
        let failure: JobFailure = ClientError::ParseError("bad body".to_string()).into();
        assert_eq!(failure.class(), FailureClass::ServiceError);
    }
}
