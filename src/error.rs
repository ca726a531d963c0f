//! Error types for the OpsGenie provider.

use thiserror::Error;

/// Errors that can occur while serving the provider or talking to OpsGenie.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested object does not exist (remote 404, or a lookup miss
    /// such as a team member username with no matching user).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A local validation error; no remote call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A provider configuration error (missing or malformed api_key, or an
    /// operation before Configure).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is not registered.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// The OpsGenie API rejected the request.
    #[error("OpsGenie API error (status {status}): {message}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Message body or status text from the API.
        message: String,
    },

    /// The HTTP request itself failed (connect, TLS, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A gRPC transport error occurred.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

impl ProviderError {
    /// Build an API error from a status code and response body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether this error means the remote object does not exist.
    ///
    /// Read handlers use this to distinguish drift (clear the id, succeed)
    /// from a real failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Api {
                    status: 404,
                    ..
                }
        )
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(msg) => tonic::Status::not_found(msg),
            ProviderError::Validation(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Configuration(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::UnknownResource(msg) => tonic::Status::not_found(msg),
            ProviderError::Api { status, message } => match status {
                404 => tonic::Status::not_found(message),
                401 | 403 => tonic::Status::permission_denied(message),
                409 => tonic::Status::already_exists(message),
                422 => tonic::Status::invalid_argument(message),
                429 => tonic::Status::resource_exhausted(message),
                _ => tonic::Status::unavailable(format!("OpsGenie API error ({}): {}", status, message)),
            },
            ProviderError::Http(err) => {
                tonic::Status::unavailable(format!("HTTP error: {}", err))
            },
            ProviderError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("Serialization error: {}", err))
            },
            ProviderError::Transport(err) => {
                tonic::Status::unavailable(format!("Transport error: {}", err))
            },
        }
    }
}
