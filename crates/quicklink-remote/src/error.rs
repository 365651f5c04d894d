use quicklink_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{0} is not configured")]
    NotConfigured(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

impl From<RemoteError> for CoreError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Decode(msg) => CoreError::Serde(msg),
            RemoteError::Status { status, body } => {
                CoreError::Storage(format!("remote returned {}: {}", status, body))
            }
            other => CoreError::Unavailable(other.to_string()),
        }
    }
}
