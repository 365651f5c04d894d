use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Shortcut not found: {0}")]
    ShortcutNotFound(String),
    #[error("Category not found: {0}")]
    CategoryNotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl CoreError {
    /// Returns `true` for failures caused by the backend rather than the request.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            CoreError::Storage(_)
                | CoreError::Io(_)
                | CoreError::Unavailable(_)
                | CoreError::Serde(_)
        )
    }
}
