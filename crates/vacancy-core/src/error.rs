use thiserror::Error;

/// Application-wide error types for the vacancy tool.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request could not be built or sent.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The API answered with something other than 200 OK.
    #[error("Unexpected HTTP {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true for failures of the upstream API that only cost one item
    /// (status, transport or decode errors) rather than the whole run.
    pub fn is_soft_fetch_failure(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_)
                | AppError::UnexpectedStatus { .. }
                | AppError::SerializationError(_)
                | AppError::Timeout(_)
                | AppError::NetworkError(_)
        )
    }
}
