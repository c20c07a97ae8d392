//! Error types for the viewer

use thiserror::Error;

/// Everything that can go wrong between a user action and the view state
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Transport error ({url}): {message}")]
    Transport { url: String, message: String },

    #[error("Request timed out: {url}")]
    Timeout { url: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A newer request was issued before this one completed
    #[error("Response for request #{generation} was superseded")]
    Superseded { generation: u64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ViewerError {
    pub fn malformed(message: impl Into<String>) -> Self {
        ViewerError::MalformedResponse(message.into())
    }

    /// Superseded responses are expected during fast interaction and are not shown
    pub fn is_superseded(&self) -> bool {
        matches!(self, ViewerError::Superseded { .. })
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::MalformedResponse(err.to_string())
    }
}

/// Result type alias for viewer operations
pub type Result<T> = std::result::Result<T, ViewerError>;
