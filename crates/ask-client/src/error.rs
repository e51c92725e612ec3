use thiserror::Error;

/// Generic text used when a failing endpoint gives no `error` field.
pub const UNKNOWN_SERVER_ERROR: &str = "Unknown server error";

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Non-success status; `message` is the body's `error` field or generic text.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Stream error: {0}")]
    Stream(String),
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// Outcome taxonomy of a single question.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Rejected locally before any network call.
    #[error("{0}")]
    Validation(String),

    /// Another question is still being answered.
    #[error("A question is already being answered")]
    Busy,

    #[error("{0}")]
    Server(String),

    #[error("Generation stopped")]
    Cancelled,

    #[error("{0}")]
    Transport(String),
}
