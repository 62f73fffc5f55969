//! Error types for sheetlink.

use thiserror::Error;

/// Result type for sheetlink operations.
pub type SheetResult<T> = Result<T, SheetError>;

/// Errors that can occur in sheetlink.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Malformed column, row, or range syntax. Local, never retried.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Structurally invalid request (empty range list, empty write batch).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit (429) still failing after the retry budget was spent.
    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded {
        attempts: u32,
        last_error: Option<String>,
    },

    /// Server error (500/503) still failing after the retry budget was spent.
    #[error("Server error {status} after {attempts} attempts")]
    BackendUnavailable {
        status: u16,
        attempts: u32,
        last_error: Option<String>,
    },

    /// Permanent backend rejection. Surfaced immediately, no retry.
    #[error("API error {status}: {body}")]
    BackendRequest { status: u16, body: String },

    /// Requested capability is not available.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Credential loading or refresh failure.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport-level HTTP failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SheetError {
    /// Create an invalid-address error.
    pub fn invalid_address(message: impl Into<String>) -> Self {
        Self::InvalidAddress(message.into())
    }

    /// Create an invalid-request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Whether this failure was a transient backend condition that exhausted
    /// its retry budget, as opposed to a permanent rejection.
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. } | Self::BackendUnavailable { .. }
        )
    }
}
