//! Application-wide error type.
//!
//! Domain crates keep their own precise errors and fold into [`AppError`]
//! at the edge, where only a status, a stable code and a message survive.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Caller-facing error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// The actor's role may not perform the request.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// The referenced trade or document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The request is well-formed but a workflow precondition blocks it.
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// The request collides with current state (wrong status, duplicate, re-verification).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing store could not answer in time; retry with backoff.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The blob storage collaborator failed.
    #[error("Document storage error: {0}")]
    Storage(String),

    /// Persisted data failed an integrity check.
    #[error("Integrity violation: {0}")]
    Integrity(String),
}

impl AppError {
    /// HTTP-style status for the category.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Unprocessable(_) => 422,
            Self::Storage(_) => 502,
            Self::Unavailable(_) => 503,
            Self::Integrity(_) => 500,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "INVALID_INPUT",
            Self::Unprocessable(_) => "UNPROCESSABLE",
            Self::Conflict(_) => "CONFLICT",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Integrity(_) => "INTEGRITY_VIOLATION",
        }
    }

    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
