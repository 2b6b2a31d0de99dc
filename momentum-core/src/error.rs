//! Error types for momentum-core

use thiserror::Error;

/// Main error type for the momentum-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// No caller identity available; surfaced to the transport layer unchanged
    #[error("not authenticated")]
    NotAuthenticated,

    /// The id does not resolve to a row owned by the caller. Absent ids and
    /// foreign-owned ids are indistinguishable on purpose.
    #[error("{0} not found or access denied")]
    NotFoundOrAccessDenied(&'static str),

    /// Malformed input, rejected before any persistence write
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Result type alias for momentum-core
pub type Result<T> = std::result::Result<T, Error>;

/// Reject calls that arrive without a caller identity.
///
/// The surrounding request layer resolves authentication; by the time an
/// owner id reaches the core it must be non-empty.
pub(crate) fn require_owner(owner_id: &str) -> Result<()> {
    if owner_id.trim().is_empty() {
        return Err(Error::NotAuthenticated);
    }
    Ok(())
}
