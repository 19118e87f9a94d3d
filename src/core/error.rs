//! Error taxonomy for huddle coordination operations.
//!
//! Validation failures are raised before any network call. Backend and
//! network failures are converted at the coordination boundary and returned
//! to the caller; nothing in this crate treats a failed request as fatal.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HuddleError {
    #[error("not signed in")]
    Unauthenticated,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("request already resolved")]
    AlreadyResolved,

    #[error("invalid input: {0}")]
    Validation(String),

    /// A well-formed non-2xx response, distinguished from a transport
    /// failure. Carries the backend's optional `message` field.
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type HuddleResult<T> = Result<T, HuddleError>;
