//! Validation errors for relayed file requests.

use super::FileOperation;
use thiserror::Error;

/// Errors raised before a file request is forwarded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FileRequestError {
    /// The operation needs a `path` query parameter.
    #[error("{0} requires a non-empty path query parameter")]
    MissingPath(FileOperation),

    /// The operation needs a request body.
    #[error("{0} requires a request body")]
    MissingBody(FileOperation),
}
