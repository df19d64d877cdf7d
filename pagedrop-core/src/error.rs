//! Error types shared by the pagedrop pipeline and its collaborators.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for pipeline operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Errors that abort a publish, sync, delete or status invocation.
///
/// Per-file transfer failures and processing errors are *not* represented here: they are
/// collected into the report instead (see [`crate::upload::UploadOutcome`] and
/// [`crate::convergence::ConvergenceReport`]).
#[derive(Debug, Error)]
pub enum PublishError {
    /// An input path is neither a regular file nor a directory.
    #[error("path not found or not a file or directory: {}", path.display())]
    NotFoundOrInvalidPath { path: PathBuf },

    /// Discovery completed without a single publishable file.
    #[error("no files found to publish")]
    NoFilesFound,

    /// Two inputs map to the same site-relative path.
    #[error(
        "target path '{target_path}' is produced by both {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateTargetPath {
        target_path: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `.gitignore` could not be parsed into a matcher.
    #[error("invalid ignore rules in {}: {message}", path.display())]
    InvalidIgnoreRules { path: PathBuf, message: String },

    #[error("site '{name}' already exists; re-run with --overwrite to replace it or use `pagedrop sync` to update it")]
    SiteConflict { name: String },

    #[error("site '{name}' not found; publish it first with `pagedrop publish`")]
    SiteNotFound { name: String },

    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors returned by a [`crate::contract::RemoteApi`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Non-success response; `message` carries the server-supplied body or the status text.
    #[error("remote API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Errors from a single direct write to object storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("object store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transfer failed: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_offending_input() {
        let err = PublishError::NotFoundOrInvalidPath {
            path: PathBuf::from("docs/missing.md"),
        };
        assert_eq!(
            err.to_string(),
            "path not found or not a file or directory: docs/missing.md"
        );
    }

    #[test]
    fn conflict_suggests_remediation() {
        let err = PublishError::SiteConflict {
            name: "demo".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("demo"));
        assert!(msg.contains("--overwrite"));
    }

    #[test]
    fn remote_errors_pass_through_unchanged() {
        let err: PublishError = RemoteError::Status {
            status: 502,
            message: "Bad Gateway".into(),
        }
        .into();
        assert_eq!(err.to_string(), "remote API returned 502: Bad Gateway");
    }
}
