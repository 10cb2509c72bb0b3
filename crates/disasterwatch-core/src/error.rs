//! Error types for the dashboard core.

use std::path::PathBuf;

use crate::session::SessionError;

/// Errors surfaced by controller operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The session lacks the role or token the operation needs.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Writing an export failed.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Destination file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session persistence failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}
