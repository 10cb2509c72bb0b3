//! Error types for the dashboard binary.
//!
//! [`DashboardError`] wraps every failure a command can end with, so
//! command handlers propagate with `?` and `main` reports once.

/// Top-level error for dashboard commands.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: disasterwatch_core::ConfigError,
    },

    /// A backend call failed.
    #[error("{source}")]
    Client {
        /// The underlying client error.
        #[from]
        source: disasterwatch_client::ClientError,
    },

    /// A controller or export operation failed.
    #[error("{source}")]
    Core {
        /// The underlying core error.
        #[from]
        source: disasterwatch_core::CoreError,
    },

    /// Reading or writing the persisted session failed.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: disasterwatch_core::session::SessionError,
    },

    /// Terminal input or output failed.
    #[error("terminal I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An admin command was run without an admin session.
    #[error("{0}")]
    AccessDenied(&'static str),

    /// A command failed; carries the message shown to the user.
    #[error("{message}")]
    Command {
        /// User-facing description of the failure.
        message: String,
    },
}
