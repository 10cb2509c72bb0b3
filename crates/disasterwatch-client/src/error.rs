//! Error types for the backend client.
//!
//! Transport-level failures are kept as strings, the way the rest of the
//! workspace reports third-party errors. [`ClientError`] converts into the
//! core [`BackendError`] so the controller sees one classification.

use disasterwatch_core::BackendError;

/// Message shown when the backend rejects an admin call with 401/403.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized access.";

/// Errors that can occur talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The configured backend URL cannot be used.
    #[error("invalid backend URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An id cannot name a single path segment (empty, `.` or `..`).
    #[error("invalid record id {0:?}")]
    InvalidId(String),

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body text, possibly empty.
        body: String,
    },

    /// The backend refused the credentials or the request (login/signup).
    /// Carries the message to show the user.
    #[error("{0}")]
    Rejected(String),

    /// The backend answered 401 or 403 on an admin call.
    #[error("{UNAUTHORIZED_MESSAGE}")]
    Unauthorized,

    /// An admin call was attempted without a stored token.
    #[error("not signed in")]
    NotAuthenticated,

    /// A form failed validation; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The push channel socket failed.
    #[error("websocket error: {0}")]
    WebSocket(String),
}

impl From<ClientError> for BackendError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status { status, body } => Self::Status { status, body },
            ClientError::Unauthorized => Self::Status {
                status: 401,
                body: String::from(UNAUTHORIZED_MESSAGE),
            },
            ClientError::Decode(reason) => Self::Decode(reason),
            other => Self::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_keeps_code_and_body() {
        let backend = BackendError::from(ClientError::Status {
            status: 404,
            body: String::from("Alert not found"),
        });
        assert_eq!(
            backend.delete_failure_message(),
            "Failed to delete event. Server responded with: 404 Alert not found"
        );
    }

    #[test]
    fn transport_becomes_connection_message() {
        let backend = BackendError::from(ClientError::Transport(String::from("refused")));
        assert_eq!(
            backend.delete_failure_message(),
            "Error deleting event. Please check your connection."
        );
    }
}
