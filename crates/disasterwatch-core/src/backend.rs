//! The backing collaborator seen from the core.
//!
//! [`FeedBackend`] abstracts the two REST calls the live feed needs. The
//! HTTP client implements it against the real API; tests implement it with
//! canned responses.

use std::future::Future;

use disasterwatch_types::{EventId, RawEvent};

/// Failure of a backend call, classified for user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend answered with a non-2xx status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body text, possibly empty.
        body: String,
    },

    /// The request never completed (unreachable host, reset connection).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response arrived but could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl BackendError {
    /// The alert text shown when a delete fails.
    pub fn delete_failure_message(&self) -> String {
        match self {
            Self::Status { status, body } => {
                format!("Failed to delete event. Server responded with: {status} {body}")
            }
            Self::Transport(_) | Self::Decode(_) => {
                String::from("Error deleting event. Please check your connection.")
            }
        }
    }
}

/// REST operations backing the live feed.
pub trait FeedBackend {
    /// `GET /api/alerts`: the current alert snapshot, in server order.
    fn fetch_alerts(&self) -> impl Future<Output = Result<Vec<RawEvent>, BackendError>> + Send;

    /// `DELETE /api/alerts/{id}` with a bearer credential.
    fn delete_alert(
        &self,
        id: &EventId,
        token: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_messages_match_failure_kind() {
        let status = BackendError::Status {
            status: 403,
            body: String::from("Forbidden"),
        };
        assert_eq!(
            status.delete_failure_message(),
            "Failed to delete event. Server responded with: 403 Forbidden"
        );
        let transport = BackendError::Transport(String::from("connection refused"));
        assert_eq!(
            transport.delete_failure_message(),
            "Error deleting event. Please check your connection."
        );
    }
}
