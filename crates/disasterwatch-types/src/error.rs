//! Error types for parsing shared values.

/// Errors raised when a textual value does not map onto a known type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// The string is not one of `High`, `Medium`, `Low`.
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),

    /// The string is not `all` or a severity label.
    #[error("unknown severity filter: {0} (expected all, high, medium or low)")]
    UnknownFilter(String),
}
