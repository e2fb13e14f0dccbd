//! Unified application error types for Stashbox.
//!
//! Every crate maps its internal failures into [`AppError`] so that the
//! `?` operator works across layer boundaries. The [`ErrorKind`] carries the
//! taxonomy callers branch on; the message is safe to show to a user.

use std::fmt;
use thiserror::Error;

/// Error categories shared by every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The location, box, or QR code does not exist, is soft-deleted, or
    /// belongs to another workspace.
    NotFound,
    /// Input failed validation (lengths, blank names, batch sizes).
    Validation,
    /// A location would be placed deeper than the maximum depth.
    MaxDepthExceeded,
    /// A live location already occupies the target path.
    SiblingConflict,
    /// The QR code (or the box) is already bound elsewhere.
    AlreadyAssigned,
    /// The QR code is not in a state that allows the transition.
    InvalidState,
    /// No free short identifier was found within the retry budget.
    ShortIdExhausted,
    /// A concurrent transaction forced this one to abort.
    TransactionConflict,
    /// Any other database failure.
    Database,
    /// Configuration could not be loaded or is out of range.
    Configuration,
    /// Serialization or deserialization failed.
    Serialization,
    /// An unexpected internal failure.
    Internal,
}

impl ErrorKind {
    /// Stable upper-case code for logs and API translation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION",
            Self::MaxDepthExceeded => "MAX_DEPTH_EXCEEDED",
            Self::SiblingConflict => "SIBLING_CONFLICT",
            Self::AlreadyAssigned => "ALREADY_ASSIGNED",
            Self::InvalidState => "INVALID_STATE",
            Self::ShortIdExhausted => "SHORT_ID_EXHAUSTED",
            Self::TransactionConflict => "TRANSACTION_CONFLICT",
            Self::Database => "DATABASE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single error type crossing crate boundaries.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable message without internal detail.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a max-depth error.
    pub fn max_depth_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MaxDepthExceeded, message)
    }

    /// Create a sibling path conflict error.
    pub fn sibling_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SiblingConflict, message)
    }

    /// Create an already-assigned error.
    pub fn already_assigned(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyAssigned, message)
    }

    /// Create an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }

    /// Create a short-id exhaustion error.
    pub fn short_id_exhausted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ShortIdExhausted, message)
    }

    /// Create a transaction conflict error.
    pub fn transaction_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransactionConflict, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error is an operational condition to be logged and
    /// alerted on rather than shown to the user verbatim.
    pub fn is_operational(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ShortIdExhausted | ErrorKind::TransactionConflict | ErrorKind::Database
        )
    }

    /// Whether re-running the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::TransactionConflict
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::with_source(ErrorKind::Validation, format!("Invalid input: {err}"), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_code() {
        let err = AppError::sibling_conflict("Path 'garage' already exists");
        assert_eq!(err.to_string(), "SIBLING_CONFLICT: Path 'garage' already exists");
    }

    #[test]
    fn test_operational_classification() {
        assert!(AppError::short_id_exhausted("no free code").is_operational());
        assert!(AppError::transaction_conflict("aborted").is_operational());
        assert!(!AppError::not_found("missing").is_operational());
        assert!(!AppError::already_assigned("taken").is_operational());
    }

    #[test]
    fn test_only_transaction_conflicts_retry() {
        assert!(AppError::transaction_conflict("aborted").is_retryable());
        assert!(!AppError::database("broken").is_retryable());
        assert!(!AppError::short_id_exhausted("no free code").is_retryable());
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("disk");
        let err = AppError::with_source(ErrorKind::Internal, "wrapped", io);
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Internal);
        assert!(cloned.source.is_none());
    }
}
