//! Translation of database failures into [`AppError`] kinds.
//!
//! Constraint violations are how the storage layer enforces the engine's
//! invariants, so the constraint name decides the kind the caller sees.

use stashbox_core::error::{AppError, ErrorKind};

/// Partial unique index over live location paths.
pub const LOCATION_PATH_KEY: &str = "locations_workspace_path_live_key";
/// Depth bound on location paths.
pub const LOCATION_DEPTH_CHECK: &str = "locations_depth_check";
/// One QR code per box.
pub const QR_BOX_KEY: &str = "qr_codes_box_id_key";
/// A QR code can only point at an existing box.
pub const QR_BOX_FKEY: &str = "qr_codes_box_id_fkey";

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Pick the error kind for a SQLSTATE code and optional constraint name.
pub fn classify(code: &str, constraint: Option<&str>) -> ErrorKind {
    match (code, constraint) {
        (UNIQUE_VIOLATION, Some(LOCATION_PATH_KEY)) => ErrorKind::SiblingConflict,
        (UNIQUE_VIOLATION, Some(QR_BOX_KEY)) => ErrorKind::AlreadyAssigned,
        (CHECK_VIOLATION, Some(LOCATION_DEPTH_CHECK)) => ErrorKind::MaxDepthExceeded,
        (FOREIGN_KEY_VIOLATION, Some(QR_BOX_FKEY)) => ErrorKind::NotFound,
        (SERIALIZATION_FAILURE | DEADLOCK_DETECTED | LOCK_NOT_AVAILABLE, _) => {
            ErrorKind::TransactionConflict
        }
        _ => ErrorKind::Database,
    }
}

/// Wrap a sqlx error, choosing the kind from its SQLSTATE and constraint.
///
/// `context` becomes the message for plain database failures; invariant
/// violations get a message describing the conflict instead.
pub fn map_db_error(err: sqlx::Error, context: &str) -> AppError {
    let kind = match &err {
        sqlx::Error::Database(db) => db
            .code()
            .map(|code| classify(&code, db.constraint()))
            .unwrap_or(ErrorKind::Database),
        sqlx::Error::PoolTimedOut => ErrorKind::TransactionConflict,
        _ => ErrorKind::Database,
    };

    let message = match kind {
        ErrorKind::SiblingConflict => "A location with this name already exists here".to_string(),
        ErrorKind::AlreadyAssigned => "The QR code or box is already assigned".to_string(),
        ErrorKind::MaxDepthExceeded => "Location hierarchy is too deep".to_string(),
        ErrorKind::NotFound => "Box not found".to_string(),
        ErrorKind::TransactionConflict => format!("{context}: concurrent modification"),
        _ => context.to_string(),
    };

    AppError::with_source(kind, message, err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_collision_is_sibling_conflict() {
        assert_eq!(
            classify("23505", Some(LOCATION_PATH_KEY)),
            ErrorKind::SiblingConflict
        );
    }

    #[test]
    fn test_second_code_on_box_is_already_assigned() {
        assert_eq!(classify("23505", Some(QR_BOX_KEY)), ErrorKind::AlreadyAssigned);
    }

    #[test]
    fn test_code_pointing_at_missing_box_is_not_found() {
        assert_eq!(classify("23503", Some(QR_BOX_FKEY)), ErrorKind::NotFound);
    }

    #[test]
    fn test_depth_check_violation() {
        assert_eq!(
            classify("23514", Some(LOCATION_DEPTH_CHECK)),
            ErrorKind::MaxDepthExceeded
        );
    }

    #[test]
    fn test_concurrency_failures_are_retryable_conflicts() {
        for code in ["40001", "40P01", "55P03"] {
            assert_eq!(classify(code, None), ErrorKind::TransactionConflict, "{code}");
        }
    }

    #[test]
    fn test_cancelled_statement_is_not_retried() {
        assert_eq!(classify("57014", None), ErrorKind::Database);
    }

    #[test]
    fn test_other_violations_stay_database_errors() {
        assert_eq!(classify("23505", Some("some_other_key")), ErrorKind::Database);
        assert_eq!(classify("42P01", None), ErrorKind::Database);
    }

    #[test]
    fn test_non_database_error_maps_to_database_kind() {
        let err = map_db_error(sqlx::Error::RowNotFound, "Failed to load box");
        assert_eq!(err.kind, ErrorKind::Database);
        assert_eq!(err.message, "Failed to load box");
    }

    #[test]
    fn test_pool_timeout_is_transaction_conflict() {
        let err = map_db_error(sqlx::Error::PoolTimedOut, "Failed to start transaction");
        assert_eq!(err.kind, ErrorKind::TransactionConflict);
    }
}
