//! Error handling for qmatrix-store
//!
//! Wraps qmatrix-core ExError with store-specific helpers

use qmatrix_core::errors::{ExError, ExErrorKind, RestoreError};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a backup validation error
pub fn backup_validation(reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("backup_parse")
        .with_message(reason.to_string())
}

/// Create a not-found error for a question without a stored matrix
pub fn matrix_not_found(question_id: i64) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("load_matrix")
        .with_question_id(question_id)
        .with_message("No matrix stored for question")
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create a serialization error from serde_json::Error
pub fn from_serde_json(err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("serde_json")
        .with_message(err.to_string())
}

/// Map a rusqlite failure inside a `MatrixStore` call to the restore error type
pub fn store_failure(op: &'static str) -> impl Fn(rusqlite::Error) -> RestoreError {
    move |err| RestoreError::store(op, err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
