//! qmatrix store - SQLite persistence and restore orchestration
//!
//! Provides:
//! - SQLite schema with an embedded, checksummed migrations framework
//! - `SqliteMatrixStore`, the `MatrixStore` used by restore passes
//! - Backup document parsing and validation
//! - Per-question transactional restore with provenance events

pub mod backup;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod restore;

// Re-export key types
pub use errors::Result;
pub use repo::SqliteMatrixStore;
pub use restore::{restore_backup, QuestionOutcome, RestoreReport};
