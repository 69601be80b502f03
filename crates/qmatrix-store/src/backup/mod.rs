//! Backup documents
//!
//! A backup document lists questions to restore. For each one the backup
//! walker has already resolved the destination question and whether it was
//! freshly created; the document carries that decision alongside the matrix
//! subtree and the stored answers to recode.

pub mod format;
pub mod parser;

pub use format::{AttemptStepDoc, BackupDocument, BackupQuestion, ResponseValue, SCHEMA_VERSION};
pub use parser::{parse_backup_file, parse_backup_str, validate_question};
