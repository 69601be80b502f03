//! Backup document parsing and validation

use std::collections::HashSet;
use std::path::Path;

use qmatrix_core::model::EntityId;

use crate::backup::format::{BackupDocument, BackupQuestion, SCHEMA_VERSION};
use crate::errors::{backup_validation, io_error, Result};

/// Read and validate a YAML backup document from disk
///
/// # Errors
///
/// `Io` if the file cannot be read, `InvalidInput` if it does not parse or
/// fails validation.
pub fn parse_backup_file(path: &Path) -> Result<BackupDocument> {
    let content = std::fs::read_to_string(path).map_err(|e| io_error("read_backup", e))?;
    parse_backup_str(&content)
}

/// Parse and validate a YAML backup document
///
/// # Errors
///
/// `InvalidInput` on malformed YAML, an unsupported schema version or
/// duplicate question ids. Questions are checked one at a time by
/// [`validate_question`] when they are restored.
pub fn parse_backup_str(content: &str) -> Result<BackupDocument> {
    let doc: BackupDocument = serde_yaml::from_str(content)
        .map_err(|e| backup_validation(&format!("Invalid backup YAML: {}", e)))?;
    validate(&doc)?;
    Ok(doc)
}

fn validate(doc: &BackupDocument) -> Result<()> {
    if doc.schema_version != SCHEMA_VERSION {
        return Err(backup_validation(&format!(
            "Unsupported schema_version {} (expected {})",
            doc.schema_version, SCHEMA_VERSION
        )));
    }

    let mut seen = HashSet::new();
    for question in &doc.questions {
        if !seen.insert(question.old_question_id) {
            return Err(backup_validation(&format!(
                "Duplicate old_question_id {}",
                question.old_question_id
            )));
        }
    }
    Ok(())
}

/// Check one question of a backup document
///
/// # Errors
///
/// `InvalidInput` if the destination question id is not positive or the
/// matrix repeats a row, col or weight id.
pub fn validate_question(question: &BackupQuestion) -> Result<()> {
    if question.new_question_id <= 0 {
        return Err(backup_validation(&format!(
            "Question {} has invalid new_question_id {}",
            question.old_question_id, question.new_question_id
        ))
        .with_question_id(question.old_question_id));
    }

    let matrix = &question.matrix;
    check_unique(question.old_question_id, "row", matrix.rows.iter().map(|r| r.id))?;
    check_unique(question.old_question_id, "col", matrix.cols.iter().map(|c| c.id))?;
    check_unique(question.old_question_id, "weight", matrix.weights.iter().map(|w| w.id))?;
    Ok(())
}

fn check_unique(
    old_question_id: EntityId,
    what: &str,
    ids: impl Iterator<Item = EntityId>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(backup_validation(&format!(
                "Question {} has duplicate {} id {}",
                old_question_id, what, id
            ))
            .with_question_id(old_question_id));
        }
    }
    Ok(())
}
