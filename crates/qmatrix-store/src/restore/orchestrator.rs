//! Backup restore orchestration
//!
//! Restores a parsed backup document question by question. Per question:
//! 1. Open a transaction
//! 2. Run a restore pass over the matrix subtree (create or merge)
//! 3. Recode and persist attempt-step responses and legacy answer grids
//! 4. Emit the `question_restored` provenance event and commit
//!
//! A structural failure rolls the question back and is recorded as a
//! `question_failed` event; the remaining questions still run. A response
//! that fails with a response-level error kind is skipped and reported
//! without failing the question.

use std::path::Path;
use std::time::Instant;

use qmatrix_core::errors::{ExError, ExErrorKind};
use qmatrix_core::identity::MappingEntry;
use qmatrix_core::model::EntityId;
use qmatrix_core::recode::{recode_legacy_state_reporting, UnmappedCellReference};
use qmatrix_core::restore::{QuestionAnchor, RestorePass, RestoreSummary};
use qmatrix_core::{log_op_end, log_op_error, log_op_start};
use qmatrix_core_types::{RequestContext, RequestId};
use rusqlite::Connection;
use serde::Serialize;

use crate::backup::{parse_backup_file, validate_question, BackupDocument, BackupQuestion};
use crate::errors::{from_rusqlite, Result};
use crate::repo::{insert_attempt_step, insert_legacy_state, SqliteMatrixStore};
use crate::restore::provenance;

/// A stored answer that was skipped because it could not be recoded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFailure {
    /// Attempt step sequence number; `None` for legacy answer grids
    pub sequence_number: Option<u32>,
    pub code: String,
    pub message: String,
}

impl ResponseFailure {
    fn new(sequence_number: Option<u32>, err: ExError) -> Self {
        Self {
            sequence_number,
            code: err.code().to_string(),
            message: err.message().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuestionOutcome {
    Restored {
        summary: RestoreSummary,
        attempt_steps: usize,
        legacy_states: usize,
        response_failures: Vec<ResponseFailure>,
        /// Legacy grid keys written as the sentinel id
        unmapped_cells: Vec<UnmappedCellReference>,
    },
    Failed {
        code: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionReport {
    pub old_question_id: EntityId,
    pub new_question_id: EntityId,
    pub outcome: QuestionOutcome,
    /// Identity map of the pass; empty when the question failed
    pub mappings: Vec<MappingEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoreReport {
    pub request_id: RequestId,
    pub questions: Vec<QuestionReport>,
}

impl RestoreReport {
    pub fn restored_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| matches!(q.outcome, QuestionOutcome::Restored { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.questions.len() - self.restored_count()
    }

    /// True when every question restored, even if some responses were skipped
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Parse a backup file and restore it
///
/// # Errors
///
/// Parse and validation errors, plus any error from [`restore_backup`].
pub fn restore_backup_file(conn: &mut Connection, path: &Path) -> Result<RestoreReport> {
    let doc = parse_backup_file(path)?;
    restore_backup(conn, &doc)
}

/// Restore every question of a backup document
///
/// Per-question failures are reported in the returned [`RestoreReport`].
///
/// # Errors
///
/// Only failures to record provenance outside a question transaction are
/// returned as errors.
pub fn restore_backup(conn: &mut Connection, doc: &BackupDocument) -> Result<RestoreReport> {
    let mut ctx = RequestContext::new();
    ctx.source = doc.label.clone();
    restore_backup_with_context(conn, doc, &ctx)
}

/// [`restore_backup`] under a caller-supplied request context
///
/// # Errors
///
/// See [`restore_backup`].
pub fn restore_backup_with_context(
    conn: &mut Connection,
    doc: &BackupDocument,
    ctx: &RequestContext,
) -> Result<RestoreReport> {
    let request_id = &ctx.request_id;
    log_op_start!(
        "restore_backup",
        request_id = request_id.as_str(),
        questions = doc.questions.len()
    );
    let start = Instant::now();

    provenance::emit_started(
        conn,
        request_id.as_str(),
        ctx.source.as_deref(),
        doc.questions.len(),
    )?;

    let mut questions = Vec::with_capacity(doc.questions.len());
    for question in &doc.questions {
        let report = match restore_question(conn, request_id, question) {
            Ok(report) => report,
            Err(err) => {
                // the question's transaction is gone; record the failure outside it
                provenance::emit_question_failed(
                    conn,
                    request_id.as_str(),
                    question.old_question_id,
                    err.code(),
                    err.message(),
                )?;
                QuestionReport {
                    old_question_id: question.old_question_id,
                    new_question_id: question.new_question_id,
                    outcome: QuestionOutcome::Failed {
                        code: err.code().to_string(),
                        message: err.message().to_string(),
                    },
                    mappings: Vec::new(),
                }
            }
        };
        questions.push(report);
    }

    let report = RestoreReport {
        request_id: request_id.clone(),
        questions,
    };

    provenance::emit_completed(
        conn,
        request_id.as_str(),
        report.restored_count(),
        report.failed_count(),
    )?;

    log_op_end!(
        "restore_backup",
        duration_ms = start.elapsed().as_millis() as u64,
        restored = report.restored_count(),
        failed = report.failed_count()
    );

    Ok(report)
}

/// Restore one question inside its own transaction
///
/// # Errors
///
/// `InvalidInput` if the question fails [`validate_question`], otherwise any
/// structural restore error or persistence failure. The transaction is
/// rolled back before the error is returned.
pub fn restore_question(
    conn: &mut Connection,
    request_id: &RequestId,
    question: &BackupQuestion,
) -> Result<QuestionReport> {
    let old_question_id = question.old_question_id;
    log_op_start!(
        "restore_question",
        request_id = request_id.as_str(),
        question_id = old_question_id,
        created = question.question_created
    );
    let start = Instant::now();

    let result = restore_question_impl(conn, request_id, question);

    match &result {
        Ok(_) => {
            log_op_end!(
                "restore_question",
                duration_ms = start.elapsed().as_millis() as u64,
                question_id = old_question_id
            );
        }
        Err(err) => {
            log_op_error!(
                "restore_question",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                question_id = old_question_id
            );
        }
    }

    result
}

fn restore_question_impl(
    conn: &mut Connection,
    request_id: &RequestId,
    question: &BackupQuestion,
) -> Result<QuestionReport> {
    let old_question_id = question.old_question_id;
    let new_question_id = question.new_question_id;
    let anchor = QuestionAnchor {
        old_question_id,
        new_question_id,
        created: question.question_created,
    };
    let question_error = |err: qmatrix_core::RestoreError| {
        ExError::from(err)
            .with_question_id(old_question_id)
            .with_request_id(request_id.clone())
    };

    validate_question(question)?;
    let tx = conn.transaction().map_err(from_rusqlite)?;

    let (summary, mappings, recoded) = {
        let mut store = SqliteMatrixStore::new(&tx);
        let mut pass = RestorePass::new(&mut store, anchor).with_request_id(request_id.clone());

        let summary = pass
            .restore_structure(&question.matrix)
            .map_err(question_error)?;

        let mut recoded = RecodedAnswers::default();
        for step in &question.attempts {
            let response = step.response_data();
            match pass.recode_response(new_question_id, step.sequence_number, &response) {
                Ok(data) => {
                    insert_attempt_step(&tx, new_question_id, step.sequence_number, &data)?;
                    recoded.attempt_steps += 1;
                }
                Err(err) => recoded.skip(Some(step.sequence_number), question_error(err))?,
            }
        }

        for state in &question.legacy_states {
            match recode_legacy_state_reporting(pass.mapper(), state) {
                Ok((encoded, unmapped)) => {
                    insert_legacy_state(&tx, new_question_id, &encoded)?;
                    recoded.legacy_states += 1;
                    recoded.unmapped_cells.extend(unmapped);
                }
                Err(err) => recoded.skip(None, question_error(err))?,
            }
        }

        (summary, pass.into_mapper().entries().to_vec(), recoded)
    };

    if !recoded.unmapped_cells.is_empty() {
        tracing::warn!(
            op = "restore_question",
            question_id = old_question_id,
            err_code = ExErrorKind::UnmappedCellReference.code(),
            count = recoded.unmapped_cells.len(),
            "legacy answers reference ids outside the restored matrix"
        );
    }

    provenance::emit_question_restored(
        &tx,
        request_id.as_str(),
        old_question_id,
        new_question_id,
        summary.created,
    )?;
    tx.commit().map_err(from_rusqlite)?;

    Ok(QuestionReport {
        old_question_id,
        new_question_id,
        outcome: QuestionOutcome::Restored {
            summary,
            attempt_steps: recoded.attempt_steps,
            legacy_states: recoded.legacy_states,
            response_failures: recoded.failures,
            unmapped_cells: recoded.unmapped_cells,
        },
        mappings,
    })
}

#[derive(Default)]
struct RecodedAnswers {
    attempt_steps: usize,
    legacy_states: usize,
    failures: Vec<ResponseFailure>,
    unmapped_cells: Vec<UnmappedCellReference>,
}

impl RecodedAnswers {
    /// Record a response that could not be recoded, or hand back errors that
    /// abort the whole question
    fn skip(&mut self, sequence_number: Option<u32>, err: ExError) -> Result<()> {
        if err.kind().is_fatal_for_question() {
            return Err(err);
        }
        tracing::warn!(
            op = "restore_question",
            question_id = err.question_id(),
            sequence_number,
            err_code = err.code(),
            "stored response skipped"
        );
        self.failures.push(ResponseFailure::new(sequence_number, err));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_records_response_level_errors() {
        let mut recoded = RecodedAnswers::default();
        let err = ExError::new(ExErrorKind::MissingOrderReference).with_message("row 9");
        recoded.skip(Some(3), err).unwrap();
        assert_eq!(recoded.failures.len(), 1);
        assert_eq!(recoded.failures[0].sequence_number, Some(3));
        assert_eq!(recoded.failures[0].code, "ERR_MISSING_ORDER_REFERENCE");
    }

    #[test]
    fn test_skip_propagates_structural_errors() {
        let mut recoded = RecodedAnswers::default();
        let err = ExError::new(ExErrorKind::Persistence).with_message("disk full");
        let returned = recoded.skip(None, err).unwrap_err();
        assert_eq!(returned.kind(), ExErrorKind::Persistence);
        assert!(recoded.failures.is_empty());
    }
}
