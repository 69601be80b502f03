//! Provenance event tracking for restores
//!
//! Records events in the restore_events table, correlated by request id

use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use serde::Serialize;

/// Provenance event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvenanceKind {
    /// Backup restore started
    RestoreStarted,
    /// One question committed
    QuestionRestored,
    /// One question rolled back
    QuestionFailed,
    /// Backup restore finished, whatever the per-question outcomes
    RestoreCompleted,
}

impl ProvenanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvenanceKind::RestoreStarted => "restore_started",
            ProvenanceKind::QuestionRestored => "question_restored",
            ProvenanceKind::QuestionFailed => "question_failed",
            ProvenanceKind::RestoreCompleted => "restore_completed",
        }
    }
}

/// A stored provenance event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoreEvent {
    pub kind: String,
    pub correlation_id: String,
    pub timestamp: i64,
    pub metadata: serde_json::Value,
}

/// Emit a provenance event
///
/// Accepts a plain connection or, through deref, an open transaction.
pub fn emit_event(
    conn: &Connection,
    kind: ProvenanceKind,
    correlation_id: &str,
    metadata: serde_json::Value,
) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    let metadata_str = serde_json::to_string(&metadata).unwrap_or_else(|_| "{}".to_string());

    conn.execute(
        "INSERT INTO restore_events (kind, correlation_id, timestamp, metadata) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![kind.as_str(), correlation_id, now, metadata_str],
    )
    .map_err(from_rusqlite)?;

    Ok(())
}

pub fn emit_started(
    conn: &Connection,
    correlation_id: &str,
    label: Option<&str>,
    questions: usize,
) -> Result<()> {
    emit_event(
        conn,
        ProvenanceKind::RestoreStarted,
        correlation_id,
        serde_json::json!({
            "label": label,
            "questions": questions,
        }),
    )
}

pub fn emit_question_restored(
    conn: &Connection,
    correlation_id: &str,
    old_question_id: i64,
    new_question_id: i64,
    created: bool,
) -> Result<()> {
    emit_event(
        conn,
        ProvenanceKind::QuestionRestored,
        correlation_id,
        serde_json::json!({
            "old_question_id": old_question_id,
            "new_question_id": new_question_id,
            "created": created,
        }),
    )
}

pub fn emit_question_failed(
    conn: &Connection,
    correlation_id: &str,
    old_question_id: i64,
    code: &str,
    message: &str,
) -> Result<()> {
    emit_event(
        conn,
        ProvenanceKind::QuestionFailed,
        correlation_id,
        serde_json::json!({
            "old_question_id": old_question_id,
            "err_code": code,
            "message": message,
        }),
    )
}

pub fn emit_completed(
    conn: &Connection,
    correlation_id: &str,
    restored: usize,
    failed: usize,
) -> Result<()> {
    emit_event(
        conn,
        ProvenanceKind::RestoreCompleted,
        correlation_id,
        serde_json::json!({
            "restored": restored,
            "failed": failed,
        }),
    )
}

/// All events recorded under one request id, oldest first
pub fn events_for_request(conn: &Connection, correlation_id: &str) -> Result<Vec<RestoreEvent>> {
    let mut stmt = conn
        .prepare(
            "SELECT kind, correlation_id, timestamp, metadata FROM restore_events
             WHERE correlation_id = ?1 ORDER BY id",
        )
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([correlation_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .map_err(from_rusqlite)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(from_rusqlite)?;

    rows.into_iter()
        .map(|(kind, correlation_id, timestamp, metadata)| {
            Ok(RestoreEvent {
                kind,
                correlation_id,
                timestamp,
                metadata: serde_json::from_str(&metadata).map_err(crate::errors::from_serde_json)?,
            })
        })
        .collect()
}
