//! Stored answers: attempt-step data and legacy answer grids

use crate::errors::{from_rusqlite, Result};
use qmatrix_core::model::EntityId;
use qmatrix_core::recode::ResponseData;
use rusqlite::Connection;
use serde::Serialize;

/// One attempt step as stored for a question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredAttemptStep {
    pub sequence_number: u32,
    pub response: ResponseData,
}

/// Persist every name/value pair of a response
pub fn insert_attempt_step(
    conn: &Connection,
    question_id: EntityId,
    sequence_number: u32,
    response: &ResponseData,
) -> Result<()> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO attempt_step_data (questionid, sequencenumber, name, value)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .map_err(from_rusqlite)?;
    for (name, value) in response {
        stmt.execute(rusqlite::params![question_id, sequence_number, name, value])
            .map_err(from_rusqlite)?;
    }
    Ok(())
}

/// Attempt steps of a question grouped by sequence number
pub fn attempt_steps_for_question(
    conn: &Connection,
    question_id: EntityId,
) -> Result<Vec<StoredAttemptStep>> {
    let mut stmt = conn
        .prepare(
            "SELECT sequencenumber, name, value FROM attempt_step_data
             WHERE questionid = ?1 ORDER BY sequencenumber, id",
        )
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([question_id], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(from_rusqlite)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(from_rusqlite)?;

    let mut steps: Vec<StoredAttemptStep> = Vec::new();
    for (sequence_number, name, value) in rows {
        match steps.last_mut() {
            Some(step) if step.sequence_number == sequence_number => {
                step.response.insert(name, value);
            }
            _ => steps.push(StoredAttemptStep {
                sequence_number,
                response: ResponseData::from([(name, value)]),
            }),
        }
    }
    Ok(steps)
}

pub fn insert_legacy_state(conn: &Connection, question_id: EntityId, answer: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO legacy_states (questionid, answer) VALUES (?1, ?2)",
        rusqlite::params![question_id, answer],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

pub fn legacy_states_for_question(conn: &Connection, question_id: EntityId) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT answer FROM legacy_states WHERE questionid = ?1 ORDER BY id")
        .map_err(from_rusqlite)?;
    let answers = stmt
        .query_map([question_id], |row| row.get(0))
        .map_err(from_rusqlite)?
        .collect::<rusqlite::Result<Vec<String>>>()
        .map_err(from_rusqlite)?;
    Ok(answers)
}
