//! Backup document format
//!
//! YAML schema:
//!
//! ```yaml
//! schema_version: 1
//! label: course-42          # optional
//! questions:
//!   - old_question_id: 12
//!     new_question_id: 500
//!     question_created: true
//!     matrix:
//!       id: 3
//!       grademethod: kprime
//!       rows: [{id: 4, shorttext: A, description: "<p>a</p>", feedback: ""}]
//!       cols: [{id: 6, shorttext: "True"}]
//!       weights: [{id: 8, rowid: 4, colid: 6, weight: 1.0}]
//!     legacy_states: ['a:1:{i:4;a:1:{i:6;s:1:"1";}}']
//!     attempts:
//!       - sequence_number: 0
//!         response: {_order: "4", cell4: 6}
//! ```

use qmatrix_core::model::EntityId;
use qmatrix_core::recode::ResponseData;
use qmatrix_core::restore::MatrixBackup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Supported document schema version
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDocument {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub questions: Vec<BackupQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupQuestion {
    pub old_question_id: EntityId,
    pub new_question_id: EntityId,
    /// Whether the walker created the destination question (create mode)
    #[serde(default)]
    pub question_created: bool,
    pub matrix: MatrixBackup,
    #[serde(default)]
    pub legacy_states: Vec<String>,
    #[serde(default)]
    pub attempts: Vec<AttemptStepDoc>,
}

/// Scalar response value; YAML gives numbers and booleans their own types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl std::fmt::Display for ResponseValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseValue::Int(n) => write!(f, "{}", n),
            ResponseValue::Float(x) => write!(f, "{}", x),
            ResponseValue::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
            ResponseValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptStepDoc {
    pub sequence_number: u32,
    #[serde(default)]
    pub response: BTreeMap<String, ResponseValue>,
}

impl AttemptStepDoc {
    /// The response as stored name/value text pairs
    pub fn response_data(&self) -> ResponseData {
        self.response
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}
