//! Question data conversion and content identity hashing.
//!
//! Converts a matrix backup into the canonical question-data shape used to
//! decide whether a backed-up question is content-identical to one already in
//! the destination.
//!
//! ## Canonical form
//!
//! - Rows and columns are keyed by their backup id, with `matrixid` set to the
//!   backup matrix id and rich text forced to HTML format
//! - Weights form a dense `row -> col -> weight` grid defaulting to 0
//! - Hints are dropped
//!
//! ## Identity hash
//!
//! The hash covers content only. Row/column/weight ids and matrix ids are
//! stripped through [`excluded_identity_hash_fields`], rows and columns become
//! arrays in id order and the weight grid becomes a row-major list of values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::errors::{RestoreError, Result};
use crate::model::{EntityId, MatrixOptions, RichText, FORMAT_HTML};
use crate::restore::MatrixBackup;
use crate::weights::WeightGrid;

/// Key of the matrix subtree inside a raw question backup tree
pub const PLUGIN_TREE_KEY: &str = "plugin_qtype_matrix_question";

/// A row or column in question-data form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionData {
    pub id: EntityId,
    pub matrixid: EntityId,
    pub shorttext: String,
    pub description: RichText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<RichText>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuestionOptions {
    pub rows: BTreeMap<EntityId, DimensionData>,
    pub cols: BTreeMap<EntityId, DimensionData>,
    pub weights: WeightGrid,
    #[serde(flatten)]
    pub matrix: MatrixOptions,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuestionData {
    pub options: QuestionOptions,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Value>,
}

fn html(text: &RichText) -> RichText {
    RichText {
        text: text.text.clone(),
        format: FORMAT_HTML,
    }
}

/// Convert a matrix backup into canonical question data.
///
/// ## Arguments
///
/// - `backup`: The matrix subtree as delivered by the backup walker
///
/// ## Returns
///
/// Question data with rows/cols keyed by old id and a dense weight grid.
pub fn convert_backup_to_questiondata(backup: &MatrixBackup) -> QuestionData {
    let rows: BTreeMap<EntityId, DimensionData> = backup
        .rows
        .iter()
        .map(|row| {
            let data = DimensionData {
                id: row.id,
                matrixid: backup.id,
                shorttext: row.shorttext.clone(),
                description: html(&row.description),
                feedback: Some(row.feedback.as_ref().map(html).unwrap_or_default()),
            };
            (row.id, data)
        })
        .collect();

    let cols: BTreeMap<EntityId, DimensionData> = backup
        .cols
        .iter()
        .map(|col| {
            let data = DimensionData {
                id: col.id,
                matrixid: backup.id,
                shorttext: col.shorttext.clone(),
                description: html(&col.description),
                feedback: None,
            };
            (col.id, data)
        })
        .collect();

    let row_ids: Vec<EntityId> = backup.rows.iter().map(|r| r.id).collect();
    let col_ids: Vec<EntityId> = backup.cols.iter().map(|c| c.id).collect();
    let weights = WeightGrid::from_sparse(
        &row_ids,
        &col_ids,
        backup.weights.iter().map(|w| (w.row_id, w.col_id, w.weight)),
    );

    QuestionData {
        options: QuestionOptions {
            rows,
            cols,
            weights,
            matrix: backup.options.clone(),
        },
        hints: Vec::new(),
    }
}

/// Items under a backup list node such as `rows.row`
fn list_items(matrix: &Value, list: &str, item: &str) -> Value {
    match matrix.get(list).and_then(|l| l.get(item)) {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        Some(single @ Value::Object(_)) => Value::Array(vec![single.clone()]),
        _ => Value::Array(Vec::new()),
    }
}

/// Extract the matrix subtree from a raw question backup tree.
///
/// ## Arguments
///
/// - `tree`: Raw question tree containing `plugin_qtype_matrix_question.matrix[0]`
///   with nested `rows.row`, `cols.col` and `weights.weight` lists
///
/// ## Returns
///
/// `None` when the tree has no matrix subtree.
///
/// ## Errors
///
/// Returns `RestoreError::Serialization` if the subtree does not have the
/// expected record shapes.
pub fn matrix_backup_from_tree(tree: &Value) -> Result<Option<MatrixBackup>> {
    let Some(matrix) = tree
        .get(PLUGIN_TREE_KEY)
        .and_then(|p| p.get("matrix"))
        .and_then(|m| m.get(0))
    else {
        return Ok(None);
    };
    let Value::Object(fields) = matrix else {
        return Err(RestoreError::Serialization {
            message: "matrix subtree is not an object".to_string(),
        });
    };

    let mut flat = fields.clone();
    flat.insert("rows".to_string(), list_items(matrix, "rows", "row"));
    flat.insert("cols".to_string(), list_items(matrix, "cols", "col"));
    flat.insert("weights".to_string(), list_items(matrix, "weights", "weight"));

    Ok(Some(serde_json::from_value(Value::Object(flat))?))
}

/// Fields excluded from the content identity hash.
pub fn excluded_identity_hash_fields() -> Vec<&'static str> {
    vec![
        "/options/cols/id",
        "/options/cols/matrixid",
        "/options/rows/id",
        "/options/rows/matrixid",
        "/options/weights/id",
        "/options/weights/rowid",
        "/options/weights/colid",
    ]
}

/// Serialize with rows/cols as id-ordered arrays and weights as row-major values
fn canonical_value(data: &QuestionData) -> Result<Value> {
    let mut value = serde_json::to_value(data)?;
    if let Some(options) = value.get_mut("options").and_then(Value::as_object_mut) {
        let rows: Vec<&DimensionData> = data.options.rows.values().collect();
        let cols: Vec<&DimensionData> = data.options.cols.values().collect();
        options.insert("rows".to_string(), serde_json::to_value(rows)?);
        options.insert("cols".to_string(), serde_json::to_value(cols)?);
        options.insert(
            "weights".to_string(),
            serde_json::to_value(data.options.weights.row_major_values())?,
        );
    }
    Ok(value)
}

/// Remove `segments` from `value`; arrays apply the path to every element
fn strip_path(value: &mut Value, segments: &[&str]) {
    match value {
        Value::Array(items) => {
            for item in items {
                strip_path(item, segments);
            }
        }
        Value::Object(map) => match segments {
            [] => {}
            [last] => {
                map.remove(*last);
            }
            [head, rest @ ..] => {
                if let Some(child) = map.get_mut(*head) {
                    strip_path(child, rest);
                }
            }
        },
        _ => {}
    }
}

/// Canonical question data with hints and the given field paths removed.
///
/// ## Arguments
///
/// - `data`: Converted question data
/// - `exclude`: Slash-separated paths such as `/options/rows/id`
///
/// ## Errors
///
/// Returns `RestoreError::Serialization` if JSON serialization fails.
pub fn remove_excluded_question_data(data: &QuestionData, exclude: &[&str]) -> Result<Value> {
    let mut value = canonical_value(data)?;
    if let Some(map) = value.as_object_mut() {
        map.remove("hints");
    }
    for path in exclude {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        strip_path(&mut value, &segments);
    }
    Ok(value)
}

/// Compute the content identity hash of question data.
///
/// ## Returns
///
/// Hex-encoded SHA256 digest (64 characters)
///
/// ## Errors
///
/// Returns `RestoreError::Serialization` if JSON serialization fails.
pub fn content_identity_hash(data: &QuestionData) -> Result<String> {
    let value = remove_excluded_question_data(data, &excluded_identity_hash_fields())?;
    let canonical = serde_json::to_string(&value)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restore::{DimensionRecord, WeightRecord};

    fn backup(offset: EntityId) -> MatrixBackup {
        MatrixBackup {
            id: 1 + offset,
            rows: vec![
                DimensionRecord {
                    id: 10 + offset,
                    shorttext: "R1".to_string(),
                    description: RichText::html("first"),
                    feedback: None,
                },
                DimensionRecord {
                    id: 11 + offset,
                    shorttext: "R2".to_string(),
                    description: RichText::html(""),
                    feedback: Some(RichText::html("well done")),
                },
            ],
            cols: vec![DimensionRecord {
                id: 20 + offset,
                shorttext: "C1".to_string(),
                description: RichText::default(),
                feedback: None,
            }],
            weights: vec![WeightRecord {
                id: 30 + offset,
                row_id: 10 + offset,
                col_id: 20 + offset,
                weight: 1.0,
            }],
            options: MatrixOptions::default(),
        }
    }

    #[test]
    fn test_conversion_keys_by_old_id() {
        let data = convert_backup_to_questiondata(&backup(0));
        assert_eq!(data.options.rows.len(), 2);
        assert_eq!(data.options.rows[&10].matrixid, 1);
        assert_eq!(
            data.options.rows[&10].feedback,
            Some(RichText::html(""))
        );
        assert_eq!(data.options.cols[&20].feedback, None);
        assert_eq!(data.options.weights.get(10, 20), 1.0);
        assert_eq!(data.options.weights.get(11, 20), 0.0);
    }

    #[test]
    fn test_excluded_fields_are_stripped() {
        let data = convert_backup_to_questiondata(&backup(0));
        let value = remove_excluded_question_data(&data, &excluded_identity_hash_fields()).unwrap();
        let row = &value["options"]["rows"][0];
        assert!(row.get("id").is_none());
        assert!(row.get("matrixid").is_none());
        assert_eq!(row["shorttext"], "R1");
        assert_eq!(value["options"]["weights"], serde_json::json!([[1.0], [0.0]]));
    }

    #[test]
    fn test_hash_ignores_ids() {
        let a = content_identity_hash(&convert_backup_to_questiondata(&backup(0))).unwrap();
        let b = content_identity_hash(&convert_backup_to_questiondata(&backup(1000))).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_hash_changes_with_content() {
        let mut changed = backup(0);
        changed.weights[0].weight = 0.5;
        let a = content_identity_hash(&convert_backup_to_questiondata(&backup(0))).unwrap();
        let b = content_identity_hash(&convert_backup_to_questiondata(&changed)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hints_are_removed() {
        let mut data = convert_backup_to_questiondata(&backup(0));
        data.hints.push(serde_json::json!({"hint": "try again"}));
        let value = remove_excluded_question_data(&data, &[]).unwrap();
        assert!(value.get("hints").is_none());
    }

    #[test]
    fn test_matrix_backup_from_raw_tree() {
        let tree = serde_json::json!({
            "plugin_qtype_matrix_question": {
                "matrix": [{
                    "id": 5,
                    "grademethod": "all",
                    "rows": {"row": [{"id": 6, "shorttext": "A", "description": "d"}]},
                    "cols": {"col": {"id": 7, "shorttext": "X"}},
                    "weights": {"weight": [{"id": 8, "rowid": 6, "colid": 7, "weight": 1.0}]}
                }]
            }
        });
        let backup = matrix_backup_from_tree(&tree).unwrap().unwrap();
        assert_eq!(backup.id, 5);
        assert_eq!(backup.options.grademethod, "all");
        assert_eq!(backup.rows[0].description, RichText::html("d"));
        assert_eq!(backup.cols.len(), 1);
        assert_eq!(backup.weights[0].row_id, 6);

        assert!(matrix_backup_from_tree(&serde_json::json!({})).unwrap().is_none());
    }

    #[test]
    fn test_matrix_backup_from_text_valued_tree() {
        let tree = serde_json::json!({
            "plugin_qtype_matrix_question": {
                "matrix": [{
                    "id": "5",
                    "grademethod": "kprime",
                    "multiple": "0",
                    "shuffleanswers": "1",
                    "use_dnd_ui": "0",
                    "rows": {"row": [{"id": "6", "shorttext": "A", "description": "d"}]},
                    "cols": {"col": {"id": "7", "shorttext": "X"}},
                    "weights": {"weight": {"id": "8", "rowid": "6", "colid": "7", "weight": "1.0000000"}}
                }]
            }
        });
        let backup = matrix_backup_from_tree(&tree).unwrap().unwrap();
        assert_eq!(backup.id, 5);
        assert!(!backup.options.multiple);
        assert!(backup.options.shuffleanswers);
        assert_eq!((backup.rows[0].id, backup.cols[0].id), (6, 7));
        assert_eq!((backup.weights[0].row_id, backup.weights[0].col_id), (6, 7));
        assert_eq!(backup.weights[0].weight, 1.0);

        let data = convert_backup_to_questiondata(&backup);
        assert_eq!(data.options.weights.get(6, 7), 1.0);
    }
}
