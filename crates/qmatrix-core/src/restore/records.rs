//! Backup records as delivered by the backup walker

use serde::{Deserialize, Serialize};

use crate::model::{lenient, EntityId, MatrixOptions, RichText};

/// `/matrix` element: the old matrix id plus its attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRecord {
    #[serde(deserialize_with = "lenient::int")]
    pub id: EntityId,
    #[serde(flatten)]
    pub options: MatrixOptions,
}

/// `/matrix/rows/row` or `/matrix/cols/col` element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRecord {
    #[serde(deserialize_with = "lenient::int")]
    pub id: EntityId,
    #[serde(default)]
    pub shorttext: String,
    #[serde(default)]
    pub description: RichText,
    /// Only rows carry feedback; absent feedback compares equal to empty text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<RichText>,
}

/// `/matrix/weights/weight` element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    #[serde(deserialize_with = "lenient::int")]
    pub id: EntityId,
    #[serde(rename = "rowid", deserialize_with = "lenient::int")]
    pub row_id: EntityId,
    #[serde(rename = "colid", deserialize_with = "lenient::int")]
    pub col_id: EntityId,
    #[serde(default, deserialize_with = "lenient::float")]
    pub weight: f64,
}

/// A full matrix subtree of a backup, children nested under the matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixBackup {
    #[serde(deserialize_with = "lenient::int")]
    pub id: EntityId,
    #[serde(default)]
    pub rows: Vec<DimensionRecord>,
    #[serde(default)]
    pub cols: Vec<DimensionRecord>,
    #[serde(default)]
    pub weights: Vec<WeightRecord>,
    #[serde(flatten)]
    pub options: MatrixOptions,
}

impl MatrixBackup {
    /// The `/matrix` element on its own
    pub fn record(&self) -> MatrixRecord {
        MatrixRecord {
            id: self.id,
            options: self.options.clone(),
        }
    }
}
