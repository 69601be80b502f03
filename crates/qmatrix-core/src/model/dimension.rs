use serde::{Deserialize, Serialize};

use super::{EntityId, RichText};

/// Which axis of the matrix a dimension record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
    Row,
    Col,
}

impl DimensionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionKind::Row => "row",
            DimensionKind::Col => "col",
        }
    }

    /// Rows carry feedback, columns do not
    pub fn has_feedback(&self) -> bool {
        matches!(self, DimensionKind::Row)
    }
}

impl std::fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored row or column of a matrix
///
/// `feedback` is always `None` for columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub id: EntityId,
    pub matrix_id: EntityId,
    pub kind: DimensionKind,
    pub shorttext: String,
    pub description: RichText,
    pub feedback: Option<RichText>,
}

/// Row or column values to insert; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDimension {
    pub matrix_id: EntityId,
    pub kind: DimensionKind,
    pub shorttext: String,
    pub description: RichText,
    pub feedback: Option<RichText>,
}
