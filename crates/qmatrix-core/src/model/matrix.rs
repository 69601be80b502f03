use serde::{Deserialize, Serialize};

use super::{lenient, EntityId};

/// Grading and display configuration of a matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixOptions {
    /// Name of the grading method applied to the weight grid
    pub grademethod: String,
    /// Multiple answers per row (check boxes) vs. one (radio buttons)
    #[serde(deserialize_with = "lenient::flag")]
    pub multiple: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub shuffleanswers: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub use_dnd_ui: bool,
    pub renderer: String,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            grademethod: "kprime".to_string(),
            multiple: true,
            shuffleanswers: true,
            use_dnd_ui: false,
            renderer: "matrix".to_string(),
        }
    }
}

/// A stored matrix; exactly one per question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    pub id: EntityId,
    pub question_id: EntityId,
    pub options: MatrixOptions,
}

/// Matrix values to insert; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatrix {
    pub question_id: EntityId,
    pub options: MatrixOptions,
}
