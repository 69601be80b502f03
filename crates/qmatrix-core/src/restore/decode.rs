//! Rich-text fields the backup walker must run through its link decoder

/// A table whose listed fields may embed links to other restored entities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeContent {
    pub table: &'static str,
    pub fields: &'static [&'static str],
    /// Mapping kind the decoder uses to locate restored record ids
    pub mapping: &'static str,
}

/// Decode contents for the matrix tables
pub fn decode_contents() -> Vec<DecodeContent> {
    vec![
        DecodeContent {
            table: "question_matrix_cols",
            fields: &["shorttext", "description"],
            mapping: "col",
        },
        DecodeContent {
            table: "question_matrix_rows",
            fields: &["shorttext", "description", "feedback"],
            mapping: "row",
        },
        DecodeContent {
            table: "question_matrix_weights",
            fields: &["rowid", "colid", "weight"],
            mapping: "weight",
        },
    ]
}
