use qmatrix_core_types::RequestId;
use thiserror::Error;

use crate::identity::MappingKind;
use crate::model::{DimensionKind, EntityId};

/// Result type alias using RestoreError
pub type Result<T> = std::result::Result<T, RestoreError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in logs, restore reports and
/// provenance events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural restore
    MissingMatrixRecord,
    MissingDimensionRecord,
    MissingWeightRecord,
    DuplicateMapping,
    MissingMapping,

    // Response recoding
    MissingOrderReference,
    UnmappedCellReference,
    InvalidLegacyState,

    // Validation
    InvalidInput,
    NotFound,
    ConstraintViolation,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::MissingMatrixRecord => "ERR_MISSING_MATRIX_RECORD",
            ExErrorKind::MissingDimensionRecord => "ERR_MISSING_DIMENSION_RECORD",
            ExErrorKind::MissingWeightRecord => "ERR_MISSING_WEIGHT_RECORD",
            ExErrorKind::DuplicateMapping => "ERR_DUPLICATE_MAPPING",
            ExErrorKind::MissingMapping => "ERR_MISSING_MAPPING",
            ExErrorKind::MissingOrderReference => "ERR_MISSING_ORDER_REFERENCE",
            ExErrorKind::UnmappedCellReference => "ERR_UNMAPPED_CELL_REFERENCE",
            ExErrorKind::InvalidLegacyState => "ERR_INVALID_LEGACY_STATE",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether an error of this kind aborts the surrounding question restore
    pub fn is_fatal_for_question(&self) -> bool {
        !matches!(
            self,
            ExErrorKind::MissingOrderReference
                | ExErrorKind::UnmappedCellReference
                | ExErrorKind::InvalidLegacyState
        )
    }
}

/// Canonical structured error type
///
/// Carries a classification plus the context needed to report which
/// question and entity a restore failed on.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    question_id: Option<EntityId>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            question_id: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add question ID context
    pub fn with_question_id(mut self, question_id: EntityId) -> Self {
        self.question_id = Some(question_id);
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn question_id(&self) -> Option<EntityId> {
        self.question_id
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(question_id) = self.question_id {
            write!(f, " (question_id: {})", question_id)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for restore and recode operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RestoreError {
    /// Merge mode found no matrix owned by the destination question
    #[error("No matrix record exists for destination question {question_id}")]
    MissingMatrixRecord { question_id: EntityId },

    /// Merge mode found no content-equal row or column
    #[error("No matching {kind} record in matrix {matrix_id} for backup {kind} {old_id}")]
    MissingDimensionRecord {
        kind: DimensionKind,
        old_id: EntityId,
        matrix_id: EntityId,
    },

    /// Merge mode could not resolve a weight to an existing destination weight
    #[error("No matching weight record for backup weight {old_id} (row {old_row_id}, col {old_col_id})")]
    MissingWeightRecord {
        old_id: EntityId,
        old_row_id: EntityId,
        old_col_id: EntityId,
    },

    /// An `_order` entry references a row that has no mapping
    #[error("Attempt order references unmapped row id '{row_id}'")]
    MissingOrderReferenceId { row_id: String },

    /// A second mapping was registered for the same key with a different value
    #[error("Mapping {kind}:{old_id} already points to {existing}, refusing {attempted}")]
    DuplicateMapping {
        kind: MappingKind,
        old_id: EntityId,
        existing: EntityId,
        attempted: EntityId,
    },

    /// A structural parent (question, matrix, row or col) was not mapped yet
    #[error("Required {kind} mapping for old id {old_id} is missing")]
    UnmappedParent { kind: MappingKind, old_id: EntityId },

    /// The legacy serialized grid could not be decoded
    #[error("Invalid legacy state: {reason}")]
    InvalidLegacyState { reason: String },

    /// The storage collaborator failed
    #[error("Store failure in {op}: {message}")]
    Store { op: String, message: String },

    /// Serialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl RestoreError {
    /// Build a store failure for the given operation
    pub fn store(op: &str, message: impl Into<String>) -> Self {
        RestoreError::Store {
            op: op.to_string(),
            message: message.into(),
        }
    }
}

/// Conversion from RestoreError to ExError
impl From<RestoreError> for ExError {
    fn from(err: RestoreError) -> Self {
        let message = err.to_string();
        match err {
            RestoreError::MissingMatrixRecord { question_id } => {
                ExError::new(ExErrorKind::MissingMatrixRecord)
                    .with_op("process_matrix")
                    .with_question_id(question_id)
                    .with_message(message)
            }

            RestoreError::MissingDimensionRecord { kind, old_id, .. } => {
                ExError::new(ExErrorKind::MissingDimensionRecord)
                    .with_op(format!("process_{}", kind))
                    .with_entity_id(format!("{}:{}", kind, old_id))
                    .with_message(message)
            }

            RestoreError::MissingWeightRecord { old_id, .. } => {
                ExError::new(ExErrorKind::MissingWeightRecord)
                    .with_op("process_weight")
                    .with_entity_id(format!("weight:{}", old_id))
                    .with_message(message)
            }

            RestoreError::MissingOrderReferenceId { row_id } => {
                ExError::new(ExErrorKind::MissingOrderReference)
                    .with_op("recode_choice_order")
                    .with_entity_id(format!("row:{}", row_id))
                    .with_message(message)
            }

            RestoreError::DuplicateMapping { kind, old_id, .. } => {
                ExError::new(ExErrorKind::DuplicateMapping)
                    .with_op("set_mapping")
                    .with_entity_id(format!("{}:{}", kind, old_id))
                    .with_message(message)
            }

            RestoreError::UnmappedParent { kind, old_id } => {
                ExError::new(ExErrorKind::MissingMapping)
                    .with_entity_id(format!("{}:{}", kind, old_id))
                    .with_message(message)
            }

            RestoreError::InvalidLegacyState { .. } => {
                ExError::new(ExErrorKind::InvalidLegacyState)
                    .with_op("recode_legacy_state")
                    .with_message(message)
            }

            RestoreError::Store { op, .. } => ExError::new(ExErrorKind::Persistence)
                .with_op(op)
                .with_message(message),

            RestoreError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to RestoreError
impl From<serde_json::Error> for RestoreError {
    fn from(err: serde_json::Error) -> Self {
        RestoreError::Serialization {
            message: err.to_string(),
        }
    }
}
