//! One restore pass over a single question's matrix subtree

use std::time::Instant;

use qmatrix_core_types::RequestId;
use serde::Serialize;

use crate::errors::{RestoreError, Result};
use crate::identity::{IdentityMapper, MappingKind};
use crate::model::{DimensionKind, EntityId, NewDimension, NewMatrix, NewWeight};
use crate::ops::MatrixStore;
use crate::recode::{self, ResponseData};
use crate::restore::cache::MatrixLookupCache;
use crate::restore::matcher::{DimensionMatcher, DimensionProbe, ExactContentMatcher};
use crate::restore::records::{DimensionRecord, MatrixBackup, MatrixRecord, WeightRecord};
use crate::{log_op_end, log_op_error, log_op_start};

/// The question a pass restores into, as resolved by the backup walker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionAnchor {
    pub old_question_id: EntityId,
    pub new_question_id: EntityId,
    /// True when the walker inserted a fresh question (create mode)
    pub created: bool,
}

/// Counts of what a structural restore touched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreSummary {
    pub matrix_id: EntityId,
    pub created: bool,
    pub rows: usize,
    pub cols: usize,
    pub weights: usize,
}

/// Restore state for one question
///
/// Owns the identity map and lookup cache for the pass; both are discarded
/// with it. The create/merge mode is fixed by the question anchor.
pub struct RestorePass<'s, S: MatrixStore + ?Sized, M: DimensionMatcher = ExactContentMatcher> {
    store: &'s mut S,
    matcher: M,
    mapper: IdentityMapper,
    cache: MatrixLookupCache,
    old_question_id: EntityId,
    current_matrix: Option<EntityId>,
    request_id: RequestId,
}

impl<'s, S: MatrixStore + ?Sized> RestorePass<'s, S> {
    pub fn new(store: &'s mut S, anchor: QuestionAnchor) -> Self {
        let mapper = IdentityMapper::for_question(
            anchor.old_question_id,
            anchor.new_question_id,
            anchor.created,
        );
        Self::with_mapper(store, mapper, anchor.old_question_id)
    }

    /// Start a pass from a mapper the walker already seeded
    pub fn with_mapper(store: &'s mut S, mapper: IdentityMapper, old_question_id: EntityId) -> Self {
        Self {
            store,
            matcher: ExactContentMatcher,
            mapper,
            cache: MatrixLookupCache::new(),
            old_question_id,
            current_matrix: None,
            request_id: RequestId::new(),
        }
    }
}

impl<'s, S: MatrixStore + ?Sized, M: DimensionMatcher> RestorePass<'s, S, M> {
    /// Swap the merge-mode dimension matcher
    pub fn with_matcher<M2: DimensionMatcher>(self, matcher: M2) -> RestorePass<'s, S, M2> {
        RestorePass {
            store: self.store,
            matcher,
            mapper: self.mapper,
            cache: self.cache,
            old_question_id: self.old_question_id,
            current_matrix: self.current_matrix,
            request_id: self.request_id,
        }
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn mapper(&self) -> &IdentityMapper {
        &self.mapper
    }

    pub fn into_mapper(self) -> IdentityMapper {
        self.mapper
    }

    /// Whether this pass creates fresh records (true) or merges (false)
    pub fn is_question_created(&self) -> bool {
        self.mapper.has_question_created(self.old_question_id)
    }

    fn new_question_id(&self) -> Option<EntityId> {
        self.mapper.get(MappingKind::Question, self.old_question_id)
    }

    /// Restore a whole matrix subtree in document order
    ///
    /// # Errors
    ///
    /// Propagates the first fatal error; the caller must roll back.
    pub fn restore_structure(&mut self, backup: &MatrixBackup) -> Result<RestoreSummary> {
        let question_id = self.old_question_id;
        log_op_start!(
            "restore_structure",
            question_id = question_id,
            request_id = self.request_id.as_str()
        );
        let start = Instant::now();

        let summary = self.restore_structure_impl(backup).map_err(|e| {
            log_op_error!(
                "restore_structure",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                question_id = question_id
            );
            e
        })?;

        log_op_end!(
            "restore_structure",
            duration_ms = start.elapsed().as_millis() as u64,
            question_id = question_id,
            created = summary.created
        );

        Ok(summary)
    }

    fn restore_structure_impl(&mut self, backup: &MatrixBackup) -> Result<RestoreSummary> {
        let matrix_id = self.process_matrix(&backup.record())?;
        for row in &backup.rows {
            self.process_row(row)?;
        }
        for col in &backup.cols {
            self.process_col(col)?;
        }
        for weight in &backup.weights {
            self.process_weight(weight)?;
        }
        Ok(RestoreSummary {
            matrix_id,
            created: self.is_question_created(),
            rows: backup.rows.len(),
            cols: backup.cols.len(),
            weights: backup.weights.len(),
        })
    }

    /// Process the `/matrix` element
    ///
    /// # Errors
    ///
    /// `MissingMatrixRecord` in merge mode when the destination question owns
    /// no matrix.
    pub fn process_matrix(&mut self, record: &MatrixRecord) -> Result<EntityId> {
        let question_id = self
            .new_question_id()
            .ok_or(RestoreError::UnmappedParent {
                kind: MappingKind::Question,
                old_id: self.old_question_id,
            })?;

        let new_matrix_id = if self.is_question_created() {
            let id = self.store.insert_matrix(&NewMatrix {
                question_id,
                options: record.options.clone(),
            })?;
            self.cache.invalidate(question_id);
            id
        } else {
            match self.cache.matrix_for_question(&*self.store, question_id)? {
                Some(matrix) => matrix.id,
                None => return Err(RestoreError::MissingMatrixRecord { question_id }),
            }
        };

        self.mapper
            .put(MappingKind::Matrix, record.id, new_matrix_id)?;
        self.current_matrix = Some(record.id);
        tracing::debug!(
            mapping_kind = "matrix",
            old_id = record.id,
            new_id = new_matrix_id,
            "matrix mapped"
        );
        Ok(new_matrix_id)
    }

    /// Process a `/matrix/rows/row` element
    ///
    /// # Errors
    ///
    /// See [`RestorePass::process_dimension`].
    pub fn process_row(&mut self, record: &DimensionRecord) -> Result<EntityId> {
        self.process_dimension(DimensionKind::Row, record)
    }

    /// Process a `/matrix/cols/col` element
    ///
    /// # Errors
    ///
    /// See [`RestorePass::process_dimension`].
    pub fn process_col(&mut self, record: &DimensionRecord) -> Result<EntityId> {
        self.process_dimension(DimensionKind::Col, record)
    }

    /// Create or match a row/column under the current matrix
    ///
    /// # Errors
    ///
    /// `UnmappedParent` if no matrix was processed yet,
    /// `MissingDimensionRecord` in merge mode when nothing matches.
    pub fn process_dimension(
        &mut self,
        kind: DimensionKind,
        record: &DimensionRecord,
    ) -> Result<EntityId> {
        let old_matrix_id = self.current_matrix.ok_or(RestoreError::UnmappedParent {
            kind: MappingKind::Matrix,
            old_id: 0,
        })?;
        let matrix_id = self.mapper.require(MappingKind::Matrix, old_matrix_id)?;

        let new_id = if self.is_question_created() {
            self.store.insert_dimension(&NewDimension {
                matrix_id,
                kind,
                shorttext: record.shorttext.clone(),
                description: record.description.clone(),
                feedback: kind
                    .has_feedback()
                    .then(|| record.feedback.clone().unwrap_or_default()),
            })?
        } else {
            let existing = self.store.dimensions_by_matrix_id(kind, matrix_id)?;
            let probe = DimensionProbe::from_record(kind, record);
            self.matcher
                .find(&existing, &probe)
                .map(|d| d.id)
                .ok_or(RestoreError::MissingDimensionRecord {
                    kind,
                    old_id: record.id,
                    matrix_id,
                })?
        };

        self.mapper.put(kind.into(), record.id, new_id)?;
        tracing::debug!(
            mapping_kind = kind.as_str(),
            old_id = record.id,
            new_id,
            "dimension mapped"
        );
        Ok(new_id)
    }

    /// Process a `/matrix/weights/weight` element
    ///
    /// Create mode inserts without checking for an existing (row, col) pair.
    ///
    /// # Errors
    ///
    /// `UnmappedParent` in create mode when an endpoint is unmapped,
    /// `MissingWeightRecord` in merge mode when no destination weight matches.
    pub fn process_weight(&mut self, record: &WeightRecord) -> Result<EntityId> {
        let new_id = if self.is_question_created() {
            let row_id = self.mapper.require(MappingKind::Row, record.row_id)?;
            let col_id = self.mapper.require(MappingKind::Col, record.col_id)?;
            self.store.insert_weight(&NewWeight {
                row_id,
                col_id,
                weight: record.weight,
            })?
        } else {
            self.resolve_existing_weight(record)?
        };

        self.mapper.put(MappingKind::Weight, record.id, new_id)?;
        Ok(new_id)
    }

    /// Find the destination weight for a backup weight without mapping it
    ///
    /// # Errors
    ///
    /// `MissingWeightRecord` when an endpoint or the destination question is
    /// unmapped, or no existing weight has the resolved (row, col) pair.
    pub fn resolve_existing_weight(&mut self, record: &WeightRecord) -> Result<EntityId> {
        let missing = || RestoreError::MissingWeightRecord {
            old_id: record.id,
            old_row_id: record.row_id,
            old_col_id: record.col_id,
        };

        let (Some(row_id), Some(col_id), Some(question_id)) = (
            self.mapper.get(MappingKind::Row, record.row_id),
            self.mapper.get(MappingKind::Col, record.col_id),
            self.new_question_id(),
        ) else {
            return Err(missing());
        };

        self.cache
            .weights_for_question(&*self.store, question_id)?
            .iter()
            .find(|w| w.row_id == row_id && w.col_id == col_id)
            .map(|w| w.id)
            .ok_or_else(missing)
    }

    /// Recode one stored attempt-step response
    ///
    /// # Errors
    ///
    /// `MissingOrderReferenceId` when the `_order` entry cannot be recoded.
    pub fn recode_response(
        &self,
        question_id: EntityId,
        sequence_number: u32,
        response: &ResponseData,
    ) -> Result<ResponseData> {
        recode::recode_response(&self.mapper, question_id, sequence_number, response)
    }

    /// Recode a legacy serialized answer grid
    ///
    /// # Errors
    ///
    /// `InvalidLegacyState` when the payload cannot be decoded.
    pub fn recode_legacy_state(&self, state: &str) -> Result<String> {
        recode::recode_legacy_state(&self.mapper, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MatrixOptions;
    use crate::ops::InMemoryStore;

    fn anchor(created: bool) -> QuestionAnchor {
        QuestionAnchor {
            old_question_id: 1,
            new_question_id: 100,
            created,
        }
    }

    fn matrix_record() -> MatrixRecord {
        MatrixRecord {
            id: 7,
            options: MatrixOptions::default(),
        }
    }

    #[test]
    fn test_row_before_matrix_is_rejected() {
        let mut store = InMemoryStore::new();
        let mut pass = RestorePass::new(&mut store, anchor(true));
        let err = pass
            .process_row(&DimensionRecord {
                id: 1,
                shorttext: "A".to_string(),
                description: Default::default(),
                feedback: None,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            RestoreError::UnmappedParent {
                kind: MappingKind::Matrix,
                ..
            }
        ));
        assert_eq!(store.dimension_count(DimensionKind::Row), 0);
    }

    #[test]
    fn test_merge_without_matrix_fails() {
        let mut store = InMemoryStore::new();
        let mut pass = RestorePass::new(&mut store, anchor(false));
        let err = pass.process_matrix(&matrix_record()).unwrap_err();
        assert_eq!(err, RestoreError::MissingMatrixRecord { question_id: 100 });
    }

    #[test]
    fn test_create_weight_with_unmapped_endpoint_fails() {
        let mut store = InMemoryStore::new();
        let mut pass = RestorePass::new(&mut store, anchor(true));
        pass.process_matrix(&matrix_record()).unwrap();
        let err = pass
            .process_weight(&WeightRecord {
                id: 1,
                row_id: 11,
                col_id: 21,
                weight: 1.0,
            })
            .unwrap_err();
        assert_eq!(
            err,
            RestoreError::UnmappedParent {
                kind: MappingKind::Row,
                old_id: 11
            }
        );
    }
}
