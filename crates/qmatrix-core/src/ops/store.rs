use std::collections::BTreeMap;

use crate::errors::Result;
use crate::model::{
    Dimension, DimensionKind, EntityId, Matrix, NewDimension, NewMatrix, NewWeight, Weight,
};

/// Destination storage as seen by the restore engine
///
/// Implementations run inside whatever transaction the caller opened; the
/// engine never commits or rolls back on its own.
pub trait MatrixStore {
    /// Insert a matrix and return its new id
    fn insert_matrix(&mut self, matrix: &NewMatrix) -> Result<EntityId>;

    /// The matrix owned by a question, if any
    fn matrix_by_question_id(&self, question_id: EntityId) -> Result<Option<Matrix>>;

    /// Insert a row or column and return its new id
    fn insert_dimension(&mut self, dimension: &NewDimension) -> Result<EntityId>;

    /// Rows or columns of a matrix in store order (ascending id)
    fn dimensions_by_matrix_id(
        &self,
        kind: DimensionKind,
        matrix_id: EntityId,
    ) -> Result<Vec<Dimension>>;

    /// Insert a weight and return its new id
    fn insert_weight(&mut self, weight: &NewWeight) -> Result<EntityId>;

    /// Every weight whose row or column belongs to the question's matrix
    fn weights_by_question_id(&self, question_id: EntityId) -> Result<Vec<Weight>>;
}

/// In-memory store
///
/// Single-threaded, id-ordered maps. Used by tests and by callers that
/// restore into a scratch area before persisting.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    pub(crate) matrices: BTreeMap<EntityId, Matrix>,
    pub(crate) dimensions: BTreeMap<EntityId, Dimension>,
    pub(crate) weights: BTreeMap<EntityId, Weight>,
    next_id: EntityId,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> EntityId {
        self.next_id += 1;
        self.next_id
    }

    pub fn matrix_count(&self) -> usize {
        self.matrices.len()
    }

    pub fn dimension_count(&self, kind: DimensionKind) -> usize {
        self.dimensions.values().filter(|d| d.kind == kind).count()
    }

    pub fn weight_count(&self) -> usize {
        self.weights.len()
    }

    pub fn get_dimension(&self, id: EntityId) -> Option<&Dimension> {
        self.dimensions.get(&id)
    }

    pub fn get_weight(&self, id: EntityId) -> Option<&Weight> {
        self.weights.get(&id)
    }
}

impl MatrixStore for InMemoryStore {
    fn insert_matrix(&mut self, matrix: &NewMatrix) -> Result<EntityId> {
        let id = self.allocate();
        self.matrices.insert(
            id,
            Matrix {
                id,
                question_id: matrix.question_id,
                options: matrix.options.clone(),
            },
        );
        Ok(id)
    }

    fn matrix_by_question_id(&self, question_id: EntityId) -> Result<Option<Matrix>> {
        Ok(self
            .matrices
            .values()
            .find(|m| m.question_id == question_id)
            .cloned())
    }

    fn insert_dimension(&mut self, dimension: &NewDimension) -> Result<EntityId> {
        let id = self.allocate();
        self.dimensions.insert(
            id,
            Dimension {
                id,
                matrix_id: dimension.matrix_id,
                kind: dimension.kind,
                shorttext: dimension.shorttext.clone(),
                description: dimension.description.clone(),
                feedback: dimension.feedback.clone(),
            },
        );
        Ok(id)
    }

    fn dimensions_by_matrix_id(
        &self,
        kind: DimensionKind,
        matrix_id: EntityId,
    ) -> Result<Vec<Dimension>> {
        Ok(self
            .dimensions
            .values()
            .filter(|d| d.kind == kind && d.matrix_id == matrix_id)
            .cloned()
            .collect())
    }

    fn insert_weight(&mut self, weight: &NewWeight) -> Result<EntityId> {
        let id = self.allocate();
        self.weights.insert(
            id,
            Weight {
                id,
                row_id: weight.row_id,
                col_id: weight.col_id,
                weight: weight.weight,
            },
        );
        Ok(id)
    }

    fn weights_by_question_id(&self, question_id: EntityId) -> Result<Vec<Weight>> {
        let Some(matrix) = self.matrix_by_question_id(question_id)? else {
            return Ok(Vec::new());
        };
        let owned = |id: EntityId| {
            self.dimensions
                .get(&id)
                .is_some_and(|d| d.matrix_id == matrix.id)
        };
        Ok(self
            .weights
            .values()
            .filter(|w| owned(w.row_id) || owned(w.col_id))
            .cloned()
            .collect())
    }
}
