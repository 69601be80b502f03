//! Lookup cache owned by one restore pass
//!
//! Memoizes the destination matrix and weights per question id so merge
//! mode does not re-query the store for every weight. Dropped with the pass.

use std::collections::HashMap;

use crate::errors::Result;
use crate::model::{EntityId, Matrix, Weight};
use crate::ops::MatrixStore;

#[derive(Debug, Default)]
pub struct MatrixLookupCache {
    matrices: HashMap<EntityId, Option<Matrix>>,
    weights: HashMap<EntityId, Vec<Weight>>,
}

impl MatrixLookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matrix owned by a destination question
    pub fn matrix_for_question<S: MatrixStore + ?Sized>(
        &mut self,
        store: &S,
        question_id: EntityId,
    ) -> Result<Option<&Matrix>> {
        if !self.matrices.contains_key(&question_id) {
            let matrix = store.matrix_by_question_id(question_id)?;
            self.matrices.insert(question_id, matrix);
        }
        Ok(self.matrices.get(&question_id).and_then(Option::as_ref))
    }

    /// Existing weights of a destination question
    pub fn weights_for_question<S: MatrixStore + ?Sized>(
        &mut self,
        store: &S,
        question_id: EntityId,
    ) -> Result<&[Weight]> {
        if !self.weights.contains_key(&question_id) {
            let weights = store.weights_by_question_id(question_id)?;
            self.weights.insert(question_id, weights);
        }
        Ok(self
            .weights
            .get(&question_id)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Forget everything cached for a question after writing to it
    pub fn invalidate(&mut self, question_id: EntityId) {
        self.matrices.remove(&question_id);
        self.weights.remove(&question_id);
    }
}
