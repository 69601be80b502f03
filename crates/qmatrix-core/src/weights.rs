//! Dense weight grid and its sparse storage form
//!
//! Storage keeps a weight only when it is non-zero; an absent (row, col)
//! pair means 0. The dense grid fills every row x col cell.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{EntityId, NewWeight};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightGrid {
    cells: BTreeMap<EntityId, BTreeMap<EntityId, f64>>,
}

impl WeightGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the dense grid for the given rows and columns
    ///
    /// Sparse entries naming a row or column outside the lists are kept, the
    /// same way an over-specified backup would carry them.
    pub fn from_sparse(
        row_ids: &[EntityId],
        col_ids: &[EntityId],
        weights: impl IntoIterator<Item = (EntityId, EntityId, f64)>,
    ) -> Self {
        let mut grid = WeightGrid::new();
        for &row_id in row_ids {
            let row = grid.cells.entry(row_id).or_default();
            for &col_id in col_ids {
                row.insert(col_id, 0.0);
            }
        }
        for (row_id, col_id, weight) in weights {
            grid.set(row_id, col_id, weight);
        }
        grid
    }

    /// Weight at a cell; absent cells are 0
    pub fn get(&self, row_id: EntityId, col_id: EntityId) -> f64 {
        self.cells
            .get(&row_id)
            .and_then(|row| row.get(&col_id))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, row_id: EntityId, col_id: EntityId, weight: f64) {
        self.cells.entry(row_id).or_default().insert(col_id, weight);
    }

    /// True when the grid has no rows at all
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_all_zero(&self) -> bool {
        self.cells.values().flat_map(|row| row.values()).all(|w| *w == 0.0)
    }

    pub fn row_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.cells.keys().copied()
    }

    /// Storage form: one entry per non-zero cell, row-major
    pub fn to_sparse(&self) -> Vec<NewWeight> {
        self.cells
            .iter()
            .flat_map(|(&row_id, row)| {
                row.iter()
                    .filter(|(_, w)| **w != 0.0)
                    .map(move |(&col_id, &weight)| NewWeight {
                        row_id,
                        col_id,
                        weight,
                    })
            })
            .collect()
    }

    /// Cell values row by row, ids dropped
    pub fn row_major_values(&self) -> Vec<Vec<f64>> {
        self.cells
            .values()
            .map(|row| row.values().copied().collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_grid_defaults_to_zero() {
        let grid = WeightGrid::from_sparse(&[1, 2], &[10, 20], [(1, 10, 3.0)]);
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"1": {"10": 3.0, "20": 0.0}, "2": {"10": 0.0, "20": 0.0}})
        );
        assert_eq!(grid.get(2, 20), 0.0);
        assert_eq!(grid.get(9, 9), 0.0);
    }

    #[test]
    fn test_to_sparse_keeps_non_zero_only() {
        let grid = WeightGrid::from_sparse(&[1, 2], &[10, 20], [(1, 10, 3.0), (2, 20, -1.5)]);
        let sparse = grid.to_sparse();
        assert_eq!(
            sparse,
            vec![
                NewWeight {
                    row_id: 1,
                    col_id: 10,
                    weight: 3.0
                },
                NewWeight {
                    row_id: 2,
                    col_id: 20,
                    weight: -1.5
                },
            ]
        );
    }

    #[test]
    fn test_empty_and_zero_grids() {
        assert!(WeightGrid::new().is_empty());
        let zero = WeightGrid::from_sparse(&[1], &[2], []);
        assert!(!zero.is_empty());
        assert!(zero.is_all_zero());
        assert!(zero.to_sparse().is_empty());
    }

    #[test]
    fn test_weights_outside_id_lists_are_kept() {
        let grid = WeightGrid::from_sparse(&[1], &[10], [(5, 50, 1.0)]);
        assert_eq!(grid.get(5, 50), 1.0);
        assert_eq!(grid.row_ids().collect::<Vec<_>>(), vec![1, 5]);
    }
}
