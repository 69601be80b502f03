use qmatrix_core::model::{
    DimensionKind, EntityId, MatrixOptions, NewDimension, NewMatrix, NewWeight, RichText,
};
use qmatrix_core::restore::{DimensionRecord, MatrixBackup, WeightRecord};
use qmatrix_core::{InMemoryStore, MatrixStore};

/// Row or column backup record with HTML description
#[allow(dead_code)]
pub fn dimension(id: EntityId, shorttext: &str, description: &str) -> DimensionRecord {
    DimensionRecord {
        id,
        shorttext: shorttext.to_string(),
        description: RichText::html(description),
        feedback: None,
    }
}

#[allow(dead_code)]
pub fn weight(id: EntityId, row_id: EntityId, col_id: EntityId, weight: f64) -> WeightRecord {
    WeightRecord {
        id,
        row_id,
        col_id,
        weight,
    }
}

/// A 2x2 matrix backup with old ids: matrix 1, rows 11/12, cols 21/22,
/// weights 31 (11,21) and 32 (12,22)
#[allow(dead_code)]
pub fn sample_backup() -> MatrixBackup {
    MatrixBackup {
        id: 1,
        rows: vec![
            dimension(11, "A", "d1"),
            dimension(12, "B", "d2"),
        ],
        cols: vec![
            dimension(21, "True", ""),
            dimension(22, "False", ""),
        ],
        weights: vec![weight(31, 11, 21, 1.0), weight(32, 12, 22, 1.0)],
        options: MatrixOptions::default(),
    }
}

/// Destination ids of a matrix seeded into a store
#[allow(dead_code)]
pub struct Seeded {
    pub matrix_id: EntityId,
    pub rows: Vec<EntityId>,
    pub cols: Vec<EntityId>,
    pub weights: Vec<EntityId>,
}

/// Seed the store with the destination copy of a backup, as if it had been
/// restored earlier under `question_id`
#[allow(dead_code)]
pub fn seed_existing(store: &mut InMemoryStore, question_id: EntityId, backup: &MatrixBackup) -> Seeded {
    let matrix_id = store
        .insert_matrix(&NewMatrix {
            question_id,
            options: backup.options.clone(),
        })
        .unwrap();

    let mut insert = |kind: DimensionKind, record: &DimensionRecord| {
        store
            .insert_dimension(&NewDimension {
                matrix_id,
                kind,
                shorttext: record.shorttext.clone(),
                description: record.description.clone(),
                feedback: kind
                    .has_feedback()
                    .then(|| record.feedback.clone().unwrap_or_default()),
            })
            .unwrap()
    };
    let rows: Vec<EntityId> = backup.rows.iter().map(|r| insert(DimensionKind::Row, r)).collect();
    let cols: Vec<EntityId> = backup.cols.iter().map(|c| insert(DimensionKind::Col, c)).collect();

    let position = |list: &[DimensionRecord], old: EntityId| {
        list.iter().position(|d| d.id == old).unwrap()
    };
    let weights = backup
        .weights
        .iter()
        .map(|w| {
            store
                .insert_weight(&NewWeight {
                    row_id: rows[position(&backup.rows, w.row_id)],
                    col_id: cols[position(&backup.cols, w.col_id)],
                    weight: w.weight,
                })
                .unwrap()
        })
        .collect();

    Seeded {
        matrix_id,
        rows,
        cols,
        weights,
    }
}
