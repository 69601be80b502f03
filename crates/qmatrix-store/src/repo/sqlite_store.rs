//! SQLite implementation of `MatrixStore`
//!
//! Borrows a connection (or a transaction, through deref) so the restore
//! pass writes inside whatever transaction the caller opened.

use crate::errors::{from_rusqlite, store_failure, Result};
use qmatrix_core::errors::Result as RestoreResult;
use qmatrix_core::model::{
    Dimension, DimensionKind, EntityId, Matrix, MatrixOptions, NewDimension, NewMatrix,
    NewWeight, RichText, Weight,
};
use qmatrix_core::{MatrixStore, WeightGrid};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

const MATRIX_COLUMNS: &str =
    "id, questionid, grademethod, multiple, shuffleanswers, use_dnd_ui, renderer";

/// A stored matrix with its rows, columns and dense weight grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMatrix {
    pub matrix: Matrix,
    pub rows: Vec<Dimension>,
    pub cols: Vec<Dimension>,
    pub weights: WeightGrid,
}

pub struct SqliteMatrixStore<'c> {
    conn: &'c Connection,
}

fn table(kind: DimensionKind) -> &'static str {
    match kind {
        DimensionKind::Row => "question_matrix_rows",
        DimensionKind::Col => "question_matrix_cols",
    }
}

fn matrix_from_row(row: &Row<'_>) -> rusqlite::Result<Matrix> {
    Ok(Matrix {
        id: row.get(0)?,
        question_id: row.get(1)?,
        options: MatrixOptions {
            grademethod: row.get(2)?,
            multiple: row.get(3)?,
            shuffleanswers: row.get(4)?,
            use_dnd_ui: row.get(5)?,
            renderer: row.get(6)?,
        },
    })
}

fn weight_from_row(row: &Row<'_>) -> rusqlite::Result<Weight> {
    Ok(Weight {
        id: row.get(0)?,
        row_id: row.get(1)?,
        col_id: row.get(2)?,
        weight: row.get(3)?,
    })
}

impl<'c> SqliteMatrixStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Load the matrix owned by a question, rows/cols in id order
    ///
    /// # Errors
    ///
    /// Returns a persistence error if a query fails.
    pub fn load_matrix(&self, question_id: EntityId) -> Result<Option<StoredMatrix>> {
        let Some(matrix) = self
            .matrix_by_question_id(question_id)
            .map_err(qmatrix_core::ExError::from)?
        else {
            return Ok(None);
        };
        let rows = self
            .dimensions_by_matrix_id(DimensionKind::Row, matrix.id)
            .map_err(qmatrix_core::ExError::from)?;
        let cols = self
            .dimensions_by_matrix_id(DimensionKind::Col, matrix.id)
            .map_err(qmatrix_core::ExError::from)?;
        let weights = self
            .weights_by_question_id(question_id)
            .map_err(qmatrix_core::ExError::from)?;

        let row_ids: Vec<EntityId> = rows.iter().map(|r| r.id).collect();
        let col_ids: Vec<EntityId> = cols.iter().map(|c| c.id).collect();
        let grid = WeightGrid::from_sparse(
            &row_ids,
            &col_ids,
            weights.iter().map(|w| (w.row_id, w.col_id, w.weight)),
        );

        Ok(Some(StoredMatrix {
            matrix,
            rows,
            cols,
            weights: grid,
        }))
    }

    /// Remove a question's matrix subtree and its stored answers
    ///
    /// Runs in its own transaction. Returns whether a matrix existed.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if any delete fails; nothing is removed.
    pub fn delete_question_matrix(conn: &mut Connection, question_id: EntityId) -> Result<bool> {
        let tx = conn.transaction().map_err(from_rusqlite)?;

        let matrix_id: Option<EntityId> = tx
            .query_row(
                "SELECT id FROM question_matrix WHERE questionid = ?1",
                [question_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;

        if let Some(matrix_id) = matrix_id {
            tx.execute(
                "DELETE FROM question_matrix_weights
                 WHERE rowid IN (SELECT id FROM question_matrix_rows WHERE matrixid = ?1)
                    OR colid IN (SELECT id FROM question_matrix_cols WHERE matrixid = ?1)",
                [matrix_id],
            )
            .map_err(from_rusqlite)?;
            tx.execute(
                "DELETE FROM question_matrix_rows WHERE matrixid = ?1",
                [matrix_id],
            )
            .map_err(from_rusqlite)?;
            tx.execute(
                "DELETE FROM question_matrix_cols WHERE matrixid = ?1",
                [matrix_id],
            )
            .map_err(from_rusqlite)?;
            tx.execute("DELETE FROM question_matrix WHERE id = ?1", [matrix_id])
                .map_err(from_rusqlite)?;
        }
        tx.execute(
            "DELETE FROM attempt_step_data WHERE questionid = ?1",
            [question_id],
        )
        .map_err(from_rusqlite)?;
        tx.execute(
            "DELETE FROM legacy_states WHERE questionid = ?1",
            [question_id],
        )
        .map_err(from_rusqlite)?;

        tx.commit().map_err(from_rusqlite)?;
        Ok(matrix_id.is_some())
    }
}

impl MatrixStore for SqliteMatrixStore<'_> {
    fn insert_matrix(&mut self, matrix: &NewMatrix) -> RestoreResult<EntityId> {
        self.conn
            .execute(
                "INSERT INTO question_matrix
                    (questionid, grademethod, multiple, shuffleanswers, use_dnd_ui, renderer)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    matrix.question_id,
                    matrix.options.grademethod,
                    matrix.options.multiple,
                    matrix.options.shuffleanswers,
                    matrix.options.use_dnd_ui,
                    matrix.options.renderer,
                ],
            )
            .map_err(store_failure("insert_matrix"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn matrix_by_question_id(&self, question_id: EntityId) -> RestoreResult<Option<Matrix>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM question_matrix WHERE questionid = ?1",
                    MATRIX_COLUMNS
                ),
                [question_id],
                matrix_from_row,
            )
            .optional()
            .map_err(store_failure("matrix_by_question_id"))
    }

    fn insert_dimension(&mut self, dimension: &NewDimension) -> RestoreResult<EntityId> {
        let inserted = match dimension.kind {
            DimensionKind::Row => {
                let feedback = dimension.feedback.clone().unwrap_or_default();
                self.conn.execute(
                    "INSERT INTO question_matrix_rows
                        (matrixid, shorttext, description, descriptionformat, feedback, feedbackformat)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        dimension.matrix_id,
                        dimension.shorttext,
                        dimension.description.text,
                        dimension.description.format,
                        feedback.text,
                        feedback.format,
                    ],
                )
            }
            DimensionKind::Col => self.conn.execute(
                "INSERT INTO question_matrix_cols
                    (matrixid, shorttext, description, descriptionformat)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    dimension.matrix_id,
                    dimension.shorttext,
                    dimension.description.text,
                    dimension.description.format,
                ],
            ),
        };
        inserted.map_err(store_failure("insert_dimension"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn dimensions_by_matrix_id(
        &self,
        kind: DimensionKind,
        matrix_id: EntityId,
    ) -> RestoreResult<Vec<Dimension>> {
        let feedback_columns = if kind.has_feedback() {
            ", feedback, feedbackformat"
        } else {
            ""
        };
        let sql = format!(
            "SELECT id, matrixid, shorttext, description, descriptionformat{}
             FROM {} WHERE matrixid = ?1 ORDER BY id",
            feedback_columns,
            table(kind)
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(store_failure("dimensions_by_matrix_id"))?;
        let dimensions = stmt
            .query_map([matrix_id], |row| {
                let feedback = if kind.has_feedback() {
                    Some(RichText {
                        text: row.get(5)?,
                        format: row.get(6)?,
                    })
                } else {
                    None
                };
                Ok(Dimension {
                    id: row.get(0)?,
                    matrix_id: row.get(1)?,
                    kind,
                    shorttext: row.get(2)?,
                    description: RichText {
                        text: row.get(3)?,
                        format: row.get(4)?,
                    },
                    feedback,
                })
            })
            .map_err(store_failure("dimensions_by_matrix_id"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(store_failure("dimensions_by_matrix_id"))?;
        Ok(dimensions)
    }

    fn insert_weight(&mut self, weight: &NewWeight) -> RestoreResult<EntityId> {
        self.conn
            .execute(
                "INSERT INTO question_matrix_weights (rowid, colid, weight) VALUES (?1, ?2, ?3)",
                rusqlite::params![weight.row_id, weight.col_id, weight.weight],
            )
            .map_err(store_failure("insert_weight"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn weights_by_question_id(&self, question_id: EntityId) -> RestoreResult<Vec<Weight>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT w.id, w.rowid, w.colid, w.weight
                 FROM question_matrix_weights w
                 WHERE w.rowid IN (
                        SELECT r.id FROM question_matrix_rows r
                        JOIN question_matrix m ON m.id = r.matrixid
                        WHERE m.questionid = ?1)
                    OR w.colid IN (
                        SELECT c.id FROM question_matrix_cols c
                        JOIN question_matrix m ON m.id = c.matrixid
                        WHERE m.questionid = ?1)
                 ORDER BY w.id",
            )
            .map_err(store_failure("weights_by_question_id"))?;
        let weights = stmt
            .query_map([question_id], weight_from_row)
            .map_err(store_failure("weights_by_question_id"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(store_failure("weights_by_question_id"))?;
        Ok(weights)
    }
}
