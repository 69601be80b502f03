//! qmatrix core - identity resolution and recoding for matrix question restores
//!
//! This crate holds everything that does not depend on a concrete database:
//! - Matrix, row/column and weight models plus the dense/sparse weight grid
//! - The pass-scoped identity mapper (`old id -> new id` per entity kind)
//! - The dimension matcher used to recover existing rows/columns by content
//! - The entity restorer driving create vs. merge over a `MatrixStore`
//! - Response recoding for legacy serialized grids and structured attempt data
//! - Question data conversion and the content identity hash
//!
//! Storage is abstracted behind [`ops::MatrixStore`]; an in-memory
//! implementation lives in [`ops::InMemoryStore`].

pub mod errors;
pub mod identity;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod questiondata;
pub mod recode;
pub mod restore;
pub mod weights;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, RestoreError, Result};
pub use identity::{IdentityMapper, MappingKind};
pub use model::{Dimension, DimensionKind, EntityId, Matrix, RichText, Weight};
pub use ops::{InMemoryStore, MatrixStore};
pub use restore::{QuestionAnchor, RestorePass};
pub use weights::WeightGrid;
