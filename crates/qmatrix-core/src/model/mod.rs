pub mod dimension;
pub(crate) mod lenient;
pub mod matrix;
pub mod rich_text;
pub mod weight;

pub use dimension::{Dimension, DimensionKind, NewDimension};
pub use matrix::{Matrix, MatrixOptions, NewMatrix};
pub use rich_text::{RichText, FORMAT_HTML};
pub use weight::{NewWeight, Weight};

/// Store-assigned identifier. Backup payloads carry the same shape as "old" ids.
pub type EntityId = i64;
