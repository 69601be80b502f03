//! Entity restore: create vs. merge for matrix, rows, columns and weights
//!
//! Records arrive in document order from the backup walker. A
//! [`RestorePass`] consumes them, decides per pass whether it is creating a
//! fresh matrix or merging into an existing one, and fills the identity map
//! that response recoding reads afterwards.

pub mod cache;
pub mod decode;
pub mod matcher;
pub mod pass;
pub mod records;

pub use cache::MatrixLookupCache;
pub use decode::{decode_contents, DecodeContent};
pub use matcher::{find_matching_dimension, DimensionMatcher, DimensionProbe, ExactContentMatcher};
pub use pass::{QuestionAnchor, RestorePass, RestoreSummary};
pub use records::{DimensionRecord, MatrixBackup, MatrixRecord, WeightRecord};
