//! Repository layer
//!
//! Bridges the core restore engine to SQLite

pub mod attempts;
pub mod sqlite_store;

pub use attempts::{
    attempt_steps_for_question, insert_attempt_step, insert_legacy_state,
    legacy_states_for_question, StoredAttemptStep,
};
pub use sqlite_store::{SqliteMatrixStore, StoredMatrix};
