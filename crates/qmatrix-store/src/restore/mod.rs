//! Restore orchestration over SQLite
//!
//! Each backup question is restored in its own transaction: structure first,
//! then stored answers are recoded through the pass's identity map.

pub mod orchestrator;
pub mod provenance;

pub use orchestrator::{
    restore_backup, restore_backup_file, restore_backup_with_context, restore_question,
    QuestionOutcome, QuestionReport, ResponseFailure, RestoreReport,
};
pub use provenance::{events_for_request, ProvenanceKind, RestoreEvent};
