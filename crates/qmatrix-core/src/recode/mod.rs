//! Response recoding
//!
//! Rewrites stored answers so they reference the ids assigned by the restore
//! pass. Two payload shapes exist: legacy serialized grids and structured
//! attempt-step data.

pub mod legacy;
pub mod legacy_codec;
pub mod response;

use crate::model::EntityId;

/// Placeholder id written where a reference has no mapping
pub const UNMAPPED_ID: EntityId = 0;

pub use legacy::{
    recode_legacy_grid, recode_legacy_state, recode_legacy_state_reporting, LegacyRecodeOutcome,
    UnmappedCellReference,
};
pub use legacy_codec::{LegacyArray, LegacyKey, LegacyValue};
pub use response::{recode_choice_order, recode_response, ResponseData, ResponseKey, ORDER_KEY};
