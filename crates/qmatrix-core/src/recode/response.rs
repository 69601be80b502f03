//! Recoding of structured attempt-step responses
//!
//! Response keys are parsed once into [`ResponseKey`] and then rewritten
//! through the identity map. Values for cell keys are old column ids (or
//! `"on"` for checkboxes) and are mapped as columns.

use std::collections::BTreeMap;

use crate::errors::{RestoreError, Result};
use crate::identity::{IdentityMapper, MappingKind};
use crate::model::EntityId;
use crate::recode::UNMAPPED_ID;

/// Attempt-step data as stored: name -> value
pub type ResponseData = BTreeMap<String, String>;

pub const ORDER_KEY: &str = "_order";
const CELL_PREFIX: &str = "cell";

/// Shape of one response key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseKey<'a> {
    /// `cell<row>`
    SingleSelectCell { row: &'a str },
    /// `cell<row>_<col>`
    MultiSelectCell { row: &'a str, col: &'a str },
    /// `_order`
    Order,
    /// Anything else, copied through unchanged
    Other,
}

impl<'a> ResponseKey<'a> {
    pub fn parse(key: &'a str) -> Self {
        if key == ORDER_KEY {
            return ResponseKey::Order;
        }
        let Some(ids) = key.strip_prefix(CELL_PREFIX) else {
            return ResponseKey::Other;
        };
        let parts: Vec<&str> = ids.split('_').collect();
        match parts[..] {
            [row] => ResponseKey::SingleSelectCell { row },
            [row, col] => ResponseKey::MultiSelectCell { row, col },
            _ => ResponseKey::Other,
        }
    }
}

/// Rewrite a comma separated list of old row ids
///
/// # Errors
///
/// Returns `MissingOrderReferenceId` for the first id with no row mapping.
pub fn recode_choice_order(mapper: &IdentityMapper, order: &str) -> Result<String> {
    order
        .split(',')
        .map(|old| match mapper.get_str(MappingKind::Row, old) {
            Some(new_id) if new_id != UNMAPPED_ID => Ok(new_id.to_string()),
            _ => Err(RestoreError::MissingOrderReferenceId {
                row_id: old.to_string(),
            }),
        })
        .collect::<Result<Vec<_>>>()
        .map(|ids| ids.join(","))
}

fn map_or_sentinel(
    mapper: &IdentityMapper,
    kind: MappingKind,
    old: &str,
    question_id: EntityId,
    sequence_number: u32,
) -> EntityId {
    mapper.get_str(kind, old).unwrap_or_else(|| {
        tracing::warn!(
            op = "recode_response",
            question_id,
            sequence_number,
            mapping_kind = kind.as_str(),
            old_id = old,
            "unmapped response reference replaced with sentinel"
        );
        UNMAPPED_ID
    })
}

/// Recode one attempt-step response
///
/// The multi-select branch writes the column mapped from the value into
/// both the key and the value. For checkbox values (`"on"`) that column is
/// the sentinel, so the cell collapses to `cell<row>_0 = 0`.
///
/// # Errors
///
/// Returns `MissingOrderReferenceId` when `_order` cannot be fully recoded.
pub fn recode_response(
    mapper: &IdentityMapper,
    question_id: EntityId,
    sequence_number: u32,
    response: &ResponseData,
) -> Result<ResponseData> {
    let mut recoded = ResponseData::new();
    for (key, value) in response {
        match ResponseKey::parse(key) {
            ResponseKey::Order => {
                recoded.insert(ORDER_KEY.to_string(), recode_choice_order(mapper, value)?);
            }
            ResponseKey::SingleSelectCell { row } => {
                let new_row = map_or_sentinel(mapper, MappingKind::Row, row, question_id, sequence_number);
                let new_col = map_or_sentinel(mapper, MappingKind::Col, value, question_id, sequence_number);
                recoded.insert(format!("{}{}", CELL_PREFIX, new_row), new_col.to_string());
            }
            ResponseKey::MultiSelectCell { row, .. } => {
                let new_row = map_or_sentinel(mapper, MappingKind::Row, row, question_id, sequence_number);
                let new_col = mapper.get_str(MappingKind::Col, value).unwrap_or(UNMAPPED_ID);
                recoded.insert(
                    format!("{}{}_{}", CELL_PREFIX, new_row, new_col),
                    new_col.to_string(),
                );
            }
            ResponseKey::Other => {
                recoded.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(recoded)
}
