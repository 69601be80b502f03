//! Recoding of legacy serialized answer grids
//!
//! A grid maps `old row id -> { old col id -> cell value }`. Unmapped ids
//! are replaced with [`UNMAPPED_ID`] and reported; several unmapped rows
//! therefore collapse onto the same key.

use serde::Serialize;

use crate::errors::{RestoreError, Result};
use crate::identity::{IdentityMapper, MappingKind};
use crate::recode::legacy_codec::{self, LegacyArray, LegacyKey, LegacyValue};
use crate::recode::UNMAPPED_ID;

/// A grid key that had no mapping and was replaced by the sentinel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmappedCellReference {
    pub kind: MappingKind,
    pub old_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRecodeOutcome {
    pub grid: LegacyArray,
    pub unmapped: Vec<UnmappedCellReference>,
}

fn map_key(
    mapper: &IdentityMapper,
    kind: MappingKind,
    key: &LegacyKey,
    unmapped: &mut Vec<UnmappedCellReference>,
) -> LegacyKey {
    let new_id = match key {
        LegacyKey::Int(id) => mapper.get(kind, *id),
        LegacyKey::Str(text) => mapper.get_str(kind, text),
    };
    match new_id {
        Some(id) => LegacyKey::Int(id),
        None => {
            tracing::warn!(
                op = "recode_legacy_state",
                mapping_kind = kind.as_str(),
                old_id = %key,
                "unmapped cell reference replaced with sentinel"
            );
            unmapped.push(UnmappedCellReference {
                kind,
                old_key: key.to_string(),
            });
            LegacyKey::Int(UNMAPPED_ID)
        }
    }
}

/// Rewrite a decoded grid through the row and col mappings
pub fn recode_legacy_grid(mapper: &IdentityMapper, grid: &LegacyArray) -> LegacyRecodeOutcome {
    let mut unmapped = Vec::new();
    let mut result = LegacyArray::new();

    for (row_key, row_value) in grid.iter() {
        let new_row_key = map_key(mapper, MappingKind::Row, row_key, &mut unmapped);
        let mut new_row = LegacyArray::new();
        match row_value {
            LegacyValue::Array(cells) => {
                for (col_key, cell) in cells.iter() {
                    let new_col_key = map_key(mapper, MappingKind::Col, col_key, &mut unmapped);
                    new_row.insert(new_col_key, cell.clone());
                }
            }
            _ => {
                tracing::warn!(
                    op = "recode_legacy_state",
                    old_id = %row_key,
                    "legacy row is not an array, restored as empty"
                );
            }
        }
        result.insert(new_row_key, LegacyValue::Array(new_row));
    }

    LegacyRecodeOutcome {
        grid: result,
        unmapped,
    }
}

/// Decode, recode and re-encode a legacy answer grid
///
/// # Errors
///
/// Returns `InvalidLegacyState` if the payload does not decode to an array.
pub fn recode_legacy_state(mapper: &IdentityMapper, state: &str) -> Result<String> {
    recode_legacy_state_reporting(mapper, state).map(|(encoded, _)| encoded)
}

/// Like [`recode_legacy_state`], also returning the keys that fell back to
/// the sentinel
///
/// # Errors
///
/// Returns `InvalidLegacyState` if the payload does not decode to an array.
pub fn recode_legacy_state_reporting(
    mapper: &IdentityMapper,
    state: &str,
) -> Result<(String, Vec<UnmappedCellReference>)> {
    let LegacyValue::Array(grid) = legacy_codec::parse(state)? else {
        return Err(RestoreError::InvalidLegacyState {
            reason: "top-level value is not an array".to_string(),
        });
    };
    let outcome = recode_legacy_grid(mapper, &grid);
    let encoded = legacy_codec::serialize(&LegacyValue::Array(outcome.grid));
    Ok((encoded, outcome.unmapped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> IdentityMapper {
        let mut mapper = IdentityMapper::new();
        mapper.put(MappingKind::Row, 1, 10).unwrap();
        mapper.put(MappingKind::Col, 2, 20).unwrap();
        mapper
    }

    #[test]
    fn test_recodes_row_and_col_keys() {
        let out = recode_legacy_state(&mapper(), r#"a:1:{i:1;a:1:{i:2;s:1:"x";}}"#).unwrap();
        assert_eq!(out, r#"a:1:{i:10;a:1:{i:20;s:1:"x";}}"#);
    }

    #[test]
    fn test_unmapped_rows_alias_to_sentinel() {
        let grid = match legacy_codec::parse(r#"a:2:{i:8;a:0:{}i:9;a:1:{i:2;b:1;}}"#).unwrap() {
            LegacyValue::Array(grid) => grid,
            other => panic!("unexpected {:?}", other),
        };
        let outcome = recode_legacy_grid(&mapper(), &grid);
        assert_eq!(outcome.grid.len(), 1);
        assert_eq!(outcome.unmapped.len(), 2);
        assert_eq!(
            legacy_codec::serialize(&LegacyValue::Array(outcome.grid)),
            "a:1:{i:0;a:1:{i:20;b:1;}}"
        );
    }

    #[test]
    fn test_non_array_top_level_is_rejected() {
        let err = recode_legacy_state(&mapper(), "i:4;").unwrap_err();
        assert!(matches!(err, RestoreError::InvalidLegacyState { .. }));
    }

    #[test]
    fn test_reporting_variant_lists_sentinel_keys() {
        let (encoded, unmapped) =
            recode_legacy_state_reporting(&mapper(), r#"a:1:{i:1;a:1:{i:7;s:1:"x";}}"#).unwrap();
        assert_eq!(encoded, r#"a:1:{i:10;a:1:{i:0;s:1:"x";}}"#);
        assert_eq!(
            unmapped,
            vec![UnmappedCellReference {
                kind: MappingKind::Col,
                old_key: "7".to_string()
            }]
        );
    }

    #[test]
    fn test_scalar_row_becomes_empty() {
        let out = recode_legacy_state(&mapper(), r#"a:1:{i:1;s:2:"on";}"#).unwrap();
        assert_eq!(out, "a:1:{i:10;a:0:{}}");
    }
}
