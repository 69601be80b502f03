//! Pass-scoped identity mapping
//!
//! Records `(kind, old id) -> new id` for every entity touched by one
//! restore pass. Entries are write-once: re-registering the same value is a
//! no-op, registering a different value is an internal consistency failure.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{RestoreError, Result};
use crate::model::{DimensionKind, EntityId};

/// Entity kinds tracked by the identity mapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingKind {
    /// Old question id -> destination question id
    Question,
    /// Present only when the destination question was newly created
    QuestionCreated,
    Matrix,
    Row,
    Col,
    Weight,
}

impl MappingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingKind::Question => "question",
            MappingKind::QuestionCreated => "question_created",
            MappingKind::Matrix => "matrix",
            MappingKind::Row => "row",
            MappingKind::Col => "col",
            MappingKind::Weight => "weight",
        }
    }
}

impl From<DimensionKind> for MappingKind {
    fn from(kind: DimensionKind) -> Self {
        match kind {
            DimensionKind::Row => MappingKind::Row,
            DimensionKind::Col => MappingKind::Col,
        }
    }
}

impl std::fmt::Display for MappingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registered mapping, as handed to the backup walker's link decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MappingEntry {
    pub kind: MappingKind,
    pub old_id: EntityId,
    pub new_id: EntityId,
}

/// Identity map owned by exactly one restore pass
#[derive(Debug, Clone, Default)]
pub struct IdentityMapper {
    map: HashMap<(MappingKind, EntityId), EntityId>,
    order: Vec<MappingEntry>,
}

impl IdentityMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a mapper with the question anchor supplied by the backup walker
    ///
    /// `created` records whether the destination question was freshly
    /// inserted (create mode) or resolved to an existing one (merge mode).
    pub fn for_question(old_question_id: EntityId, new_question_id: EntityId, created: bool) -> Self {
        let mut mapper = Self::new();
        mapper.record(MappingKind::Question, old_question_id, new_question_id);
        if created {
            mapper.record(MappingKind::QuestionCreated, old_question_id, new_question_id);
        }
        mapper
    }

    /// Register a mapping
    ///
    /// # Errors
    ///
    /// Returns `DuplicateMapping` if the key is already mapped to a different id.
    pub fn put(&mut self, kind: MappingKind, old_id: EntityId, new_id: EntityId) -> Result<()> {
        match self.map.get(&(kind, old_id)) {
            Some(&existing) if existing == new_id => Ok(()),
            Some(&existing) => Err(RestoreError::DuplicateMapping {
                kind,
                old_id,
                existing,
                attempted: new_id,
            }),
            None => {
                self.record(kind, old_id, new_id);
                Ok(())
            }
        }
    }

    fn record(&mut self, kind: MappingKind, old_id: EntityId, new_id: EntityId) {
        self.map.insert((kind, old_id), new_id);
        self.order.push(MappingEntry {
            kind,
            old_id,
            new_id,
        });
    }

    pub fn get(&self, kind: MappingKind, old_id: EntityId) -> Option<EntityId> {
        self.map.get(&(kind, old_id)).copied()
    }

    /// Lookup by an id that arrived as text (response keys, order lists)
    ///
    /// Text that is not an integer never maps.
    pub fn get_str(&self, kind: MappingKind, old_id: &str) -> Option<EntityId> {
        old_id
            .trim()
            .parse::<EntityId>()
            .ok()
            .and_then(|id| self.get(kind, id))
    }

    /// Lookup that fails with `UnmappedParent` when absent
    ///
    /// # Errors
    ///
    /// Returns `UnmappedParent` when no mapping exists.
    pub fn require(&self, kind: MappingKind, old_id: EntityId) -> Result<EntityId> {
        self.get(kind, old_id)
            .ok_or(RestoreError::UnmappedParent { kind, old_id })
    }

    /// Whether the question was newly created in this pass
    pub fn has_question_created(&self, old_question_id: EntityId) -> bool {
        self.get(MappingKind::QuestionCreated, old_question_id)
            .is_some_and(|id| id != 0)
    }

    /// All mappings in registration order
    pub fn entries(&self) -> &[MappingEntry] {
        &self.order
    }

    /// Number of mappings registered for a kind
    pub fn count(&self, kind: MappingKind) -> usize {
        self.order.iter().filter(|e| e.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_put_then_get() {
        let mut mapper = IdentityMapper::new();
        mapper.put(MappingKind::Row, 1, 10).unwrap();
        assert_eq!(mapper.get(MappingKind::Row, 1), Some(10));
        assert_eq!(mapper.get(MappingKind::Col, 1), None);
    }

    #[test]
    fn test_same_value_reput_is_noop() {
        let mut mapper = IdentityMapper::new();
        mapper.put(MappingKind::Weight, 3, 30).unwrap();
        mapper.put(MappingKind::Weight, 3, 30).unwrap();
        assert_eq!(mapper.count(MappingKind::Weight), 1);
    }

    #[test]
    fn test_conflicting_put_fails() {
        let mut mapper = IdentityMapper::new();
        mapper.put(MappingKind::Col, 2, 20).unwrap();
        let err = mapper.put(MappingKind::Col, 2, 21).unwrap_err();
        assert_eq!(
            err,
            RestoreError::DuplicateMapping {
                kind: MappingKind::Col,
                old_id: 2,
                existing: 20,
                attempted: 21,
            }
        );
        assert_eq!(mapper.get(MappingKind::Col, 2), Some(20));
    }

    #[test]
    fn test_question_created_flag() {
        let created = IdentityMapper::for_question(5, 50, true);
        assert!(created.has_question_created(5));
        assert_eq!(created.get(MappingKind::Question, 5), Some(50));

        let merged = IdentityMapper::for_question(5, 50, false);
        assert!(!merged.has_question_created(5));
        assert_eq!(merged.get(MappingKind::Question, 5), Some(50));
    }

    #[test]
    fn test_get_str_rejects_non_numeric() {
        let mut mapper = IdentityMapper::new();
        mapper.put(MappingKind::Row, 7, 70).unwrap();
        assert_eq!(mapper.get_str(MappingKind::Row, "7"), Some(70));
        assert_eq!(mapper.get_str(MappingKind::Row, "on"), None);
        assert_eq!(mapper.get_str(MappingKind::Row, ""), None);
    }

    #[test]
    fn test_entries_keep_registration_order() {
        let mut mapper = IdentityMapper::for_question(1, 100, true);
        mapper.put(MappingKind::Matrix, 2, 200).unwrap();
        mapper.put(MappingKind::Row, 3, 300).unwrap();
        let kinds: Vec<_> = mapper.entries().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MappingKind::Question,
                MappingKind::QuestionCreated,
                MappingKind::Matrix,
                MappingKind::Row
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_every_old_id_maps_exactly_once(ids in proptest::collection::hash_set(1i64..10_000, 0..50)) {
            let mut mapper = IdentityMapper::new();
            for id in &ids {
                mapper.put(MappingKind::Row, *id, id * 10).unwrap();
            }
            prop_assert_eq!(mapper.count(MappingKind::Row), ids.len());
            for id in &ids {
                prop_assert_eq!(mapper.get(MappingKind::Row, *id), Some(id * 10));
            }
        }
    }
}
