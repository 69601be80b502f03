use serde::{Deserialize, Serialize};

use super::EntityId;

/// A stored non-zero cell of the weight grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub id: EntityId,
    pub row_id: EntityId,
    pub col_id: EntityId,
    pub weight: f64,
}

/// Weight values to insert; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewWeight {
    pub row_id: EntityId,
    pub col_id: EntityId,
    pub weight: f64,
}
