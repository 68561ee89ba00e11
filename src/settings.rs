//! Configuration of a `World`.

use serde::{Deserialize, Serialize};

use crate::utils::slot_array::DEFAULT_CHUNK_SIZE;

/// Tunables of a `World`. Hosts usually load these from their own config
/// files, so every field has a serde default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldParams {
    /// The number of slots every per-type component storage grows by.
    /// Must be greater than zero.
    pub slot_chunk_size: usize,
    /// The number of entities to reserve room for up front.
    pub entity_capacity: usize,
    /// The number of distinct queries to reserve room for up front.
    pub query_capacity: usize,
}

impl Default for WorldParams {
    fn default() -> Self {
        WorldParams {
            slot_chunk_size: DEFAULT_CHUNK_SIZE,
            entity_capacity: 0,
            query_capacity: 0,
        }
    }
}
