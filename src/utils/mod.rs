//! Commonly used containers and identifiers.

#[macro_use]
pub mod identifier;
pub mod slot_array;
pub mod sparse_set;

pub use self::identifier::IdentifierIndex;
pub use self::slot_array::SlotArray;
pub use self::sparse_set::SparseSet;
