pub use crate::ecs;
pub use crate::ecs::{
    Component, ComponentTypeId, EntityId, Event, EventLog, EventSink, Query, QueryId, QueryMut,
    QueryTraits, WalkAction, World,
};

pub use crate::errors::{Error, Result};
pub use crate::settings::WorldParams;

pub use crate::utils;
pub use crate::utils::{SlotArray, SparseSet};
