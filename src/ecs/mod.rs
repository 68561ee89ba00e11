//! Entity Component System (ECS)
//!
//! A `World` owns every entity, its components and the indices derived
//! from them. Entities are plain `EntityId`s, components are any `'static`
//! type declared with `declare_component!`.
//!
//! ```rust,ignore
//! struct Position { x: f32, y: f32 }
//! struct Velocity { x: f32, y: f32 }
//! declare_component!(Position, Velocity);
//!
//! let mut world = World::new();
//! let e = world
//!     .build()
//!     .with(Position { x: 0.0, y: 0.0 })
//!     .with(Velocity { x: 1.0, y: 0.0 })
//!     .finish();
//!
//! for (p, v) in world.query::<(Position, Velocity)>().iter() {
//!     // ...
//! }
//! ```

#[macro_use]
pub mod component;
pub mod bitset;
pub mod entity;
pub mod events;
pub mod query;
pub mod scene;
pub mod single;
pub mod world;

pub use self::bitset::{BitSet, Signature};
pub use self::component::{Component, ComponentTypeId, StableId};
pub use self::entity::{EntityBuilder, EntityMut, EntityRef};
pub use self::events::{Event, EventLog, EventSink};
pub use self::query::{ComponentSet, Query, QueryMut, QueryTraits, Relatives, Requirements};
pub use self::scene::{Ancestors, Descendants, WalkAction};
pub use self::world::World;

impl_identifier!(
    /// Identifies one entity of a `World`. Ids are dense and reused after
    /// the entity has been destroyed.
    EntityId
);

impl_identifier!(
    /// Identifies one cached query of a `World`.
    QueryId
);
