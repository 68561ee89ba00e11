//! Components that exist at most once per world, like input state or the
//! active camera settings.

use std::any;

use super::component::Component;
use super::world::World;
use super::EntityId;

impl World {
    /// Returns the entity carrying the singleton component `S`, creating it
    /// with `S::default()` on first access.
    ///
    /// # Panics
    ///
    /// Panics if more than one entity carries `S`.
    pub fn single<S: Component + Default>(&mut self) -> EntityId {
        let query = self.query::<(S,)>();
        let count = query.len();

        assert!(
            count <= 1,
            "Singleton count of {} must be 0 or 1, found {}.",
            any::type_name::<S>(),
            count
        );

        let first = query.entities().next();
        match first {
            Some(id) => id,
            None => self.build().with(S::default()).finish(),
        }
    }

    /// Returns the singleton component `S`, see `single`.
    pub fn single_component<S: Component + Default>(&mut self) -> &S {
        let id = self.single::<S>();
        self.get_unchecked::<S>(id)
    }

    /// Mutable counterpart of `single_component`.
    pub fn single_component_mut<S: Component + Default>(&mut self) -> &mut S {
        let id = self.single::<S>();
        self.get_unchecked_mut::<S>(id)
    }
}
