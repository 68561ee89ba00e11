//! Non-owning entity handles.
//!
//! A handle is nothing but a borrowed `World` plus an `EntityId`. It owns
//! no data and can not outlive the world it was taken from.

use super::bitset::Signature;
use super::component::Component;
use super::world::World;
use super::EntityId;
use crate::errors::*;

/// Read-only access to one live entity.
#[derive(Clone, Copy)]
pub struct EntityRef<'w> {
    world: &'w World,
    id: EntityId,
}

impl<'w> EntityRef<'w> {
    pub(crate) fn new(world: &'w World, id: EntityId) -> Self {
        EntityRef { world, id }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn has<T: Component>(&self) -> bool {
        self.world.has::<T>(self.id)
    }

    #[inline]
    pub fn get<T: Component>(&self) -> Option<&'w T> {
        self.world.get::<T>(self.id)
    }

    #[inline]
    pub fn signature(&self) -> Option<&'w Signature> {
        self.world.signature(self.id)
    }

    #[inline]
    pub fn num_components(&self) -> usize {
        self.world.num_components_of(self.id)
    }

    #[inline]
    pub fn parent(&self) -> Option<EntityId> {
        self.world.parent(self.id)
    }

    #[inline]
    pub fn num_children(&self) -> usize {
        self.world.num_children(self.id)
    }
}

/// Mutable access to one live entity.
pub struct EntityMut<'w> {
    world: &'w mut World,
    id: EntityId,
}

impl<'w> EntityMut<'w> {
    pub(crate) fn new(world: &'w mut World, id: EntityId) -> Self {
        EntityMut { world, id }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn has<T: Component>(&self) -> bool {
        self.world.has::<T>(self.id)
    }

    #[inline]
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.world.get::<T>(self.id)
    }

    #[inline]
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.world.get_mut::<T>(self.id)
    }

    /// See `World::add`.
    #[inline]
    pub fn add<T: Component>(&mut self, component: T) -> &mut Self {
        self.world.add(self.id, component);
        self
    }

    #[inline]
    pub fn remove<T: Component>(&mut self) -> Option<T> {
        self.world.remove::<T>(self.id)
    }

    /// Attachs `child` under this entity. See `World::add_child`.
    #[inline]
    pub fn add_child(&mut self, child: EntityId) -> Result<bool> {
        self.world.add_child(child, self.id)
    }

    #[inline]
    pub fn remove_child(&mut self, child: EntityId) -> bool {
        self.world.remove_child(child, self.id)
    }

    #[inline]
    pub fn parent(&self) -> Option<EntityId> {
        self.world.parent(self.id)
    }

    /// Destroys the entity, consuming the handle.
    #[inline]
    pub fn destroy(self) -> bool {
        self.world.destroy(self.id)
    }
}

/// Attachs components to a freshly created entity.
pub struct EntityBuilder<'w> {
    world: &'w mut World,
    id: EntityId,
}

impl<'w> EntityBuilder<'w> {
    pub(crate) fn new(world: &'w mut World, id: EntityId) -> Self {
        EntityBuilder { world, id }
    }

    /// Adds a component to the entity.
    #[inline]
    pub fn with<T: Component>(self, component: T) -> Self {
        self.world.add(self.id, component);
        self
    }

    #[inline]
    pub fn with_default<T: Component + Default>(self) -> Self {
        self.with(T::default())
    }

    /// Finishes building and returns the entity.
    #[inline]
    pub fn finish(self) -> EntityId {
        self.id
    }
}
