use std::fmt;

use super::bitset::Signature;
use super::component::{Component, ComponentArenas, ComponentTypeId, StableId};
use super::entity::{EntityBuilder, EntityMut, EntityRef};
use super::events::{Event, EventBus, EventSink};
use super::query::{QueryCache, TypeList};
use super::scene::SceneGraph;
use super::EntityId;
use crate::errors::*;
use crate::settings::WorldParams;
use crate::utils::SparseSet;

/// The `World` struct contains all the data, which is entities, their
/// components and every index derived from them: cached query members and
/// the scene graph.
///
/// A `World` is an explicit value owned by the host and handed to every
/// system by reference. Mutating it while any query or entity iterator is
/// alive is rejected by the borrow checker.
pub struct World {
    pub(crate) entities: SparseSet<EntityId, ()>,
    pub(crate) signatures: Vec<Signature>,
    pub(crate) components: ComponentArenas,
    pub(crate) queries: QueryCache,
    pub(crate) scene: SceneGraph,
    pub(crate) events: EventBus,
    free: Vec<EntityId>,
    params: WorldParams,
}

impl Default for World {
    fn default() -> Self {
        World::new()
    }
}

impl World {
    /// Constructs a new empty `World`.
    pub fn new() -> Self {
        World::with_params(WorldParams::default())
    }

    /// Constructs a new empty `World` with explicit parameters.
    ///
    /// # Panics
    ///
    /// Panics if `params.slot_chunk_size` is zero.
    pub fn with_params(params: WorldParams) -> Self {
        World {
            entities: SparseSet::with_capacity(params.entity_capacity),
            signatures: Vec::with_capacity(params.entity_capacity),
            components: ComponentArenas::new(params.slot_chunk_size),
            queries: QueryCache::with_capacity(params.query_capacity),
            scene: SceneGraph::new(),
            events: EventBus::default(),
            free: Vec::new(),
            params,
        }
    }

    /// Returns the parameters this world was built with.
    #[inline]
    pub fn params(&self) -> &WorldParams {
        &self.params
    }

    /// Installs an event sink, returning the previous one.
    pub fn set_event_sink(&mut self, sink: Box<dyn EventSink>) -> Option<Box<dyn EventSink>> {
        self.events.set(sink)
    }

    /// Removes the installed event sink.
    pub fn take_event_sink(&mut self) -> Option<Box<dyn EventSink>> {
        self.events.take()
    }
}

impl World {
    /// Creates a new entity. The most recently destroyed id is reused first,
    /// otherwise the next unused one is minted.
    pub fn create(&mut self) -> EntityId {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                let id = EntityId::new(self.signatures.len() as u32);
                self.signatures.push(Signature::new());
                id
            }
        };

        self.entities.insert(id, ());
        self.events.emit(Event::EntityCreated(id));
        id
    }

    /// Creates a new entity and returns a builder to attach its components.
    #[inline]
    pub fn build(&mut self) -> EntityBuilder<'_> {
        let id = self.create();
        EntityBuilder::new(self, id)
    }

    /// Returns true if `id` names a live entity.
    #[inline]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.contains(id)
    }

    /// Returns the number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns an iterator over live entities, in no particular order.
    #[inline]
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys()
    }

    /// Returns a read-only handle of `id`. Reports `Error::EntityNotFound`
    /// if the entity does not exist.
    pub fn entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        if self.check_alive(id) {
            Some(EntityRef::new(self, id))
        } else {
            None
        }
    }

    /// Returns a mutable handle of `id`. Reports `Error::EntityNotFound` if
    /// the entity does not exist.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_>> {
        if self.check_alive(id) {
            Some(EntityMut::new(self, id))
        } else {
            None
        }
    }

    /// Destroys `id`: detaches it from the scene graph, drops all of its
    /// components, leaves every query and recycles the id.
    ///
    /// Returns false, and reports `Error::EntityNotFound`, if the entity does
    /// not exist.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        if self.entities.remove(id).is_none() {
            self.events.error(Error::EntityNotFound(id));
            return false;
        }

        self.detach_hierarchy(id);

        let slot = id.slot();
        let types: TypeList = self.signatures[slot].iter().collect();
        for &ty in &types {
            self.components.erase(ty, slot);
        }

        self.signatures[slot] = Signature::new();
        self.queries.update(id, &self.signatures[slot], &self.events);

        for &ty in &types {
            self.events.emit(Event::ComponentRemoved {
                entity: id,
                component: ty,
            });
        }

        self.free.push(id);
        self.events.emit(Event::EntityDestroyed(id));
        true
    }

    /// Destroys every entity. Cached queries survive with empty member sets,
    /// and entity ids start from zero again.
    pub fn clear(&mut self) {
        let entities: Vec<_> = self.entities.keys().collect();
        for id in entities {
            self.destroy(id);
        }

        self.free.clear();
        self.signatures.clear();
        self.components.clear();

        debug_assert!(self.entities.is_empty());
        debug_assert_eq!(self.components.num_components(), 0);
        debug_assert_eq!(self.queries.num_members(), 0);
        debug_assert!(self.scene.is_empty());

        debug!("Clears {:?}.", self);
    }
}

impl World {
    /// Registers component type `T`, returning its id. Registering is
    /// idempotent, and happens implicitly on first use.
    #[inline]
    pub fn register<T: Component>(&mut self) -> ComponentTypeId {
        self.components.register::<T>()
    }

    /// Returns the id of `T` if it has been registered.
    #[inline]
    pub fn component_type<T: Component>(&self) -> Option<ComponentTypeId> {
        self.components.id::<T>()
    }

    /// Returns the type name registered under `ty`.
    #[inline]
    pub fn component_name(&self, ty: ComponentTypeId) -> &'static str {
        self.components.name(ty)
    }

    /// Returns the number of registered component types.
    #[inline]
    pub fn num_component_types(&self) -> usize {
        self.components.len()
    }

    /// Registers `T` and binds a host supplied stable identifier to it.
    pub fn register_stable<T: Component>(&mut self, stable: StableId) -> Result<ComponentTypeId> {
        let ty = self.components.register::<T>();
        match self.components.bind_stable(ty, stable) {
            Ok(()) => Ok(ty),
            Err(err) => {
                self.events.error(err.clone());
                Err(err)
            }
        }
    }

    /// Finds the component type bound to a stable identifier.
    #[inline]
    pub fn component_type_by_stable(&self, stable: StableId) -> Option<ComponentTypeId> {
        self.components.by_stable(stable)
    }

    /// Returns the stable identifier bound to `ty`.
    #[inline]
    pub fn stable_id_of(&self, ty: ComponentTypeId) -> Option<StableId> {
        self.components.stable_of(ty)
    }
}

impl World {
    /// Attachs `component` to `id`. Returns false, and reports
    /// `Error::EntityNotFound`, if the entity does not exist.
    ///
    /// # Panics
    ///
    /// Panics if the entity already has a component of type `T`.
    pub fn add<T: Component>(&mut self, id: EntityId, component: T) -> bool {
        if !self.is_alive(id) {
            self.events.error(Error::EntityNotFound(id));
            return false;
        }

        let ty = self.components.register::<T>();
        let slot = id.slot();

        if self.signatures[slot].contains(ty) {
            panic!(
                "{} already has a component of type {}.",
                id,
                self.components.name(ty)
            );
        }

        self.components.arena_mut::<T>(ty).insert(slot, component);
        self.signatures[slot].insert(ty);
        self.queries.update(id, &self.signatures[slot], &self.events);

        self.events.emit(Event::ComponentAdded {
            entity: id,
            component: ty,
        });
        true
    }

    /// Attachs `T::default()` to `id`.
    #[inline]
    pub fn add_default<T: Component + Default>(&mut self, id: EntityId) -> bool {
        self.add(id, T::default())
    }

    /// Detachs the component of type `T` from `id`, returning it.
    pub fn remove<T: Component>(&mut self, id: EntityId) -> Option<T> {
        let ty = match self.component_type::<T>() {
            Some(ty) if self.has_type(id, ty) => ty,
            _ => {
                self.report_missing(id, ::std::any::type_name::<T>());
                return None;
            }
        };

        let value = self.components.arena_mut::<T>(ty).remove(id.slot());
        self.detach(id, ty);
        value
    }

    /// Detachs and drops the component of type `ty` from `id`. Returns false
    /// if there was no such component.
    pub fn remove_type(&mut self, id: EntityId, ty: ComponentTypeId) -> bool {
        if !self.has_type(id, ty) {
            let name = self.components.name(ty);
            self.report_missing(id, name);
            return false;
        }

        self.components.erase(ty, id.slot());
        self.detach(id, ty);
        true
    }

    /// Detachs and drops every component of `id`, returning how many there
    /// were.
    pub fn remove_all(&mut self, id: EntityId) -> usize {
        if !self.is_alive(id) {
            self.events.error(Error::EntityNotFound(id));
            return 0;
        }

        let types: TypeList = self.signatures[id.slot()].iter().collect();
        for &ty in &types {
            self.components.erase(ty, id.slot());
            self.detach(id, ty);
        }

        types.len()
    }

    /// Returns true if `id` is alive and has a component of type `T`.
    #[inline]
    pub fn has<T: Component>(&self, id: EntityId) -> bool {
        self.component_type::<T>()
            .map(|ty| self.has_type(id, ty))
            .unwrap_or(false)
    }

    /// Returns true if `id` is alive and has a component of type `ty`.
    #[inline]
    pub fn has_type(&self, id: EntityId, ty: ComponentTypeId) -> bool {
        self.signature(id)
            .map(|v| v.contains(ty))
            .unwrap_or(false)
    }

    /// Returns the set of component types attached to `id`.
    #[inline]
    pub fn signature(&self, id: EntityId) -> Option<&Signature> {
        if self.is_alive(id) {
            self.signatures.get(id.slot())
        } else {
            None
        }
    }

    /// Returns the number of components attached to `id`.
    #[inline]
    pub fn num_components_of(&self, id: EntityId) -> usize {
        self.signature(id).map(|v| v.len()).unwrap_or(0)
    }

    /// Returns the number of components attached over all entities.
    #[inline]
    pub fn num_components(&self) -> usize {
        self.components.num_components()
    }

    /// Returns a reference to the component `T` of `id`. Reports
    /// `Error::EntityNotFound` if the entity does not exist.
    #[inline]
    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        if !self.check_alive(id) {
            return None;
        }

        let ty = self.component_type::<T>()?;
        self.components.arena::<T>(ty).get(id.slot())
    }

    /// Returns a mutable reference to the component `T` of `id`. Reports
    /// `Error::EntityNotFound` if the entity does not exist.
    #[inline]
    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        if !self.check_alive(id) {
            return None;
        }

        let ty = self.component_type::<T>()?;
        self.components.arena_mut::<T>(ty).get_mut(id.slot())
    }

    /// Returns a reference to the component `T` of `id`, for call sites
    /// that have already proven its presence.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not have a component of type `T`.
    pub fn get_unchecked<T: Component>(&self, id: EntityId) -> &T {
        match self.get::<T>(id) {
            Some(v) => v,
            None => Self::missing::<T>(id),
        }
    }

    /// Mutable counterpart of `get_unchecked`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not have a component of type `T`.
    pub fn get_unchecked_mut<T: Component>(&mut self, id: EntityId) -> &mut T {
        match self.get_mut::<T>(id) {
            Some(v) => v,
            None => Self::missing::<T>(id),
        }
    }

    /// Clears `ty` from the signature of `id` once its value is gone, and
    /// propagates the change.
    fn detach(&mut self, id: EntityId, ty: ComponentTypeId) {
        let slot = id.slot();
        self.signatures[slot].remove(ty);
        self.queries.update(id, &self.signatures[slot], &self.events);

        self.events.emit(Event::ComponentRemoved {
            entity: id,
            component: ty,
        });
    }

    /// Returns true if `id` is alive, reports `Error::EntityNotFound`
    /// otherwise.
    fn check_alive(&self, id: EntityId) -> bool {
        if self.is_alive(id) {
            true
        } else {
            self.events.error(Error::EntityNotFound(id));
            false
        }
    }

    fn report_missing(&self, id: EntityId, component: &'static str) {
        let err = if self.is_alive(id) {
            Error::ComponentNotFound {
                entity: id,
                component,
            }
        } else {
            Error::EntityNotFound(id)
        };

        self.events.error(err);
    }

    fn missing<T: Component>(id: EntityId) -> ! {
        panic!(
            "{} does not have a component of type {}.",
            id,
            ::std::any::type_name::<T>()
        )
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "<World entities:{} components:{} queries:{}>",
            self.len(),
            self.num_components(),
            self.num_queries()
        )
    }
}
