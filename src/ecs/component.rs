//! Abstract `Component` trait and the type-erased per-type storage.

use std::any::{self, Any, TypeId};
use std::collections::HashMap;

use crate::errors::*;
use crate::utils::SlotArray;

/// Abstract component trait. Any `'static` type may become a component by
/// implementing it, usually through `declare_component!`.
pub trait Component: Any {}

/// Declares one or more structs as components.
#[macro_export]
macro_rules! declare_component {
    ( $( $CMP:ty ),+ $(,)* ) => {
        $( impl $crate::ecs::Component for $CMP {} )+
    };
}

impl_identifier!(
    /// Identifies one concrete component *type* inside a `World`. Ids are
    /// assigned densely in registration order.
    ComponentTypeId
);

/// A host supplied tag that identifies a component type across runs and
/// builds, used by persistence collaborators to find the type of a decoded
/// record.
pub type StableId = u64;

/// Type-erased view of one `SlotArray<T>`.
pub(crate) trait Arena: Any {
    /// Drops the value at `slot`, returns true if there was one.
    fn erase(&mut self, slot: usize) -> bool;
    fn len(&self) -> usize;
    fn clear(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Component> Arena for SlotArray<T> {
    #[inline]
    fn erase(&mut self, slot: usize) -> bool {
        self.remove(slot).is_some()
    }

    #[inline]
    fn len(&self) -> usize {
        SlotArray::len(self)
    }

    #[inline]
    fn clear(&mut self) {
        SlotArray::clear(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Stands in for an arena that has been lent out to a mutable query.
struct Vacant;

impl Arena for Vacant {
    fn erase(&mut self, _: usize) -> bool {
        false
    }

    fn len(&self) -> usize {
        0
    }

    fn clear(&mut self) {}

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Registered component types and one arena per type.
pub(crate) struct ComponentArenas {
    remap: HashMap<TypeId, ComponentTypeId>,
    names: Vec<&'static str>,
    arenas: Vec<Box<dyn Arena>>,
    stables: HashMap<StableId, ComponentTypeId>,
    stable_ids: Vec<Option<StableId>>,
    chunk: usize,
}

impl ComponentArenas {
    pub fn new(chunk: usize) -> Self {
        assert!(chunk > 0, "Component slot chunk size must be greater than zero.");

        ComponentArenas {
            remap: HashMap::new(),
            names: Vec::new(),
            arenas: Vec::new(),
            stables: HashMap::new(),
            stable_ids: Vec::new(),
            chunk,
        }
    }

    /// Returns the id of `T` if it has been registered.
    #[inline]
    pub fn id<T: Component>(&self) -> Option<ComponentTypeId> {
        self.remap.get(&TypeId::of::<T>()).cloned()
    }

    /// Registers `T` if needed and returns its id.
    pub fn register<T: Component>(&mut self) -> ComponentTypeId {
        if let Some(id) = self.id::<T>() {
            return id;
        }

        let id = ComponentTypeId::new(self.arenas.len() as u32);
        self.remap.insert(TypeId::of::<T>(), id);
        self.names.push(any::type_name::<T>());
        self.arenas
            .push(Box::new(SlotArray::<T>::with_chunk_size(self.chunk)));
        self.stable_ids.push(None);

        debug!("Registers component {} as {}.", any::type_name::<T>(), id);
        id
    }

    /// Returns the number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.arenas.len()
    }

    /// Returns the registered name of `id`, or `"<unknown>"`.
    #[inline]
    pub fn name(&self, id: ComponentTypeId) -> &'static str {
        self.names.get(id.slot()).cloned().unwrap_or("<unknown>")
    }

    /// Returns the total number of stored components over all types.
    pub fn num_components(&self) -> usize {
        self.arenas.iter().map(|v| v.len()).sum()
    }

    /// Drops the component of type `id` at `slot`.
    #[inline]
    pub fn erase(&mut self, id: ComponentTypeId, slot: usize) -> bool {
        match self.arenas.get_mut(id.slot()) {
            Some(arena) => arena.erase(slot),
            None => false,
        }
    }

    /// Returns the typed arena of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not registered for `T`.
    #[inline]
    pub fn arena<T: Component>(&self, id: ComponentTypeId) -> &SlotArray<T> {
        self.arenas[id.slot()]
            .as_any()
            .downcast_ref::<SlotArray<T>>()
            .unwrap_or_else(|| Self::mismatch::<T>(id, self.name(id)))
    }

    /// Mutable counterpart of `arena`.
    #[inline]
    pub fn arena_mut<T: Component>(&mut self, id: ComponentTypeId) -> &mut SlotArray<T> {
        let name = self.name(id);
        self.arenas[id.slot()]
            .as_any_mut()
            .downcast_mut::<SlotArray<T>>()
            .unwrap_or_else(|| Self::mismatch::<T>(id, name))
    }

    /// Moves the typed arena of `id` out, leaving a vacant placeholder until
    /// it is handed back with `restore`.
    pub fn take<T: Component>(&mut self, id: ComponentTypeId) -> Box<SlotArray<T>> {
        let name = self.name(id);
        let arena = ::std::mem::replace(&mut self.arenas[id.slot()], Box::new(Vacant));

        match arena.into_any().downcast::<SlotArray<T>>() {
            Ok(v) => v,
            Err(_) => panic!(
                "{} ({}) is requested twice by the same query, or was never registered for {}.",
                id,
                name,
                any::type_name::<T>()
            ),
        }
    }

    /// Hands an arena taken with `take` back.
    pub fn restore<T: Component>(&mut self, id: ComponentTypeId, arena: Box<SlotArray<T>>) {
        self.arenas[id.slot()] = arena;
    }

    /// Drops every stored component, registrations are kept.
    pub fn clear(&mut self) {
        for v in &mut self.arenas {
            v.clear();
        }
    }

    /// Binds a stable identifier to `id`.
    pub fn bind_stable(&mut self, id: ComponentTypeId, stable: StableId) -> Result<()> {
        match (self.stables.get(&stable), self.stable_ids[id.slot()]) {
            (Some(&bound), _) if bound == id => Ok(()),
            (None, None) => {
                self.stables.insert(stable, id);
                self.stable_ids[id.slot()] = Some(stable);
                Ok(())
            }
            _ => Err(Error::DuplicateStableId(stable)),
        }
    }

    #[inline]
    pub fn by_stable(&self, stable: StableId) -> Option<ComponentTypeId> {
        self.stables.get(&stable).cloned()
    }

    #[inline]
    pub fn stable_of(&self, id: ComponentTypeId) -> Option<StableId> {
        self.stable_ids.get(id.slot()).cloned().unwrap_or(None)
    }

    fn mismatch<T: Component>(id: ComponentTypeId, name: &str) -> ! {
        panic!(
            "Component type mismatch: {} is registered as {}, but accessed as {}.",
            id,
            name,
            any::type_name::<T>()
        )
    }
}
