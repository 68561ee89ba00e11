//! Live views over entities sharing a combination of component types.
//!
//! A query is identified by its `QueryTraits`, a `(required, excluded)` pair
//! of component type sets. The first time a traits value is seen the world
//! scans every live entity once to seed its members. From then on, every
//! component add/remove and every destroy re-evaluates the touched entity
//! against every cached traits value, so iterating a query never filters.
//!
//! ```rust,ignore
//! let mut query = world.query_mut::<(Position, Velocity)>();
//! query.for_each(|_, (p, v): (&mut Position, &mut Velocity)| {
//!     p.x += v.x;
//! });
//! ```

use std::any;
use std::collections::HashMap;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::bitset::{BitSet, Signature};
use super::component::{Component, ComponentTypeId};
use super::events::{Event, EventBus};
use super::world::World;
use super::{EntityId, QueryId};
use crate::utils::sparse_set::Keys;
use crate::utils::{SlotArray, SparseSet};

/// The `(required, excluded)` predicate of a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryTraits {
    required: BitSet,
    excluded: BitSet,
}

impl QueryTraits {
    /// Creates a new predicate.
    ///
    /// # Panics
    ///
    /// Panics if `required` is empty, or if a type is both required and
    /// excluded.
    pub fn new<R, X>(required: R, excluded: X) -> Self
    where
        R: IntoIterator<Item = ComponentTypeId>,
        X: IntoIterator<Item = ComponentTypeId>,
    {
        let required = BitSet::from_types(required);
        let excluded = BitSet::from_types(excluded);

        assert!(
            !required.is_empty(),
            "QueryTraits must require at least one component type."
        );

        assert!(
            required.is_disjoint(&excluded),
            "QueryTraits can not both require and exclude {:?}.",
            required
                .iter()
                .filter(|v| excluded.contains(*v))
                .collect::<Vec<_>>()
        );

        QueryTraits { required, excluded }
    }

    #[inline]
    pub fn required(&self) -> &BitSet {
        &self.required
    }

    #[inline]
    pub fn excluded(&self) -> &BitSet {
        &self.excluded
    }

    /// Returns true if an entity with `signature` belongs to this query.
    #[inline]
    pub fn is_match(&self, signature: &Signature) -> bool {
        self.required.is_subset(signature) && self.excluded.is_disjoint(signature)
    }
}

struct CachedQuery {
    traits: QueryTraits,
    members: SparseSet<EntityId, ()>,
}

/// Every query a world has seen, with its current members.
pub(crate) struct QueryCache {
    queries: Vec<CachedQuery>,
    remap: HashMap<QueryTraits, QueryId>,
}

impl QueryCache {
    pub fn with_capacity(capacity: usize) -> Self {
        QueryCache {
            queries: Vec::with_capacity(capacity),
            remap: HashMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    #[inline]
    pub fn find(&self, traits: &QueryTraits) -> Option<QueryId> {
        self.remap.get(traits).cloned()
    }

    /// Caches `traits` with an empty member set.
    pub fn insert(&mut self, traits: QueryTraits) -> QueryId {
        let id = QueryId::new(self.queries.len() as u32);
        self.remap.insert(traits.clone(), id);
        self.queries.push(CachedQuery {
            traits,
            members: SparseSet::new(),
        });

        id
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this cache.
    #[inline]
    pub fn traits(&self, id: QueryId) -> &QueryTraits {
        &self.get(id).traits
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this cache.
    #[inline]
    pub fn members(&self, id: QueryId) -> &SparseSet<EntityId, ()> {
        &self.get(id).members
    }

    /// Returns the sum of all member set sizes.
    pub fn num_members(&self) -> usize {
        self.queries.iter().map(|v| v.members.len()).sum()
    }

    /// Re-evaluates `entity`, now carrying `signature`, against every query.
    pub fn update(&mut self, entity: EntityId, signature: &Signature, events: &EventBus) {
        for (index, v) in self.queries.iter_mut().enumerate() {
            let query = QueryId::new(index as u32);

            match (v.traits.is_match(signature), v.members.contains(entity)) {
                (true, false) => {
                    v.members.insert(entity, ());
                    events.emit(Event::QueryMemberAdded { query, entity });
                }
                (false, true) => {
                    v.members.remove(entity);
                    events.emit(Event::QueryMemberRemoved { query, entity });
                }
                _ => {}
            }
        }
    }

    /// Adds `entity` to `id` if `signature` matches. Used while seeding.
    fn seed(&mut self, id: QueryId, entity: EntityId, signature: &Signature, events: &EventBus) {
        let v = &mut self.queries[id.slot()];
        if v.traits.is_match(signature) && v.members.insert(entity, ()).is_none() {
            events.emit(Event::QueryMemberAdded { query: id, entity });
        }
    }

    fn get(&self, id: QueryId) -> &CachedQuery {
        match self.queries.get(id.slot()) {
            Some(v) => v,
            None => panic!("{} has never been issued by this world.", id),
        }
    }
}

/// Type ids of a `ComponentSet`, in tuple order.
pub type TypeList = SmallVec<[ComponentTypeId; 8]>;

/// A compile-time list of component types, implemented for `()` and for
/// tuples of up to six components.
pub trait ComponentSet: 'static {
    /// Registers every type of the set, returning their ids in order.
    fn register(world: &mut World) -> TypeList;
}

impl ComponentSet for () {
    fn register(_: &mut World) -> TypeList {
        TypeList::new()
    }
}

/// A `ComponentSet` whose components can be fetched for every member of a
/// query.
pub trait Requirements: ComponentSet {
    type Arenas<'w>: Copy
    where
        Self: 'w;
    type Item<'w>
    where
        Self: 'w;
    type Storage;
    type ItemMut<'s>
    where
        Self: 's;

    #[doc(hidden)]
    fn arenas<'w>(world: &'w World) -> Self::Arenas<'w>;
    #[doc(hidden)]
    fn fetch<'w>(arenas: Self::Arenas<'w>, slot: usize) -> Self::Item<'w>;
    #[doc(hidden)]
    fn take(world: &mut World) -> Self::Storage;
    #[doc(hidden)]
    fn restore(world: &mut World, storage: Self::Storage);
    #[doc(hidden)]
    fn fetch_mut<'s>(storage: &'s mut Self::Storage, slot: usize) -> Self::ItemMut<'s>;
}

#[inline]
fn registered<T: Component>(world: &World) -> ComponentTypeId {
    match world.components.id::<T>() {
        Some(ty) => ty,
        None => panic!(
            "Component type {} is not registered.",
            any::type_name::<T>()
        ),
    }
}

macro_rules! impl_requirements {
    ($($T:ident : $v:ident),+) => {
        impl<$($T: Component),+> ComponentSet for ($($T,)+) {
            fn register(world: &mut World) -> TypeList {
                let mut types = TypeList::new();
                $( types.push(world.register::<$T>()); )+
                types
            }
        }

        impl<$($T: Component),+> Requirements for ($($T,)+) {
            type Arenas<'w> = ($(&'w SlotArray<$T>,)+);
            type Item<'w> = ($(&'w $T,)+);
            type Storage = ($(Box<SlotArray<$T>>,)+);
            type ItemMut<'s> = ($(&'s mut $T,)+);

            fn arenas<'w>(world: &'w World) -> Self::Arenas<'w> {
                ($( world.components.arena::<$T>(registered::<$T>(world)), )+)
            }

            #[inline]
            fn fetch<'w>(arenas: Self::Arenas<'w>, slot: usize) -> Self::Item<'w> {
                let ($($v,)+) = arenas;
                ($( $v.get_unchecked(slot), )+)
            }

            fn take(world: &mut World) -> Self::Storage {
                ($({
                    let ty = world.register::<$T>();
                    world.components.take::<$T>(ty)
                },)+)
            }

            fn restore(world: &mut World, storage: Self::Storage) {
                let ($($v,)+) = storage;
                $({
                    let ty = registered::<$T>(world);
                    world.components.restore::<$T>(ty, $v);
                })+
            }

            #[inline]
            fn fetch_mut<'s>(storage: &'s mut Self::Storage, slot: usize) -> Self::ItemMut<'s> {
                let ($($v,)+) = storage;
                ($( $v.get_unchecked_mut(slot), )+)
            }
        }
    };
}

impl_requirements!(A: a);
impl_requirements!(A: a, B: b);
impl_requirements!(A: a, B: b, C: c);
impl_requirements!(A: a, B: b, C: c, D: d);
impl_requirements!(A: a, B: b, C: c, D: d, E: e);
impl_requirements!(A: a, B: b, C: c, D: d, E: e, F: f);

impl World {
    /// Returns the id of the query defined by `traits`, creating and seeding
    /// it if it has never been seen.
    pub fn query_traits(&mut self, traits: QueryTraits) -> QueryId {
        if let Some(id) = self.queries.find(&traits) {
            return id;
        }

        let id = self.queries.insert(traits);
        self.events.emit(Event::QueryCreated(id));

        for entity in self.entities.keys() {
            let signature = &self.signatures[entity.slot()];
            self.queries.seed(id, entity, signature, &self.events);
        }

        debug!(
            "Creates {} with {:?}, seeded with {} members.",
            id,
            self.queries.traits(id),
            self.queries.members(id).len()
        );

        id
    }

    /// Returns a query over entities having every component of `R`.
    #[inline]
    pub fn query<R: Requirements>(&mut self) -> Query<'_, R> {
        self.query_filtered::<R, ()>()
    }

    /// Returns a query over entities having every component of `R` and none
    /// of `X`.
    pub fn query_filtered<R: Requirements, X: ComponentSet>(&mut self) -> Query<'_, R> {
        let id = self.prepare::<R, X>();
        Query::new(self, id)
    }

    /// Mutable counterpart of `query`.
    #[inline]
    pub fn query_mut<R: Requirements>(&mut self) -> QueryMut<'_, R> {
        self.query_filtered_mut::<R, ()>()
    }

    /// Mutable counterpart of `query_filtered`.
    pub fn query_filtered_mut<R: Requirements, X: ComponentSet>(&mut self) -> QueryMut<'_, R> {
        let id = self.prepare::<R, X>();
        QueryMut::new(self, id)
    }

    /// Returns the current members of a cached query.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this world.
    #[inline]
    pub fn members(&self, id: QueryId) -> Keys<'_, EntityId, ()> {
        self.queries.members(id).keys()
    }

    /// Returns true if `entity` is currently a member of query `id`.
    #[inline]
    pub fn is_member(&self, entity: EntityId, id: QueryId) -> bool {
        self.queries.members(id).contains(entity)
    }

    /// Returns the traits of a cached query.
    #[inline]
    pub fn traits_of(&self, id: QueryId) -> &QueryTraits {
        self.queries.traits(id)
    }

    /// Returns the number of distinct queries cached by this world.
    #[inline]
    pub fn num_queries(&self) -> usize {
        self.queries.len()
    }

    fn prepare<R: ComponentSet, X: ComponentSet>(&mut self) -> QueryId {
        let required = R::register(self);
        let excluded = X::register(self);
        let traits = QueryTraits::new(required.iter().cloned(), excluded.iter().cloned());

        assert_eq!(
            traits.required().len(),
            required.len(),
            "Query requires the same component type more than once in {}.",
            any::type_name::<R>()
        );

        self.query_traits(traits)
    }
}

/// A live, read-only view of one cached query.
pub struct Query<'w, R: Requirements> {
    world: &'w World,
    id: QueryId,
    _marker: PhantomData<R>,
}

impl<'w, R: Requirements> Query<'w, R> {
    fn new(world: &'w World, id: QueryId) -> Self {
        Query {
            world,
            id,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn id(&self) -> QueryId {
        self.id
    }

    #[inline]
    pub fn traits(&self) -> &'w QueryTraits {
        self.world.queries.traits(self.id)
    }

    /// Returns the number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.members().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members().is_empty()
    }

    /// Returns true if `entity` is currently a member.
    #[inline]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.members().contains(entity)
    }

    /// Returns true if the current signature of `entity` satisfies this
    /// query.
    #[inline]
    pub fn can_become_member(&self, entity: EntityId) -> bool {
        self.world
            .signature(entity)
            .map(|v| self.traits().is_match(v))
            .unwrap_or(false)
    }

    /// Returns the components of `entity` if it is a member.
    pub fn get(&self, entity: EntityId) -> Option<R::Item<'w>> {
        if self.contains(entity) {
            Some(R::fetch(R::arenas(self.world), entity.slot()))
        } else {
            None
        }
    }

    /// Returns an iterator over the members, in no particular order.
    #[inline]
    pub fn entities(&self) -> Keys<'w, EntityId, ()> {
        self.members().keys()
    }

    /// Returns an iterator over the components of every member, in no
    /// particular order.
    pub fn iter(&self) -> impl Iterator<Item = R::Item<'w>> + 'w {
        let arenas = R::arenas(self.world);
        self.entities().map(move |v| R::fetch(arenas, v.slot()))
    }

    /// Returns an iterator over every member and its components.
    pub fn iter_with_entities(&self) -> impl Iterator<Item = (EntityId, R::Item<'w>)> + 'w {
        let arenas = R::arenas(self.world);
        self.entities().map(move |v| (v, R::fetch(arenas, v.slot())))
    }

    /// Returns the `(parent, child)` edges below `root` whose child is a
    /// member. Only member children are descended into.
    ///
    /// Pairs are collected depth-first and handed out in stack-pop order,
    /// so the deepest edges come first. Reverse the result if top-down
    /// order matters.
    pub fn relatives(&self, root: EntityId) -> Relatives {
        let mut pairs = Vec::new();
        let mut stack = vec![root];

        while let Some(parent) = stack.pop() {
            let from = pairs.len();
            for child in self.world.children(parent) {
                if self.contains(child) {
                    pairs.push((parent, child));
                }
            }

            stack.extend(pairs[from..].iter().rev().map(|&(_, child)| child));
        }

        Relatives { pairs }
    }

    #[inline]
    fn members(&self) -> &'w SparseSet<EntityId, ()> {
        self.world.queries.members(self.id)
    }
}

/// `(parent, child)` pairs produced by `Query::relatives`.
pub struct Relatives {
    pairs: Vec<(EntityId, EntityId)>,
}

impl Iterator for Relatives {
    type Item = (EntityId, EntityId);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.pairs.pop()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.pairs.len(), Some(self.pairs.len()))
    }
}

impl ExactSizeIterator for Relatives {}

/// A view of one cached query with mutable access to its components.
pub struct QueryMut<'w, R: Requirements> {
    world: &'w mut World,
    id: QueryId,
    _marker: PhantomData<R>,
}

impl<'w, R: Requirements> QueryMut<'w, R> {
    fn new(world: &'w mut World, id: QueryId) -> Self {
        QueryMut {
            world,
            id,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn id(&self) -> QueryId {
        self.id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.world.queries.members(self.id).len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over the members, in no particular order.
    #[inline]
    pub fn entities(&self) -> Keys<'_, EntityId, ()> {
        self.world.queries.members(self.id).keys()
    }

    /// Calls `func` with every member and mutable references to its
    /// components, in no particular order. The arenas are handed back to the
    /// world even if `func` panics.
    pub fn for_each<F>(&mut self, mut func: F)
    where
        F: FnMut(EntityId, R::ItemMut<'_>),
    {
        let id = self.id;
        let storage = R::take(self.world);
        let mut lent = Lent::<R> {
            world: &mut *self.world,
            storage: Some(storage),
        };

        let Lent { world, storage } = &mut lent;
        if let Some(storage) = storage.as_mut() {
            for v in world.queries.members(id).keys() {
                func(v, R::fetch_mut(&mut *storage, v.slot()));
            }
        }
    }
}

/// Arenas moved out of a world, restored on drop.
struct Lent<'a, R: Requirements> {
    world: &'a mut World,
    storage: Option<R::Storage>,
}

impl<'a, R: Requirements> Drop for Lent<'a, R> {
    fn drop(&mut self) {
        if let Some(storage) = self.storage.take() {
            R::restore(&mut *self.world, storage);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Position(u32);
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Velocity(u32);
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Frozen;
    declare_component!(Position, Velocity, Frozen);

    fn id(v: u32) -> ComponentTypeId {
        ComponentTypeId::new(v)
    }

    #[test]
    fn traits() {
        let traits = QueryTraits::new(vec![id(0), id(1)], vec![id(2)]);
        assert!(traits.is_match(&BitSet::from_types(vec![id(0), id(1)])));
        assert!(traits.is_match(&BitSet::from_types(vec![id(0), id(1), id(3)])));
        assert!(!traits.is_match(&BitSet::from_types(vec![id(0)])));
        assert!(!traits.is_match(&BitSet::from_types(vec![id(0), id(1), id(2)])));

        let rhs = QueryTraits::new(vec![id(1), id(0)], vec![id(2)]);
        assert_eq!(traits, rhs);
    }

    #[test]
    #[should_panic]
    fn empty_traits() {
        QueryTraits::new(vec![], vec![id(2)]);
    }

    #[test]
    #[should_panic]
    fn overlapped_traits() {
        QueryTraits::new(vec![id(1), id(2)], vec![id(2)]);
    }

    #[test]
    fn cached() {
        let mut world = World::new();
        let lhs = world.query::<(Position, Velocity)>().id();
        let rhs = world.query::<(Velocity, Position)>().id();
        let filtered = world.query_filtered::<(Position,), (Frozen,)>().id();

        assert_eq!(lhs, rhs);
        assert_ne!(lhs, filtered);
        assert_eq!(world.num_queries(), 2);
    }

    #[test]
    #[should_panic]
    fn duplicated_types() {
        let mut world = World::new();
        world.query::<(Position, Position)>();
    }

    #[test]
    fn filtered() {
        let mut world = World::new();
        let e1 = world.build().with(Position(1)).finish();
        let e2 = world.build().with(Position(2)).with(Frozen).finish();

        let query = world.query_filtered::<(Position,), (Frozen,)>();
        assert_eq!(query.len(), 1);
        assert!(query.contains(e1));
        assert!(!query.contains(e2));
        assert!(!query.can_become_member(e2));
        assert_eq!(query.get(e1), Some((&Position(1),)));
        assert_eq!(query.get(e2), None);

        let id = query.id();
        world.remove::<Frozen>(e2);
        assert!(world.is_member(e2, id));
        assert_eq!(world.members(id).len(), 2);
    }

    #[test]
    fn mutate() {
        let mut world = World::new();
        for i in 0..8 {
            let e = world.build().with(Position(i)).finish();
            if i % 2 == 0 {
                world.add(e, Velocity(10));
            }
        }

        {
            let mut query = world.query_mut::<(Position, Velocity)>();
            assert_eq!(query.len(), 4);
            query.for_each(|_, (p, v): (&mut Position, &mut Velocity)| {
                p.0 += v.0;
                v.0 = 0;
            });
        }

        let mut sum = 0;
        for (p,) in world.query::<(Position,)>().iter() {
            sum += p.0;
        }

        assert_eq!(sum, (0..8).sum::<u32>() + 40);
        assert_eq!(world.num_components(), 12);
    }

    #[test]
    fn mutate_unwind() {
        use std::panic::{self, AssertUnwindSafe};

        let mut world = World::new();
        let e = world.build().with(Position(1)).with(Velocity(2)).finish();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            world
                .query_mut::<(Position, Velocity)>()
                .for_each(|_, (p, _): (&mut Position, &mut Velocity)| {
                    p.0 = 5;
                    panic!("interrupted");
                });
        }));

        assert!(result.is_err());
        assert_eq!(world.get::<Position>(e), Some(&Position(5)));
        assert_eq!(world.get::<Velocity>(e), Some(&Velocity(2)));
        assert_eq!(world.num_components(), 2);
    }
}
