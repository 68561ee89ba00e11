//! Parent/child relationships between entities.
//!
//! The scene graph is a secondary index kept next to the components. It
//! knows nothing about transforms or rendering; hosts drive their own
//! traversals through `World::walk` and decide per node whether to descend.

use std::collections::{HashMap, HashSet};

use super::events::Event;
use super::world::World;
use super::EntityId;
use crate::errors::*;

/// The answer of a `World::walk` visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    /// Visits the children of the current node.
    Descend,
    /// Skips the whole subtree below the current node.
    Skip,
}

/// Forest of single-parent edges. `parents[c] == p` iff `children[p]`
/// contains `c`.
#[derive(Debug, Default)]
pub(crate) struct SceneGraph {
    children: HashMap<EntityId, HashSet<EntityId>>,
    parents: HashMap<EntityId, EntityId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        SceneGraph::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.parents.is_empty()
    }

    #[inline]
    pub fn parent(&self, child: EntityId) -> Option<EntityId> {
        self.parents.get(&child).cloned()
    }

    #[inline]
    pub fn num_children(&self, parent: EntityId) -> usize {
        self.children.get(&parent).map(|v| v.len()).unwrap_or(0)
    }

    #[inline]
    pub fn children(&self, parent: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.children
            .get(&parent)
            .into_iter()
            .flat_map(|v| v.iter().cloned())
    }

    /// Inserts the edge, returns false if it already exists.
    fn link(&mut self, child: EntityId, parent: EntityId) -> bool {
        self.parents.insert(child, parent);
        self.children
            .entry(parent)
            .or_insert_with(HashSet::new)
            .insert(child)
    }

    /// Removes the edge, returns false if it does not exist.
    fn unlink(&mut self, child: EntityId, parent: EntityId) -> bool {
        let removed = match self.children.get_mut(&parent) {
            Some(children) => {
                let removed = children.remove(&child);
                if children.is_empty() {
                    self.children.remove(&parent);
                }
                removed
            }
            None => false,
        };

        if removed {
            self.parents.remove(&child);
        }

        removed
    }
}

impl World {
    /// Attachs `child` under `parent`. If `child` already has another parent,
    /// that edge is removed first. Returns false if the edge already exists.
    ///
    /// Fails if either entity is dead, if `child == parent`, or if `parent`
    /// is a descendant of `child`.
    pub fn add_child(&mut self, child: EntityId, parent: EntityId) -> Result<bool> {
        let err = if !self.is_alive(child) {
            Some(Error::EntityNotFound(child))
        } else if !self.is_alive(parent) {
            Some(Error::EntityNotFound(parent))
        } else if child == parent {
            Some(Error::SelfParent(child))
        } else if self.is_ancestor(parent, child) {
            Some(Error::CyclicHierarchy { child, parent })
        } else {
            None
        };

        if let Some(err) = err {
            self.events.error(err.clone());
            return Err(err);
        }

        match self.scene.parent(child) {
            Some(prev) if prev == parent => return Ok(false),
            Some(prev) => {
                self.remove_child(child, prev);
            }
            None => {}
        }

        self.scene.link(child, parent);
        self.events.emit(Event::ChildAdded { parent, child });
        Ok(true)
    }

    /// Detachs `child` from `parent`. Returns false if there was no such
    /// edge.
    pub fn remove_child(&mut self, child: EntityId, parent: EntityId) -> bool {
        if self.scene.unlink(child, parent) {
            self.events.emit(Event::ChildRemoved { parent, child });
            true
        } else {
            false
        }
    }

    /// Detachs every child of `parent`. The children themselves are kept
    /// alive.
    pub fn remove_all_children(&mut self, parent: EntityId) -> usize {
        let children: Vec<_> = self.scene.children(parent).collect();
        for &child in &children {
            self.remove_child(child, parent);
        }

        children.len()
    }

    /// Detachs `child` from its parent, if any.
    pub fn remove_from_parent(&mut self, child: EntityId) -> bool {
        match self.scene.parent(child) {
            Some(parent) => self.remove_child(child, parent),
            None => false,
        }
    }

    /// Gets the parent node.
    #[inline]
    pub fn parent(&self, child: EntityId) -> Option<EntityId> {
        self.scene.parent(child)
    }

    /// Returns an iterator over the children of `parent`, in no particular
    /// order.
    #[inline]
    pub fn children(&self, parent: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.scene.children(parent)
    }

    #[inline]
    pub fn num_children(&self, parent: EntityId) -> usize {
        self.scene.num_children(parent)
    }

    /// Returns ture if this is the root of a hierarchy, aka. has no parent.
    #[inline]
    pub fn is_root(&self, id: EntityId) -> bool {
        self.is_alive(id) && self.scene.parent(id).is_none()
    }

    /// Returns ture if this is the leaf of a hierarchy, aka. has no child.
    #[inline]
    pub fn is_leaf(&self, id: EntityId) -> bool {
        self.is_alive(id) && self.scene.num_children(id) == 0
    }

    /// Returns an iterator of its ancestors, nearest first.
    #[inline]
    pub fn ancestors(&self, id: EntityId) -> Ancestors<'_> {
        Ancestors {
            world: self,
            cursor: self.scene.parent(id),
        }
    }

    /// Return true if `rhs` is one of the ancestors of `lhs`.
    pub fn is_ancestor(&self, lhs: EntityId, rhs: EntityId) -> bool {
        self.ancestors(lhs).any(|v| v == rhs)
    }

    /// Returns an iterator of its descendants, depth first.
    pub fn descendants(&self, id: EntityId) -> Descendants<'_> {
        Descendants {
            world: self,
            stack: self.scene.children(id).collect(),
        }
    }

    /// Walks the hierarchy below `root` depth first in pre-order. `visitor`
    /// receives every node with its parent, `None` for `root`, and decides
    /// whether the subtree below that node is visited.
    pub fn walk<F>(&self, root: EntityId, mut visitor: F)
    where
        F: FnMut(EntityId, Option<EntityId>) -> WalkAction,
    {
        let mut stack = vec![(root, None)];

        while let Some((node, parent)) = stack.pop() {
            if visitor(node, parent) == WalkAction::Skip {
                continue;
            }

            let from = stack.len();
            stack.extend(self.scene.children(node).map(|v| (v, Some(node))));
            stack[from..].reverse();
        }
    }

    /// Removes every edge touching `id`.
    pub(crate) fn detach_hierarchy(&mut self, id: EntityId) {
        self.remove_all_children(id);
        self.remove_from_parent(id);
    }
}

/// An iterator of its ancestors.
pub struct Ancestors<'a> {
    world: &'a World,
    cursor: Option<EntityId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = EntityId;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.cursor.and_then(|v| self.world.scene.parent(v));
        ::std::mem::replace(&mut self.cursor, next)
    }
}

/// An iterator of its descendants, depth first.
pub struct Descendants<'a> {
    world: &'a World,
    stack: Vec<EntityId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = EntityId;

    fn next(&mut self) -> Option<Self::Item> {
        let v = self.stack.pop()?;
        self.stack.extend(self.world.scene.children(v));
        Some(v)
    }
}
