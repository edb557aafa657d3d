// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational node arena with counted parent links.
//!
//! Both pipelines and layers are nodes in a tree: every node except a root
//! has a parent it inherits state from. A [`NodeStore`] keeps the tree
//! topology and a reference count per slot:
//!
//! - A **strong** child holds one reference on its parent, so a parent lives
//!   at least as long as its strong children.
//! - A **weak** child holds no reference. It is still linked into its
//!   parent's child list, so disposing the parent can report it as an
//!   orphan and the owner of the store can react.
//!
//! Disposing a node releases the reference it holds on its parent, which
//! may dispose the parent in turn. The chain unwinds iteratively and every
//! disposed payload is handed back to the caller, since payloads may hold
//! references into other stores.

use alloc::vec::Vec;
use core::fmt;

/// Sentinel value indicating "no node" in index fields.
pub(crate) const INVALID: u32 = u32::MAX;

/// Untyped handle into a [`NodeStore`].
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a node is disposed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@gen{}", self.idx, self.generation)
    }
}

/// A node that was disposed, together with the payload it carried.
#[derive(Debug)]
pub(crate) struct Disposed<T> {
    pub(crate) id: NodeId,
    pub(crate) data: T,
    /// Weak children that were linked to the node and are now unparented.
    pub(crate) orphans: Vec<NodeId>,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    ref_count: u32,
    parent: u32,
    has_parent_reference: bool,
    children: Vec<u32>,
    data: Option<T>,
}

/// Arena of reference-counted tree nodes.
#[derive(Debug)]
pub(crate) struct NodeStore<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
}

impl<T> Default for NodeStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeStore<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Inserts an unparented node holding one reference owned by the caller.
    pub(crate) fn insert(&mut self, data: T) -> NodeId {
        if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.ref_count = 1;
            slot.parent = INVALID;
            slot.has_parent_reference = false;
            slot.children.clear();
            slot.data = Some(data);
            NodeId {
                idx,
                generation: slot.generation,
            }
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(INVALID);
            assert!(idx != INVALID, "node store is full");
            self.slots.push(Slot {
                generation: 0,
                ref_count: 1,
                parent: INVALID,
                has_parent_reference: false,
                children: Vec::new(),
                data: Some(data),
            });
            NodeId { idx, generation: 0 }
        }
    }

    /// Returns whether the handle refers to a live node.
    pub(crate) fn is_alive(&self, id: NodeId) -> bool {
        self.slots
            .get(id.idx as usize)
            .is_some_and(|slot| slot.generation == id.generation && slot.data.is_some())
    }

    /// Returns the number of live nodes.
    pub(crate) fn live_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub(crate) fn get(&self, id: NodeId) -> &T {
        self.validate(id);
        match &self.slots[id.idx as usize].data {
            Some(data) => data,
            None => unreachable!("validated slot has a payload"),
        }
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut T {
        self.validate(id);
        match &mut self.slots[id.idx as usize].data {
            Some(data) => data,
            None => unreachable!("validated slot has a payload"),
        }
    }

    /// Returns the parent of a node, if any.
    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.handle_at(self.slots[id.idx as usize].parent)
    }

    /// Whether this node holds a reference on its parent.
    pub(crate) fn has_parent_reference(&self, id: NodeId) -> bool {
        self.validate(id);
        self.slots[id.idx as usize].has_parent_reference
    }

    pub(crate) fn has_children(&self, id: NodeId) -> bool {
        self.validate(id);
        !self.slots[id.idx as usize].children.is_empty()
    }

    /// Returns a snapshot of the direct children in insertion order.
    pub(crate) fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.validate(id);
        self.slots[id.idx as usize]
            .children
            .iter()
            .filter_map(|&c| self.handle_at(c))
            .collect()
    }

    /// Returns the path from `id` up to its root, inclusive on both ends.
    pub(crate) fn ancestry(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            path.push(node);
            current = self.parent(node);
        }
        path
    }

    pub(crate) fn ref_count(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.slots[id.idx as usize].ref_count
    }

    /// Takes an additional reference on a node.
    pub(crate) fn ref_node(&mut self, id: NodeId) {
        self.validate(id);
        self.slots[id.idx as usize].ref_count += 1;
    }

    /// Releases one reference, disposing the node (and possibly its
    /// ancestors) when the count reaches zero.
    #[must_use = "disposed payloads may hold references that must be released"]
    pub(crate) fn unref(&mut self, id: NodeId) -> Vec<Disposed<T>> {
        self.validate(id);
        let mut disposed = Vec::new();
        let mut next = Some(id.idx);
        while let Some(idx) = next.take() {
            let slot = &mut self.slots[idx as usize];
            debug_assert!(slot.ref_count > 0, "node {idx} is over-released");
            slot.ref_count -= 1;
            if slot.ref_count > 0 {
                break;
            }
            let (node, release_parent) = self.dispose_slot(idx);
            disposed.push(node);
            next = release_parent;
        }
        disposed
    }

    /// Disposes a node regardless of outstanding references.
    ///
    /// Only valid for nodes that have no strong children.
    #[must_use = "disposed payloads may hold references that must be released"]
    pub(crate) fn dispose(&mut self, id: NodeId) -> Vec<Disposed<T>> {
        self.validate(id);
        self.slots[id.idx as usize].ref_count = 1;
        self.unref(id)
    }

    /// Links `node` under `parent`, unlinking it from any previous parent.
    ///
    /// A reference on `parent` is held for the duration of the call so that
    /// unlinking from the old parent cannot dispose the new one. With
    /// `take_strong_ref == false` that temporary reference is released at
    /// the end, which disposes `parent` if nothing else holds it.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or if `node` is already a child of
    /// `parent`.
    #[must_use = "disposed payloads may hold references that must be released"]
    pub(crate) fn attach(
        &mut self,
        node: NodeId,
        parent: NodeId,
        take_strong_ref: bool,
    ) -> Vec<Disposed<T>> {
        self.validate(node);
        self.validate(parent);
        assert!(
            self.slots[node.idx as usize].parent != parent.idx,
            "node {node:?} is already a child of {parent:?}"
        );
        assert!(node != parent, "node {node:?} cannot be its own parent");

        self.ref_node(parent);
        let mut disposed = self.detach(node);

        self.slots[parent.idx as usize].children.push(node.idx);
        let slot = &mut self.slots[node.idx as usize];
        slot.parent = parent.idx;
        slot.has_parent_reference = take_strong_ref;

        if !take_strong_ref {
            disposed.extend(self.unref(parent));
        }
        disposed
    }

    /// Unlinks `node` from its parent. No-op if the node has no parent.
    #[must_use = "disposed payloads may hold references that must be released"]
    pub(crate) fn detach(&mut self, node: NodeId) -> Vec<Disposed<T>> {
        self.validate(node);
        let parent = self.slots[node.idx as usize].parent;
        if parent == INVALID {
            return Vec::new();
        }
        self.unlink_from_parent(node.idx);

        let slot = &mut self.slots[node.idx as usize];
        let strong = core::mem::replace(&mut slot.has_parent_reference, false);
        if strong {
            let parent = NodeId {
                idx: parent,
                generation: self.slots[parent as usize].generation,
            };
            self.unref(parent)
        } else {
            Vec::new()
        }
    }

    /// Invokes `f` once per direct child.
    ///
    /// The child list is snapshotted first, so `f` may detach or dispose
    /// children. Children disposed by an earlier call are skipped.
    pub(crate) fn for_each_child(&mut self, id: NodeId, mut f: impl FnMut(&mut Self, NodeId)) {
        for child in self.child_ids(id) {
            if self.is_alive(child) {
                f(self, child);
            }
        }
    }

    // -- Internal helpers --

    fn handle_at(&self, idx: u32) -> Option<NodeId> {
        (idx != INVALID).then(|| NodeId {
            idx,
            generation: self.slots[idx as usize].generation,
        })
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale node handle: {id:?} (current gen: {})",
            self.slots
                .get(id.idx as usize)
                .map_or(u32::MAX, |slot| slot.generation)
        );
    }

    fn unlink_from_parent(&mut self, idx: u32) {
        let parent = self.slots[idx as usize].parent;
        let siblings = &mut self.slots[parent as usize].children;
        if let Some(pos) = siblings.iter().position(|&c| c == idx) {
            siblings.remove(pos);
        }
        self.slots[idx as usize].parent = INVALID;
    }

    /// Frees a slot whose count reached zero. Returns the parent to release
    /// if the node held a strong reference on it.
    fn dispose_slot(&mut self, idx: u32) -> (Disposed<T>, Option<u32>) {
        let children = core::mem::take(&mut self.slots[idx as usize].children);
        let mut orphans = Vec::with_capacity(children.len());
        for child in children {
            let slot = &mut self.slots[child as usize];
            debug_assert!(
                !slot.has_parent_reference,
                "strong child {child} outlived its parent {idx}"
            );
            slot.parent = INVALID;
            orphans.push(NodeId {
                idx: child,
                generation: slot.generation,
            });
        }

        let parent = self.slots[idx as usize].parent;
        if parent != INVALID {
            self.unlink_from_parent(idx);
        }

        let slot = &mut self.slots[idx as usize];
        let strong = core::mem::replace(&mut slot.has_parent_reference, false);
        let Some(data) = slot.data.take() else {
            unreachable!("disposing an empty slot {idx}")
        };
        let id = NodeId {
            idx,
            generation: slot.generation,
        };
        // Bump generation so old handles immediately fail validation.
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(idx);

        let release = (strong && parent != INVALID).then_some(parent);
        (Disposed { id, data, orphans }, release)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn insert_and_release() {
        let mut store = NodeStore::new();
        let id = store.insert("a");
        assert!(store.is_alive(id));
        let disposed = store.unref(id);
        assert_eq!(disposed.len(), 1);
        assert_eq!(disposed[0].data, "a");
        assert!(!store.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = NodeStore::new();
        let first = store.insert(1);
        let _ = store.unref(first);
        let second = store.insert(2);
        assert_eq!(first.idx, second.idx);
        assert!(!store.is_alive(first));
        assert!(store.is_alive(second));
    }

    #[test]
    fn strong_child_keeps_parent_alive() {
        let mut store = NodeStore::new();
        let parent = store.insert("parent");
        let child = store.insert("child");
        assert!(store.attach(child, parent, true).is_empty());

        // Caller drops its reference; the child still holds one.
        assert!(store.unref(parent).is_empty());
        assert!(store.is_alive(parent));
        assert_eq!(store.parent(child), Some(parent));

        // Releasing the child unwinds the chain.
        let disposed = store.unref(child);
        let names: Vec<_> = disposed.iter().map(|d| d.data).collect();
        assert_eq!(names, vec!["child", "parent"]);
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn weak_child_is_orphaned_on_parent_disposal() {
        let mut store = NodeStore::new();
        let parent = store.insert("parent");
        let weak = store.insert("weak");
        assert!(store.attach(weak, parent, false).is_empty());
        assert_eq!(store.ref_count(parent), 1);
        assert!(!store.has_parent_reference(weak));

        let disposed = store.unref(parent);
        assert_eq!(disposed.len(), 1);
        assert_eq!(disposed[0].orphans, vec![weak]);
        assert_eq!(store.parent(weak), None);
        assert!(store.is_alive(weak));
    }

    #[test]
    fn dispose_ignores_outstanding_references() {
        let mut store = NodeStore::new();
        let parent = store.insert("parent");
        let node = store.insert("node");
        assert!(store.attach(node, parent, true).is_empty());
        let _ = store.unref(parent);
        store.ref_node(node);
        store.ref_node(node);

        let disposed = store.dispose(node);
        let names: Vec<_> = disposed.iter().map(|d| d.data).collect();
        assert_eq!(names, vec!["node", "parent"]);
        assert!(!store.is_alive(node));
    }

    #[test]
    fn attach_reparents_and_releases_old_parent() {
        let mut store = NodeStore::new();
        let root = store.insert("root");
        let old = store.insert("old");
        let node = store.insert("node");
        assert!(store.attach(old, root, true).is_empty());
        assert!(store.attach(node, old, true).is_empty());
        let _ = store.unref(old);

        // `old` is only alive through `node`; moving `node` under `root`
        // disposes it without touching `root`.
        let disposed = store.attach(node, root, true);
        assert_eq!(disposed.len(), 1);
        assert_eq!(disposed[0].data, "old");
        assert_eq!(store.parent(node), Some(root));
        assert_eq!(store.child_ids(root), vec![node]);
    }

    #[test]
    fn detach_is_noop_without_parent() {
        let mut store = NodeStore::new();
        let node = store.insert(0);
        assert!(store.detach(node).is_empty());
        assert_eq!(store.parent(node), None);
    }

    #[test]
    fn for_each_child_tolerates_detaching() {
        let mut store = NodeStore::new();
        let parent = store.insert(0);
        let a = store.insert(1);
        let b = store.insert(2);
        assert!(store.attach(a, parent, true).is_empty());
        assert!(store.attach(b, parent, true).is_empty());

        let mut visited = Vec::new();
        store.for_each_child(parent, |store, child| {
            visited.push(child);
            let _ = store.detach(child);
        });
        assert_eq!(visited, vec![a, b]);
        assert!(!store.has_children(parent));
    }

    #[test]
    fn ancestry_runs_to_root() {
        let mut store = NodeStore::new();
        let root = store.insert(0);
        let mid = store.insert(1);
        let leaf = store.insert(2);
        assert!(store.attach(mid, root, true).is_empty());
        assert!(store.attach(leaf, mid, true).is_empty());
        assert_eq!(store.ancestry(leaf), vec![leaf, mid, root]);
    }

    #[test]
    #[should_panic(expected = "already a child")]
    fn attaching_to_same_parent_panics() {
        let mut store = NodeStore::new();
        let parent = store.insert(0);
        let child = store.insert(1);
        let _ = store.attach(child, parent, true);
        let _ = store.attach(child, parent, true);
    }

    #[test]
    #[should_panic(expected = "stale node handle")]
    fn stale_handle_panics() {
        let mut store = NodeStore::new();
        let id = store.insert(0);
        let _ = store.unref(id);
        let _ = store.get(id);
    }
}
