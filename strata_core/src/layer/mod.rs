// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer graph: texture-combine stages with copy-on-write inheritance.
//!
//! A *layer* is one texture stage of a pipeline. Layers form a tree in the
//! context's layer arena:
//!
//! - The context's root layer stores a value for every [`LayerState`] group.
//! - Every other layer starts as a pure copy of its parent (`differences` is
//!   empty) and stores only the groups that were set on it directly.
//! - The nearest node, walking up from a layer, whose `differences` contains
//!   a group is that group's *authority*.
//!
//! A layer is never mutated once another pipeline or layer can observe it.
//! Changing a shared layer forks a private child that becomes the new
//! authority for the changed group, and the owning pipeline swaps the fork in
//! for the original.
//!
//! Callers never see layer nodes change under them: all mutation goes
//! through the per-layer setters on [`Context`], which resolve the layer by
//! pipeline and index.

mod compare;
mod id;
mod state;

pub use id::LayerId;
pub use state::{
    CombineArg, CombineChannel, CombineFunc, CombineFunction, CombineOp, CombineSource,
    CombineState, Snippet, SnippetHook, TextureType,
};

pub(crate) use compare::group_equal as layer_group_equal;
pub(crate) use state::LayerData;

use crate::context::Context;
use crate::pipeline::PipelineId;
use crate::state::{LayerState, PipelineState};
use crate::trace::{AncestryPrunedEvent, LayerForkEvent, PrunedNode};

impl Context {
    pub(crate) fn layer(&self, layer: LayerId) -> &LayerData {
        self.layers.get(layer.0)
    }

    pub(crate) fn layer_mut(&mut self, layer: LayerId) -> &mut LayerData {
        self.layers.get_mut(layer.0)
    }

    /// Returns the nearest node at or above `layer` that stores `group`.
    ///
    /// # Panics
    ///
    /// Panics if no ancestor stores the group, which means the layer is not
    /// rooted at a context's default layer.
    #[must_use]
    pub fn layer_authority(&self, layer: LayerId, group: LayerState) -> LayerId {
        let mut current = layer.0;
        loop {
            if self.layers.get(current).differences.intersects(group) {
                return LayerId(current);
            }
            match self.layers.parent(current) {
                Some(parent) => current = parent,
                None => panic!("no authority for {group:?} above {layer:?}"),
            }
        }
    }

    /// The parent of a layer node, if it is not the root.
    #[must_use]
    pub fn layer_parent(&self, layer: LayerId) -> Option<LayerId> {
        self.layers.parent(layer.0).map(LayerId)
    }

    /// The groups a layer node stores locally.
    #[must_use]
    pub fn layer_differences(&self, layer: LayerId) -> LayerState {
        self.layer(layer).differences
    }

    /// The pipeline that directly owns a layer node, if any.
    #[must_use]
    pub fn layer_owner(&self, layer: LayerId) -> Option<PipelineId> {
        self.layer(layer).owner
    }

    /// The user-visible index of a layer node.
    #[must_use]
    pub fn layer_index(&self, layer: LayerId) -> u32 {
        self.layer(layer).index
    }

    /// Returns whether a layer handle still refers to a live node.
    #[must_use]
    pub fn is_layer_alive(&self, layer: LayerId) -> bool {
        self.layers.is_alive(layer.0)
    }

    /// Derives a new unowned layer inheriting everything from `source`.
    ///
    /// The caller owns the returned reference.
    pub(crate) fn layer_copy(&mut self, source: LayerId) -> LayerId {
        let data = LayerData::derived(self.layer(source).index, self.samplers.default_entry());
        let copy = LayerId(self.layers.insert(data));
        let disposed = self.layers.attach(copy.0, source.0, true);
        debug_assert!(disposed.is_empty(), "attaching a fresh layer disposed nodes");
        copy
    }

    /// Releases a reference on a layer. Layers hold no references into
    /// other stores, so disposed payloads need no follow-up.
    pub(crate) fn release_layer(&mut self, layer: LayerId) {
        let disposed = self.layers.unref(layer.0);
        debug_assert!(
            disposed.iter().all(|d| d.data.owner.is_none()),
            "disposed a layer that still had an owner"
        );
    }

    /// Prepares `layer` for a change to `change`, forking it if it is shared.
    ///
    /// Returns the layer that must be written, which differs from `layer`
    /// when a fork happened.
    ///
    /// # Panics
    ///
    /// Panics if `layer` is shared and no owning pipeline is given.
    pub(crate) fn layer_pre_change_notify(
        &mut self,
        required_owner: Option<PipelineId>,
        layer: LayerId,
        change: LayerState,
    ) -> LayerId {
        let mut layer = layer;
        let private = !self.layers.has_children(layer.0) && self.layer(layer).owner.is_none();

        if !private {
            let Some(owner) = required_owner else {
                panic!("shared layer {layer:?} changed without an owning pipeline");
            };
            // A layer change is observable as a change of the owning pipeline.
            self.pipeline_pre_change_notify(owner, PipelineState::LAYERS);

            if self.layers.has_children(layer.0) || self.layer(layer).owner != Some(owner) {
                let fork = self.layer_copy(layer);
                if self.layer(layer).owner == Some(owner) {
                    self.remove_layer_difference(owner, layer, false);
                }
                self.add_layer_difference(owner, fork, false);
                self.release_layer(fork);
                self.trace(|t| {
                    t.layer_fork(&LayerForkEvent {
                        pipeline: owner,
                        original: layer,
                        fork,
                    });
                });
                layer = fork;
            }
        }

        let data = self.layer(layer);
        if change.intersects(LayerState::MULTI_PROPERTY) && !data.differences.contains(change) {
            let authority = self.layer_authority(layer, change);
            self.init_layer_multi_property(layer, authority, change);
        }

        let data = self.layer_mut(layer);
        if change.intersects(LayerState::NEEDS_BIG_STATE) {
            data.big_mut();
        }
        data.differences |= change;
        layer
    }

    /// Copies every field of a multi-property group down from its authority.
    fn init_layer_multi_property(
        &mut self,
        layer: LayerId,
        authority: LayerId,
        change: LayerState,
    ) {
        let source = self.layer(authority).big();
        match change {
            LayerState::COMBINE => {
                let combine = source.combine;
                self.layer_mut(layer).big_mut().combine = combine;
            }
            LayerState::VERTEX_SNIPPETS => {
                let snippets = source.vertex_snippets.clone();
                self.layer_mut(layer).big_mut().vertex_snippets = snippets;
            }
            LayerState::FRAGMENT_SNIPPETS => {
                let snippets = source.fragment_snippets.clone();
                self.layer_mut(layer).big_mut().fragment_snippets = snippets;
            }
            _ => unreachable!("{change:?} is not a multi-property layer group"),
        }
    }

    /// Finishes a layer setter.
    ///
    /// If the layer already was the authority and its parent chain holds an
    /// equal value, the local copy is dropped. Otherwise the layer just
    /// became an authority, so ancestors it no longer needs are skipped.
    pub(crate) fn update_layer_authority(
        &mut self,
        layer: LayerId,
        original: LayerId,
        authority: LayerId,
        change: LayerState,
        equal: impl Fn(&LayerData, &LayerData) -> bool,
    ) {
        if layer == original && layer == authority {
            if let Some(parent) = self.layer_parent(layer) {
                let old = self.layer_authority(parent, change);
                if equal(self.layer(layer), self.layer(old)) {
                    self.layer_mut(layer).differences.remove(change);
                }
            }
        } else {
            self.prune_layer_ancestry(layer);
        }
    }

    /// Reparents `layer` past ancestors that store nothing it does not
    /// already store itself.
    pub(crate) fn prune_layer_ancestry(&mut self, layer: LayerId) {
        let differences = self.layer(layer).differences;
        let Some(original) = self.layers.parent(layer.0) else {
            return;
        };
        let mut new_parent = original;
        let mut skipped = 0_u32;
        while let Some(grandparent) = self.layers.parent(new_parent) {
            if (self.layers.get(new_parent).differences | differences) != differences {
                break;
            }
            new_parent = grandparent;
            skipped += 1;
        }
        if new_parent != original {
            let disposed = self.layers.attach(layer.0, new_parent, true);
            debug_assert!(
                disposed.iter().all(|d| d.data.owner.is_none()),
                "pruning released an owned layer"
            );
            self.trace(|t| {
                t.ancestry_pruned(&AncestryPrunedEvent {
                    node: PrunedNode::Layer(layer),
                    skipped,
                });
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::color::Color;
    use crate::state::EvalFlags;

    /// Builds a chain of `depth` copies below `from`; only the last one is
    /// private.
    fn private_chain(ctx: &mut Context, from: LayerId, depth: usize) -> Vec<LayerId> {
        let mut chain = Vec::new();
        let mut parent = from;
        for _ in 0..depth {
            let next = ctx.layer_copy(parent);
            chain.push(next);
            parent = next;
        }
        chain
    }

    fn set_constant(ctx: &mut Context, layer: LayerId, color: Color) -> LayerId {
        let layer = ctx.layer_pre_change_notify(None, layer, LayerState::COMBINE_CONSTANT);
        ctx.layer_mut(layer).big_mut().combine_constant = color;
        layer
    }

    #[test]
    fn fresh_copy_inherits_everything() {
        let mut ctx = Context::new();
        let root = ctx.default_layer();
        let copy = ctx.layer_copy(root);
        assert!(ctx.layer_differences(copy).is_empty());
        for group in LayerState::all().iter() {
            assert_eq!(ctx.layer_authority(copy, group), root);
        }
    }

    #[test]
    fn authority_is_unique_along_chain() {
        let mut ctx = Context::new();
        let root = ctx.default_layer();
        let top = ctx.layer_copy(root);
        let middle = ctx.layer_copy(top);
        let changed = set_constant(&mut ctx, middle, Color::BLACK);
        assert_eq!(changed, middle, "private layers are changed in place");
        let leaf = private_chain(&mut ctx, middle, 1)[0];

        let path = ctx.layers.ancestry(leaf.0);
        for group in LayerState::all().iter() {
            let first = path
                .iter()
                .find(|&&n| ctx.layers.get(n).differences.contains(group))
                .copied();
            assert_eq!(
                Some(ctx.layer_authority(leaf, group).0),
                first,
                "{group:?} authority is the nearest holder"
            );
        }
        assert_eq!(
            ctx.layer_authority(leaf, LayerState::COMBINE_CONSTANT),
            middle
        );
        assert_eq!(ctx.layer_authority(leaf, LayerState::UNIT), root);
    }

    #[test]
    fn multi_property_init_copies_inherited_fields() {
        let mut ctx = Context::new();
        let root = ctx.default_layer();
        let layer = ctx.layer_copy(root);
        let layer = ctx.layer_pre_change_notify(None, layer, LayerState::COMBINE);
        let combine = ctx.layer(layer).big().combine;
        assert_eq!(combine, CombineState::default());
    }

    #[test]
    #[should_panic(expected = "without an owning pipeline")]
    fn shared_layer_requires_owner() {
        let mut ctx = Context::new();
        let root = ctx.default_layer();
        let parent = ctx.layer_copy(root);
        let _child = ctx.layer_copy(parent);
        ctx.layer_pre_change_notify(None, parent, LayerState::UNIT);
    }

    #[test]
    fn prune_skips_redundant_ancestors() {
        let mut ctx = Context::new();
        let root = ctx.default_layer();
        let top = ctx.layer_copy(root);
        set_constant(&mut ctx, top, Color::BLACK);
        let leaf = ctx.layer_copy(top);
        // The leaf overrides the only group its parent stores.
        let leaf = set_constant(&mut ctx, leaf, Color::WHITE);
        ctx.prune_layer_ancestry(leaf);
        assert_eq!(ctx.layer_parent(leaf), Some(root));
        assert_eq!(
            ctx.layer(ctx.layer_authority(leaf, LayerState::COMBINE_CONSTANT))
                .big()
                .combine_constant,
            Color::WHITE
        );
    }

    #[test]
    fn compare_differences_stops_at_common_ancestor() {
        let mut ctx = Context::new();
        let root = ctx.default_layer();
        let shared = ctx.layer_copy(root);
        // The shared ancestor stores a group of its own.
        let shared = set_constant(&mut ctx, shared, Color::BLACK);

        let left = private_chain(&mut ctx, shared, 3);
        let right = private_chain(&mut ctx, shared, 3);
        let l = ctx.layer_pre_change_notify(None, left[2], LayerState::POINT_SPRITE_COORDS);
        let r = ctx.layer_pre_change_notify(None, right[2], LayerState::USER_MATRIX);

        let mask = ctx.compare_layer_differences(l, r);
        assert_eq!(
            mask,
            LayerState::POINT_SPRITE_COORDS | LayerState::USER_MATRIX
        );
        assert!(!mask.contains(LayerState::COMBINE_CONSTANT));
    }

    #[test]
    fn equality_is_limited_to_mask() {
        let mut ctx = Context::new();
        let root = ctx.default_layer();
        let a = ctx.layer_copy(root);
        let b = ctx.layer_copy(root);
        let b = set_constant(&mut ctx, b, Color::BLACK);

        assert!(!ctx.layer_equal(a, b, LayerState::all(), EvalFlags::empty()));
        assert!(ctx.layer_equal(
            a,
            b,
            !LayerState::COMBINE_CONSTANT,
            EvalFlags::empty()
        ));
    }

    #[test]
    fn equal_values_in_different_nodes_compare_equal() {
        let mut ctx = Context::new();
        let root = ctx.default_layer();
        let a = ctx.layer_copy(root);
        let b = ctx.layer_copy(root);
        let a = set_constant(&mut ctx, a, Color::BLACK);
        let b = set_constant(&mut ctx, b, Color::BLACK);
        assert!(ctx.layer_equal(a, b, LayerState::all(), EvalFlags::empty()));
    }
}
