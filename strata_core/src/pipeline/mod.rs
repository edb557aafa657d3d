// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipeline graph: render-state configurations with copy-on-write inheritance.
//!
//! A *pipeline* is a full render-state configuration: a flat color, blend
//! state, alpha test, culling and an ordered list of layers. Pipelines form a
//! tree in the context's pipeline arena, with the same authority scheme as
//! layers (see [`layer`](crate::layer)):
//!
//! - A new pipeline stores nothing and inherits every [`PipelineState`] group
//!   from its parent.
//! - Setting a property makes the pipeline the authority for that group.
//!
//! Unlike layers, a pipeline keeps its identity when it changes. If other
//! pipelines derive from it, its current state is first moved into a fresh
//! intermediate node that the dependants are reparented onto, so they keep
//! observing the old values.
//!
//! # Weak pipelines
//!
//! [`weak_copy_pipeline`](Context::weak_copy_pipeline) derives a pipeline
//! that does not keep its parent alive and never forces a copy-on-write. It
//! is destroyed as soon as its parent changes or is released; check
//! [`is_pipeline_alive`](Context::is_pipeline_alive) before using it.

mod compare;
mod id;
mod layer_setters;
mod layers;
mod setters;
mod state;

pub use id::PipelineId;
pub use state::{
    AlphaFunc, AlphaTest, BlendEnable, BlendEquation, BlendFactor, BlendFunction, BlendState,
    CullFaceMode, CullFaceState, Winding,
};

pub(crate) use state::PipelineData;

use alloc::vec::Vec;

use crate::context::Context;
use crate::layer::LayerId;
use crate::node::Disposed;
use crate::state::PipelineState;
use crate::trace::{
    AncestryPrunedEvent, PipelineCopyOnWriteEvent, PrunedNode, WeakPipelineDestroyedEvent,
};

impl Context {
    pub(crate) fn pipeline(&self, pipeline: PipelineId) -> &PipelineData {
        self.pipelines.get(pipeline.0)
    }

    pub(crate) fn pipeline_mut(&mut self, pipeline: PipelineId) -> &mut PipelineData {
        self.pipelines.get_mut(pipeline.0)
    }

    // -- Lifecycle --

    /// Creates a pipeline with default state. The caller owns one reference.
    pub fn new_pipeline(&mut self) -> PipelineId {
        self.derive_pipeline(self.default_pipeline, false)
    }

    /// Creates a pipeline that inherits all state from `source`.
    ///
    /// The copy is cheap: no state is duplicated until one of the two is
    /// modified. The caller owns one reference.
    ///
    /// # Panics
    ///
    /// Panics if `source` is stale or weak.
    pub fn copy_pipeline(&mut self, source: PipelineId) -> PipelineId {
        assert!(
            !self.pipeline(source).is_weak,
            "cannot derive a strong pipeline from weak pipeline {source:?}"
        );
        self.derive_pipeline(source, false)
    }

    /// Creates a weak pipeline that inherits all state from `source`.
    ///
    /// The weak pipeline holds no reference on `source` and is destroyed
    /// (its handle becomes stale) when `source` is modified or released.
    pub fn weak_copy_pipeline(&mut self, source: PipelineId) -> PipelineId {
        self.derive_pipeline(source, true)
    }

    /// Takes an additional reference on a pipeline.
    pub fn ref_pipeline(&mut self, pipeline: PipelineId) {
        self.pipelines.ref_node(pipeline.0);
    }

    /// Releases one reference on a pipeline, destroying it when none remain.
    ///
    /// # Panics
    ///
    /// Panics if `pipeline` is stale or is the context's root pipeline.
    pub fn unref_pipeline(&mut self, pipeline: PipelineId) {
        assert!(
            pipeline != self.default_pipeline || self.pipelines.ref_count(pipeline.0) > 1,
            "the root pipeline is owned by the context"
        );
        let disposed = self.pipelines.unref(pipeline.0);
        self.release_pipelines(disposed);
    }

    /// Returns whether a pipeline handle still refers to a live pipeline.
    #[must_use]
    pub fn is_pipeline_alive(&self, pipeline: PipelineId) -> bool {
        self.pipelines.is_alive(pipeline.0)
    }

    /// Returns whether a pipeline was created by
    /// [`weak_copy_pipeline`](Self::weak_copy_pipeline).
    #[must_use]
    pub fn is_weak_pipeline(&self, pipeline: PipelineId) -> bool {
        self.pipeline(pipeline).is_weak
    }

    /// A counter bumped every time the pipeline is about to change.
    #[must_use]
    pub fn pipeline_age(&self, pipeline: PipelineId) -> u32 {
        self.pipeline(pipeline).age
    }

    // -- Inspection --

    /// The parent of a pipeline node, if it is not the root.
    #[must_use]
    pub fn pipeline_parent(&self, pipeline: PipelineId) -> Option<PipelineId> {
        self.pipelines.parent(pipeline.0).map(PipelineId)
    }

    /// Direct children of a pipeline node, strong and weak.
    #[must_use]
    pub fn pipeline_children(&self, pipeline: PipelineId) -> Vec<PipelineId> {
        self.pipelines
            .child_ids(pipeline.0)
            .into_iter()
            .map(PipelineId)
            .collect()
    }

    /// The groups a pipeline node stores locally.
    #[must_use]
    pub fn pipeline_differences(&self, pipeline: PipelineId) -> PipelineState {
        self.pipeline(pipeline).differences
    }

    /// The layers a pipeline node owns directly (not its effective list).
    #[must_use]
    pub fn pipeline_layer_differences(&self, pipeline: PipelineId) -> &[LayerId] {
        &self.pipeline(pipeline).layer_differences
    }

    /// Returns the nearest node at or above `pipeline` that stores `group`.
    ///
    /// # Panics
    ///
    /// Panics if no ancestor stores the group.
    #[must_use]
    pub fn pipeline_authority(&self, pipeline: PipelineId, group: PipelineState) -> PipelineId {
        let mut current = pipeline.0;
        loop {
            if self.pipelines.get(current).differences.intersects(group) {
                return PipelineId(current);
            }
            match self.pipelines.parent(current) {
                Some(parent) => current = parent,
                None => panic!("no authority for {group:?} above {pipeline:?}"),
            }
        }
    }

    // -- Internal graph maintenance --

    fn derive_pipeline(&mut self, parent: PipelineId, is_weak: bool) -> PipelineId {
        let pipeline = PipelineId(self.pipelines.insert(PipelineData::derived(is_weak)));
        let disposed = self.pipelines.attach(pipeline.0, parent.0, !is_weak);
        self.release_pipelines(disposed);
        pipeline
    }

    /// Releases what disposed pipelines held: their owned layers, and any
    /// weak pipelines left without a parent.
    pub(crate) fn release_pipelines(&mut self, disposed: Vec<Disposed<PipelineData>>) {
        let mut queue = disposed;
        while let Some(node) = queue.pop() {
            for orphan in node.orphans {
                if self.pipelines.is_alive(orphan) {
                    queue.extend(self.destroy_weak_pipeline(PipelineId(orphan)));
                }
            }
            for layer in node.data.layer_differences {
                self.layer_mut(layer).owner = None;
                self.release_layer(layer);
            }
        }
    }

    #[must_use = "disposed payloads must be released"]
    fn destroy_weak_pipeline(&mut self, pipeline: PipelineId) -> Vec<Disposed<PipelineData>> {
        debug_assert!(self.pipeline(pipeline).is_weak, "{pipeline:?} is not weak");
        self.trace(|t| t.weak_pipeline_destroyed(&WeakPipelineDestroyedEvent { pipeline }));
        self.pipelines.dispose(pipeline.0)
    }

    fn destroy_weak_children(&mut self, pipeline: PipelineId) {
        for child in self.pipelines.child_ids(pipeline.0) {
            if self.pipelines.is_alive(child) && self.pipelines.get(child).is_weak {
                let disposed = self.destroy_weak_pipeline(PipelineId(child));
                self.release_pipelines(disposed);
            }
        }
    }

    /// Prepares `pipeline` for a change to `change`.
    ///
    /// Weak children are destroyed. If strong children remain, the current
    /// state is moved into a new intermediate node they are reparented onto.
    ///
    /// # Panics
    ///
    /// Panics if `pipeline` is the root and has dependants.
    pub(crate) fn pipeline_pre_change_notify(
        &mut self,
        pipeline: PipelineId,
        change: PipelineState,
    ) {
        self.destroy_weak_children(pipeline);

        if self.pipelines.has_children(pipeline.0) {
            let Some(parent) = self.pipeline_parent(pipeline) else {
                panic!("cannot modify root pipeline {pipeline:?} while it has dependants");
            };
            let new_authority = self.derive_pipeline(parent, false);
            let differences = self.pipeline(pipeline).differences;
            self.copy_pipeline_differences(new_authority, pipeline, differences);

            let mut disposed = Vec::new();
            let mut reparented = 0_u32;
            self.pipelines.for_each_child(pipeline.0, |store, child| {
                disposed.extend(store.attach(child, new_authority.0, true));
                reparented += 1;
            });
            self.release_pipelines(disposed);
            // The reparented children keep the new node alive.
            self.unref_pipeline(new_authority);

            self.trace(|t| {
                t.pipeline_copy_on_write(&PipelineCopyOnWriteEvent {
                    pipeline,
                    new_authority,
                    reparented_children: reparented,
                });
            });
        }

        let data = self.pipeline(pipeline);
        if change.intersects(PipelineState::MULTI_PROPERTY) && !data.differences.contains(change) {
            let authority = self.pipeline_authority(pipeline, change);
            self.init_pipeline_multi_property(pipeline, authority, change);
        }

        let data = self.pipeline_mut(pipeline);
        data.age = data.age.wrapping_add(1);
        if change.intersects(PipelineState::NEEDS_BIG_STATE) {
            data.big_mut();
        }
        data.differences |= change;
    }

    /// Copies every field of a multi-property group down from its authority.
    fn init_pipeline_multi_property(
        &mut self,
        pipeline: PipelineId,
        authority: PipelineId,
        change: PipelineState,
    ) {
        let source = self.pipeline(authority);
        match change {
            PipelineState::LAYERS => {
                let n_layers = source.n_layers;
                let data = self.pipeline_mut(pipeline);
                data.n_layers = n_layers;
                debug_assert!(
                    data.layer_differences.is_empty(),
                    "non-authority pipeline owns layers"
                );
            }
            PipelineState::BLEND => {
                let blend = source.big().blend;
                self.pipeline_mut(pipeline).big_mut().blend = blend;
            }
            PipelineState::CULL_FACE => {
                let cull_face = source.big().cull_face;
                self.pipeline_mut(pipeline).big_mut().cull_face = cull_face;
            }
            _ => unreachable!("{change:?} is not a multi-property pipeline group"),
        }
    }

    /// Copies the values of `differences` from `src` into `dest`.
    ///
    /// Owned layers are copied by deriving new layers from them, since a
    /// layer has at most one owner.
    fn copy_pipeline_differences(
        &mut self,
        dest: PipelineId,
        src: PipelineId,
        differences: PipelineState,
    ) {
        let source = self.pipeline(src);
        let color = source.color;
        let blend_enable = source.blend_enable;
        let n_layers = source.n_layers;
        let big = source
            .differences
            .intersects(PipelineState::NEEDS_BIG_STATE)
            .then(|| source.big().clone());
        let layers = source.layer_differences.clone();

        let copies: Vec<LayerId> = if differences.contains(PipelineState::LAYERS) {
            layers.iter().map(|&layer| self.layer_copy(layer)).collect()
        } else {
            Vec::new()
        };
        for &copy in &copies {
            // The copy's creation reference becomes the owner's reference.
            self.layer_mut(copy).owner = Some(dest);
        }

        let data = self.pipeline_mut(dest);
        if differences.contains(PipelineState::COLOR) {
            data.color = color;
        }
        if differences.contains(PipelineState::BLEND_ENABLE) {
            data.blend_enable = blend_enable;
        }
        if differences.contains(PipelineState::LAYERS) {
            data.n_layers = n_layers;
            data.layer_differences = copies;
        }
        if let Some(big) = big {
            let dest_big = data.big_mut();
            if differences.contains(PipelineState::ALPHA_FUNC) {
                dest_big.alpha_test = big.alpha_test;
            }
            if differences.contains(PipelineState::BLEND) {
                dest_big.blend = big.blend;
            }
            if differences.contains(PipelineState::POINT_SIZE) {
                dest_big.point_size = big.point_size;
            }
            if differences.contains(PipelineState::CULL_FACE) {
                dest_big.cull_face = big.cull_face;
            }
        }
        data.differences |= differences;
    }

    /// Finishes a pipeline setter; see
    /// [`update_layer_authority`](Self::update_layer_authority).
    pub(crate) fn update_pipeline_authority(
        &mut self,
        pipeline: PipelineId,
        authority: PipelineId,
        change: PipelineState,
        equal: impl Fn(&PipelineData, &PipelineData) -> bool,
    ) {
        if pipeline == authority {
            if let Some(parent) = self.pipeline_parent(pipeline) {
                let old = self.pipeline_authority(parent, change);
                if equal(self.pipeline(pipeline), self.pipeline(old)) {
                    self.pipeline_mut(pipeline).differences.remove(change);
                }
            }
        } else {
            self.prune_pipeline_ancestry(pipeline);
        }
    }

    /// Reparents `pipeline` past ancestors that store nothing it does not
    /// already store itself.
    pub(crate) fn prune_pipeline_ancestry(&mut self, pipeline: PipelineId) {
        let data = self.pipeline(pipeline);
        let differences = data.differences;
        // A partial layer list still depends on ancestors for other units.
        if differences.contains(PipelineState::LAYERS)
            && data.n_layers as usize != data.layer_differences.len()
        {
            return;
        }
        let strong = !data.is_weak;
        let Some(original) = self.pipelines.parent(pipeline.0) else {
            return;
        };
        let mut new_parent = original;
        let mut skipped = 0_u32;
        while let Some(grandparent) = self.pipelines.parent(new_parent) {
            if (self.pipelines.get(new_parent).differences | differences) != differences {
                break;
            }
            new_parent = grandparent;
            skipped += 1;
        }
        if new_parent != original {
            let disposed = self.pipelines.attach(pipeline.0, new_parent, strong);
            self.release_pipelines(disposed);
            self.trace(|t| {
                t.ancestry_pruned(&AncestryPrunedEvent {
                    node: PrunedNode::Pipeline(pipeline),
                    skipped,
                });
            });
        }
    }

    /// Makes `layer` one of the layers `pipeline` owns directly.
    ///
    /// # Panics
    ///
    /// Panics if `layer` already has an owner.
    pub(crate) fn add_layer_difference(
        &mut self,
        pipeline: PipelineId,
        layer: LayerId,
        inc_n_layers: bool,
    ) {
        assert!(
            self.layer(layer).owner.is_none(),
            "layer {layer:?} already has an owner"
        );
        self.pipeline_pre_change_notify(pipeline, PipelineState::LAYERS);
        self.layer_mut(layer).owner = Some(pipeline);
        self.layers.ref_node(layer.0);

        let data = self.pipeline_mut(pipeline);
        data.layer_differences.push(layer);
        if inc_n_layers {
            data.n_layers += 1;
        }
        self.prune_pipeline_ancestry(pipeline);
    }

    /// Drops `layer` from the layers `pipeline` owns. Layers inherited from
    /// an ancestor are only accounted for through `n_layers`.
    pub(crate) fn remove_layer_difference(
        &mut self,
        pipeline: PipelineId,
        layer: LayerId,
        dec_n_layers: bool,
    ) {
        self.pipeline_pre_change_notify(pipeline, PipelineState::LAYERS);
        if self.layer(layer).owner == Some(pipeline) {
            self.layer_mut(layer).owner = None;
            let data = self.pipeline_mut(pipeline);
            data.layer_differences.retain(|&l| l != layer);
            self.release_layer(layer);
        }
        if dec_n_layers {
            let data = self.pipeline_mut(pipeline);
            data.n_layers = data.n_layers.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use super::*;
    use crate::color::Color;

    #[test]
    fn copy_shares_state_until_changed() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        ctx.set_color(p, Color::BLACK);
        let q = ctx.copy_pipeline(p);
        assert_eq!(ctx.color(q), Color::BLACK);
        assert!(ctx.pipeline_differences(q).is_empty());
    }

    #[test]
    fn changing_parent_preserves_child_view() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        ctx.set_color(p, Color::BLACK);
        let q = ctx.copy_pipeline(p);

        ctx.set_color(p, Color::WHITE);
        assert_eq!(ctx.color(p), Color::WHITE);
        assert_eq!(ctx.color(q), Color::BLACK);
        // `q` now hangs off the node holding the old state.
        let authority = ctx.pipeline_parent(q).unwrap();
        assert_ne!(authority, p);
        assert_eq!(ctx.pipeline_parent(authority), ctx.pipeline_parent(p));
        assert!(ctx.pipeline_children(p).is_empty());
    }

    #[test]
    fn changing_child_leaves_parent_alone() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        ctx.set_color(p, Color::BLACK);
        ctx.set_point_size(p, 4.0);
        let q = ctx.copy_pipeline(p);
        ctx.set_color(q, Color::WHITE);
        ctx.set_point_size(q, 2.0);

        assert_eq!(ctx.color(p), Color::BLACK);
        assert_eq!(ctx.point_size(p), 4.0);
        assert_eq!(ctx.color(q), Color::WHITE);
        assert_eq!(ctx.point_size(q), 2.0);
    }

    #[test]
    fn releasing_everything_frees_all_nodes() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        ctx.set_layer_combine_constant(p, 0, Color::BLACK);
        let q = ctx.copy_pipeline(p);
        ctx.set_color(p, Color::BLACK);
        ctx.set_layer_combine_constant(q, 1, Color::WHITE);
        ctx.unref_pipeline(p);
        ctx.unref_pipeline(q);
        assert_eq!(ctx.pipeline_node_count(), 1);
        assert_eq!(ctx.layer_node_count(), 1);
    }

    #[test]
    fn weak_pipeline_dies_with_parent_change() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        let weak = ctx.weak_copy_pipeline(p);
        assert!(ctx.is_weak_pipeline(weak));
        assert_eq!(ctx.pipelines.ref_count(p.0), 1, "weak child holds no reference");

        ctx.set_color(p, Color::BLACK);
        assert!(!ctx.is_pipeline_alive(weak));
        // No copy-on-write node was needed.
        assert_eq!(ctx.pipeline_node_count(), 2);
    }

    #[test]
    fn weak_pipeline_dies_with_parent_release() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        let weak = ctx.weak_copy_pipeline(p);
        let weaker = ctx.weak_copy_pipeline(weak);
        ctx.unref_pipeline(p);
        assert!(!ctx.is_pipeline_alive(weak));
        assert!(!ctx.is_pipeline_alive(weaker));
        assert_eq!(ctx.pipeline_node_count(), 1);
    }

    #[test]
    #[should_panic(expected = "weak pipeline")]
    fn strong_copy_of_weak_panics() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        let weak = ctx.weak_copy_pipeline(p);
        ctx.copy_pipeline(weak);
    }

    #[test]
    fn setting_inherited_value_is_a_noop() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        let age = ctx.pipeline_age(p);
        ctx.set_color(p, Color::WHITE);
        assert!(ctx.pipeline_differences(p).is_empty());
        assert_eq!(ctx.pipeline_age(p), age);
    }

    #[test]
    fn reverting_to_inherited_value_drops_authority() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        ctx.set_color(p, Color::BLACK);
        assert!(ctx.pipeline_differences(p).contains(PipelineState::COLOR));
        ctx.set_color(p, Color::WHITE);
        assert!(!ctx.pipeline_differences(p).contains(PipelineState::COLOR));
        assert_eq!(ctx.color(p), Color::WHITE);
    }

    #[test]
    fn redundant_ancestry_is_pruned() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        ctx.set_color(p, Color::BLACK);
        let q = ctx.copy_pipeline(p);
        // `q` overrides everything `p` stores, so it no longer needs `p`.
        ctx.set_color(q, Color::new(0.5, 0.5, 0.5, 1.0));
        assert_eq!(ctx.pipeline_parent(q), Some(ctx.default_pipeline()));
        assert!(ctx.pipeline_children(p).is_empty());
    }

    #[test]
    #[should_panic(expected = "root pipeline")]
    fn modifying_root_with_dependants_panics() {
        let mut ctx = Context::new();
        let _p = ctx.new_pipeline();
        let root = ctx.default_pipeline();
        ctx.set_color(root, Color::BLACK);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn copy_on_write_is_traced() {
        use alloc::rc::Rc;
        use core::cell::RefCell;

        use crate::trace::TraceSink;

        #[derive(Default)]
        struct Counts {
            cow: u32,
            weak: u32,
        }
        struct Sink(Rc<RefCell<Counts>>);
        impl TraceSink for Sink {
            fn on_pipeline_copy_on_write(&mut self, e: &PipelineCopyOnWriteEvent) {
                assert_eq!(e.reparented_children, 1);
                self.0.borrow_mut().cow += 1;
            }
            fn on_weak_pipeline_destroyed(&mut self, _e: &WeakPipelineDestroyedEvent) {
                self.0.borrow_mut().weak += 1;
            }
        }

        let counts = Rc::new(RefCell::new(Counts::default()));
        let mut ctx = Context::new();
        ctx.set_trace_sink(Box::new(Sink(counts.clone())));
        let p = ctx.new_pipeline();
        let _q = ctx.copy_pipeline(p);
        let _weak = ctx.weak_copy_pipeline(p);
        ctx.set_color(p, Color::BLACK);
        assert_eq!(counts.borrow().cow, 1);
        assert_eq!(counts.borrow().weak, 1);
    }

    #[test]
    fn sink_can_be_taken_back() {
        let mut ctx = Context::new();
        ctx.set_trace_sink(Box::new(crate::trace::NoopSink));
        assert!(ctx.take_trace_sink().is_some());
        assert!(ctx.take_trace_sink().is_none());
    }
}
