// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipeline comparison and hashing.
//!
//! Backends key generated programs and cached state objects on a subset of
//! pipeline state, so both operations take explicit masks instead of always
//! looking at everything.

use core::hash::{BuildHasher, Hash, Hasher};

use super::{PipelineData, PipelineId};
use crate::context::Context;
use crate::state::{EvalFlags, LayerState, PipelineState, hash_f32};

impl Context {
    /// Returns the groups that may differ between two pipelines.
    ///
    /// Groups stored at or above the closest common ancestor are shared and
    /// excluded. Values are not compared.
    #[must_use]
    pub fn compare_pipeline_differences(
        &self,
        pipeline0: PipelineId,
        pipeline1: PipelineId,
    ) -> PipelineState {
        let path0 = self.pipelines.ancestry(pipeline0.0);
        let path1 = self.pipelines.ancestry(pipeline1.0);

        let mut end0 = path0.len();
        let mut end1 = path1.len();
        while end0 > 0 && end1 > 0 && path0[end0 - 1] == path1[end1 - 1] {
            end0 -= 1;
            end1 -= 1;
        }

        path0[..end0]
            .iter()
            .chain(&path1[..end1])
            .fold(PipelineState::empty(), |mask, &node| {
                mask | self.pipelines.get(node).differences
            })
    }

    /// Returns `true` if both pipelines resolve to equal values for every
    /// group in `mask`.
    ///
    /// When `mask` contains [`PipelineState::LAYERS`], the layer lists must
    /// have the same length and pairwise equal indices, and each pair of
    /// layers is compared under `layer_mask`.
    #[must_use]
    pub fn pipeline_equal(
        &self,
        pipeline0: PipelineId,
        pipeline1: PipelineId,
        mask: PipelineState,
        layer_mask: LayerState,
        flags: EvalFlags,
    ) -> bool {
        if pipeline0 == pipeline1 {
            return true;
        }
        let differences = self.compare_pipeline_differences(pipeline0, pipeline1) & mask;
        differences.iter().all(|group| {
            if group == PipelineState::LAYERS {
                return self.layers_equal(pipeline0, pipeline1, layer_mask, flags);
            }
            let a = self.pipeline(self.pipeline_authority(pipeline0, group));
            let b = self.pipeline(self.pipeline_authority(pipeline1, group));
            group_equal(a, b, group)
        })
    }

    fn layers_equal(
        &self,
        pipeline0: PipelineId,
        pipeline1: PipelineId,
        layer_mask: LayerState,
        flags: EvalFlags,
    ) -> bool {
        if self.n_layers(pipeline0) != self.n_layers(pipeline1) {
            return false;
        }
        let layers0 = self.pipeline_layers(pipeline0);
        let layers1 = self.pipeline_layers(pipeline1);
        layers0.iter().zip(&layers1).all(|(&l0, &l1)| {
            self.layer(l0).index == self.layer(l1).index
                && self.layer_equal(l0, l1, layer_mask, flags)
        })
    }

    /// Hashes the resolved value of every group in `mask`.
    ///
    /// Pipelines that are [equal](Self::pipeline_equal) under the same masks
    /// and flags hash identically within one context.
    #[must_use]
    pub fn pipeline_hash(
        &self,
        pipeline: PipelineId,
        mask: PipelineState,
        layer_mask: LayerState,
        flags: EvalFlags,
    ) -> u64 {
        let mut state = self.hasher.build_hasher();
        for group in mask.iter() {
            group.bits().hash(&mut state);
            if group == PipelineState::LAYERS {
                let layers = self.pipeline_layers(pipeline);
                layers.len().hash(&mut state);
                for layer in layers {
                    self.layer(layer).index.hash(&mut state);
                    self.hash_layer(layer, layer_mask, flags, &mut state);
                }
                continue;
            }
            let data = self.pipeline(self.pipeline_authority(pipeline, group));
            hash_group(data, group, &mut state);
        }
        state.finish()
    }
}

/// Compares one non-layer group of two pipeline nodes.
pub(crate) fn group_equal(a: &PipelineData, b: &PipelineData, group: PipelineState) -> bool {
    match group {
        PipelineState::COLOR => a.color == b.color,
        PipelineState::BLEND_ENABLE => a.blend_enable == b.blend_enable,
        PipelineState::ALPHA_FUNC => a.big().alpha_test == b.big().alpha_test,
        PipelineState::BLEND => a.big().blend == b.big().blend,
        PipelineState::POINT_SIZE => a.big().point_size == b.big().point_size,
        PipelineState::CULL_FACE => a.big().cull_face == b.big().cull_face,
        _ => unreachable!("{group:?} is not a value group"),
    }
}

fn hash_group<H: Hasher>(data: &PipelineData, group: PipelineState, state: &mut H) {
    match group {
        PipelineState::COLOR => data.color.hash(state),
        PipelineState::BLEND_ENABLE => data.blend_enable.hash(state),
        PipelineState::ALPHA_FUNC => {
            let test = data.big().alpha_test;
            test.func.hash(state);
            hash_f32(test.reference, state);
        }
        PipelineState::BLEND => {
            let blend = data.big().blend;
            blend.rgb.hash(state);
            blend.alpha.hash(state);
            blend.constant.hash(state);
        }
        PipelineState::POINT_SIZE => hash_f32(data.big().point_size, state),
        PipelineState::CULL_FACE => data.big().cull_face.hash(state),
        _ => unreachable!("{group:?} is not a value group"),
    }
}
