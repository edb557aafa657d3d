// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer comparison and hashing.

use core::hash::{Hash, Hasher};

use super::{LayerData, LayerId};
use crate::context::Context;
use crate::state::{EvalFlags, LayerState};

impl Context {
    /// Returns the groups that may differ between two layers.
    ///
    /// Groups stored at or above the closest common ancestor are shared and
    /// therefore excluded; values are not compared.
    #[must_use]
    pub fn compare_layer_differences(&self, layer0: LayerId, layer1: LayerId) -> LayerState {
        let path0 = self.layers.ancestry(layer0.0);
        let path1 = self.layers.ancestry(layer1.0);

        // Both paths end at the same root; strip the shared tail.
        let mut end0 = path0.len();
        let mut end1 = path1.len();
        while end0 > 0 && end1 > 0 && path0[end0 - 1] == path1[end1 - 1] {
            end0 -= 1;
            end1 -= 1;
        }

        path0[..end0]
            .iter()
            .chain(&path1[..end1])
            .fold(LayerState::empty(), |mask, &node| {
                mask | self.layers.get(node).differences
            })
    }

    /// Returns `true` if both layers resolve to equal values for every group
    /// in `mask`.
    #[must_use]
    pub fn layer_equal(
        &self,
        layer0: LayerId,
        layer1: LayerId,
        mask: LayerState,
        flags: EvalFlags,
    ) -> bool {
        if layer0 == layer1 {
            return true;
        }
        let differences = self.compare_layer_differences(layer0, layer1) & mask;
        differences.iter().all(|group| {
            let a = self.layer(self.layer_authority(layer0, group));
            let b = self.layer(self.layer_authority(layer1, group));
            group_equal(a, b, group, flags)
        })
    }

    /// Feeds the resolved value of every group in `mask` into `state`.
    ///
    /// Layers that are [equal](Self::layer_equal) under the same mask and
    /// flags hash identically.
    pub fn hash_layer<H: Hasher>(
        &self,
        layer: LayerId,
        mask: LayerState,
        flags: EvalFlags,
        state: &mut H,
    ) {
        for group in mask.iter() {
            let data = self.layer(self.layer_authority(layer, group));
            group.bits().hash(state);
            match group {
                LayerState::UNIT => data.unit_index.hash(state),
                LayerState::TEXTURE_TYPE => data.texture_type.hash(state),
                LayerState::TEXTURE_DATA => {
                    if !flags.contains(EvalFlags::IGNORE_TEXTURE_DATA) {
                        data.texture.hash(state);
                    }
                }
                LayerState::SAMPLER => data.sampler.hash(state),
                LayerState::COMBINE => data.big().combine.hash(state),
                LayerState::COMBINE_CONSTANT => data.big().combine_constant.hash(state),
                LayerState::USER_MATRIX => data.big().matrix.hash(state),
                LayerState::POINT_SPRITE_COORDS => data.big().point_sprite_coords.hash(state),
                LayerState::VERTEX_SNIPPETS => data.big().vertex_snippets.hash(state),
                LayerState::FRAGMENT_SNIPPETS => data.big().fragment_snippets.hash(state),
                _ => unreachable!("unknown layer group {group:?}"),
            }
        }
    }
}

pub(crate) fn group_equal(
    a: &LayerData,
    b: &LayerData,
    group: LayerState,
    flags: EvalFlags,
) -> bool {
    match group {
        LayerState::UNIT => a.unit_index == b.unit_index,
        LayerState::TEXTURE_TYPE => a.texture_type == b.texture_type,
        LayerState::TEXTURE_DATA => {
            flags.contains(EvalFlags::IGNORE_TEXTURE_DATA) || a.texture == b.texture
        }
        // Entries are interned, so id equality is value equality.
        LayerState::SAMPLER => a.sampler == b.sampler,
        LayerState::COMBINE => a.big().combine == b.big().combine,
        LayerState::COMBINE_CONSTANT => a.big().combine_constant == b.big().combine_constant,
        LayerState::USER_MATRIX => a.big().matrix == b.big().matrix,
        LayerState::POINT_SPRITE_COORDS => {
            a.big().point_sprite_coords == b.big().point_sprite_coords
        }
        LayerState::VERTEX_SNIPPETS => a.big().vertex_snippets == b.big().vertex_snippets,
        LayerState::FRAGMENT_SNIPPETS => a.big().fragment_snippets == b.big().fragment_snippets,
        _ => unreachable!("unknown layer group {group:?}"),
    }
}
