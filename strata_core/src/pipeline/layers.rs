// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effective layer lists.
//!
//! A pipeline does not store its full layer list. It stores `n_layers` and
//! the layers it owns directly; the rest are inherited. Every layer's unit
//! index (the [`UNIT`](LayerState::UNIT) group) is its position in the
//! effective list, so resolving the list fills slots `0..n_layers` with the
//! nearest layer claiming each unit.

use alloc::vec;
use alloc::vec::Vec;

use super::PipelineId;
use crate::context::Context;
use crate::layer::LayerId;
use crate::state::{LayerState, PipelineState};

impl Context {
    /// Returns the pipeline's effective layers in ascending index order.
    ///
    /// # Panics
    ///
    /// Panics if some unit slot cannot be resolved, which indicates a
    /// corrupted graph.
    #[must_use]
    pub fn pipeline_layers(&self, pipeline: PipelineId) -> Vec<LayerId> {
        let n = self.n_layers(pipeline) as usize;
        let mut slots: Vec<Option<LayerId>> = vec![None; n];
        let mut filled = 0;

        let mut current = Some(pipeline);
        while let Some(node) = current {
            if filled == n {
                break;
            }
            let data = self.pipeline(node);
            if data.differences.contains(PipelineState::LAYERS) {
                for &layer in &data.layer_differences {
                    let unit = self.layer_unit(layer) as usize;
                    if unit < n && slots[unit].is_none() {
                        slots[unit] = Some(layer);
                        filled += 1;
                    }
                }
            }
            current = self.pipeline_parent(node);
        }

        assert_eq!(
            filled, n,
            "pipeline {pipeline:?} resolves {filled} of {n} layers"
        );
        slots.into_iter().flatten().collect()
    }

    /// Number of layers in the pipeline's effective list.
    #[must_use]
    pub fn n_layers(&self, pipeline: PipelineId) -> u32 {
        let authority = self.pipeline_authority(pipeline, PipelineState::LAYERS);
        self.pipeline(authority).n_layers
    }

    /// Calls `f` with the index and node of each effective layer, lowest
    /// index first. Return `false` from `f` to stop early.
    pub fn foreach_layer(&self, pipeline: PipelineId, mut f: impl FnMut(u32, LayerId) -> bool) {
        for layer in self.pipeline_layers(pipeline) {
            if !f(self.layer(layer).index, layer) {
                break;
            }
        }
    }

    /// The user-visible indices of the pipeline's layers, ascending.
    #[must_use]
    pub fn layer_indices(&self, pipeline: PipelineId) -> Vec<u32> {
        self.pipeline_layers(pipeline)
            .into_iter()
            .map(|layer| self.layer(layer).index)
            .collect()
    }

    /// Returns the effective layer at `index`, if the pipeline has one.
    #[must_use]
    pub fn get_layer(&self, pipeline: PipelineId, index: u32) -> Option<LayerId> {
        self.pipeline_layers(pipeline)
            .into_iter()
            .find(|&layer| self.layer(layer).index == index)
    }

    /// Removes the layer at `index`. No-op if the pipeline has no such layer.
    pub fn remove_layer(&mut self, pipeline: PipelineId, index: u32) {
        let layers = self.pipeline_layers(pipeline);
        let Some(unit) = layers.iter().position(|&l| self.layer(l).index == index) else {
            return;
        };
        let removed = layers[unit];
        for (offset, &layer) in layers[unit + 1..].iter().enumerate() {
            self.set_layer_unit(Some(pipeline), layer, unit_u32(unit + offset));
        }
        self.remove_layer_difference(pipeline, removed, true);
    }

    /// Returns the effective layer at `index`, creating a default one at the
    /// sorted position when missing.
    pub(crate) fn get_or_create_layer(&mut self, pipeline: PipelineId, index: u32) -> LayerId {
        let layers = self.pipeline_layers(pipeline);
        let position = layers
            .iter()
            .position(|&l| self.layer(l).index >= index)
            .unwrap_or(layers.len());
        if let Some(&existing) = layers.get(position) {
            if self.layer(existing).index == index {
                return existing;
            }
        }

        let layer = self.layer_copy(self.default_layer);
        self.layer_mut(layer).index = index;
        let same = self.set_layer_unit(None, layer, unit_u32(position));
        debug_assert_eq!(same, layer, "a fresh layer is changed in place");

        // Highest unit first, so no two layers this pipeline owns ever claim
        // the same unit.
        for (offset, &shifted) in layers[position..].iter().enumerate().rev() {
            self.set_layer_unit(Some(pipeline), shifted, unit_u32(position + offset + 1));
        }
        self.add_layer_difference(pipeline, layer, true);
        self.release_layer(layer);
        layer
    }

    pub(crate) fn layer_unit(&self, layer: LayerId) -> u32 {
        self.layer(self.layer_authority(layer, LayerState::UNIT))
            .unit_index
    }

    /// Moves `layer` to texture unit `unit`, returning the node that now
    /// represents it.
    pub(crate) fn set_layer_unit(
        &mut self,
        owner: Option<PipelineId>,
        layer: LayerId,
        unit: u32,
    ) -> LayerId {
        let change = LayerState::UNIT;
        let authority = self.layer_authority(layer, change);
        if self.layer(authority).unit_index == unit {
            return layer;
        }
        let target = self.layer_pre_change_notify(owner, layer, change);
        self.layer_mut(target).unit_index = unit;
        self.update_layer_authority(target, layer, authority, change, |a, b| {
            a.unit_index == b.unit_index
        });
        target
    }
}

fn unit_u32(unit: usize) -> u32 {
    u32::try_from(unit).unwrap_or(u32::MAX)
}
