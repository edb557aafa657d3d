// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State-group bitmasks.
//!
//! Every pipeline and layer property belongs to exactly one state group. A
//! node's `differences` mask records which groups it stores locally; all other
//! groups are inherited from the nearest ancestor that has the bit set (the
//! group's *authority*).

use bitflags::bitflags;

bitflags! {
    /// Layer state groups.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LayerState: u32 {
        /// Texture unit the layer is bound to.
        const UNIT = 1 << 0;
        /// Texture target type.
        const TEXTURE_TYPE = 1 << 1;
        /// Texture reference.
        const TEXTURE_DATA = 1 << 2;
        /// Filtering and wrap modes.
        const SAMPLER = 1 << 3;
        /// RGB and alpha combine functions.
        const COMBINE = 1 << 4;
        /// Combine constant color.
        const COMBINE_CONSTANT = 1 << 5;
        /// Texture coordinate matrix.
        const USER_MATRIX = 1 << 6;
        /// Point sprite coordinate generation.
        const POINT_SPRITE_COORDS = 1 << 7;
        /// Vertex-stage snippets.
        const VERTEX_SNIPPETS = 1 << 8;
        /// Fragment-stage snippets.
        const FRAGMENT_SNIPPETS = 1 << 9;
    }
}

// Composite masks live outside `bitflags!` so `iter` only yields single groups.
impl LayerState {
    /// Groups stored in the lazily allocated big state.
    pub const NEEDS_BIG_STATE: Self = Self::COMBINE
        .union(Self::COMBINE_CONSTANT)
        .union(Self::USER_MATRIX)
        .union(Self::POINT_SPRITE_COORDS)
        .union(Self::VERTEX_SNIPPETS)
        .union(Self::FRAGMENT_SNIPPETS);

    /// Groups made of several independently settable properties.
    pub const MULTI_PROPERTY: Self = Self::COMBINE
        .union(Self::VERTEX_SNIPPETS)
        .union(Self::FRAGMENT_SNIPPETS);
}

bitflags! {
    /// Pipeline state groups.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PipelineState: u32 {
        /// Flat color.
        const COLOR = 1 << 0;
        /// Blend enable mode.
        const BLEND_ENABLE = 1 << 1;
        /// Layer list.
        const LAYERS = 1 << 2;
        /// Alpha test function and reference.
        const ALPHA_FUNC = 1 << 3;
        /// Blend equations, factors and constant.
        const BLEND = 1 << 4;
        /// Point size.
        const POINT_SIZE = 1 << 5;
        /// Face culling mode and front-face winding.
        const CULL_FACE = 1 << 6;
    }
}

impl PipelineState {
    /// Groups stored in the lazily allocated big state.
    pub const NEEDS_BIG_STATE: Self = Self::ALPHA_FUNC
        .union(Self::BLEND)
        .union(Self::POINT_SIZE)
        .union(Self::CULL_FACE);

    /// Groups made of several independently settable properties.
    pub const MULTI_PROPERTY: Self = Self::LAYERS.union(Self::BLEND).union(Self::CULL_FACE);
}

bitflags! {
    /// Options for equality and hashing.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EvalFlags: u32 {
        /// Treat layers as equal regardless of which texture they reference,
        /// as long as the texture type matches.
        const IGNORE_TEXTURE_DATA = 1 << 0;
    }
}

/// Feeds an `f32` into a hasher so that values comparing equal hash equally.
pub(crate) fn hash_f32<H: core::hash::Hasher>(value: f32, state: &mut H) {
    // -0.0 == 0.0, so both must produce the same bits.
    let value = if value == 0.0 { 0.0 } else { value };
    state.write_u32(value.to_bits());
}
