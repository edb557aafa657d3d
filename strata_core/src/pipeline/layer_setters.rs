// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-layer setters and getters, addressed by pipeline and layer index.
//!
//! Setters create the layer on first use. Getters never create layers and
//! panic when the index is missing; use [`Context::get_layer`] to probe.

use alloc::vec::Vec;

use super::PipelineId;
use crate::color::Color;
use crate::context::Context;
use crate::layer::{
    CombineArg, CombineChannel, CombineFunction, CombineState, LayerData, LayerId, Snippet,
    TextureType, layer_group_equal,
};
use crate::matrix::Matrix;
use crate::resource::TextureHandle;
use crate::sampler::{FilterMode, SamplerCache, SamplerEntry, SamplerId, WrapMode};
use crate::state::{EvalFlags, LayerState};

impl Context {
    // -- Plumbing --

    /// Resolves the layer at `index`, skips the change if `unchanged` holds
    /// for the current authority, and otherwise writes it with `apply`.
    fn change_layer(
        &mut self,
        pipeline: PipelineId,
        index: u32,
        change: LayerState,
        unchanged: impl FnOnce(&LayerData) -> bool,
        apply: impl FnOnce(&mut LayerData),
    ) {
        let layer = self.get_or_create_layer(pipeline, index);
        let authority = self.layer_authority(layer, change);
        if unchanged(self.layer(authority)) {
            return;
        }
        self.write_layer(pipeline, layer, authority, change, apply);
    }

    fn write_layer(
        &mut self,
        pipeline: PipelineId,
        layer: LayerId,
        authority: LayerId,
        change: LayerState,
        apply: impl FnOnce(&mut LayerData),
    ) {
        let target = self.layer_pre_change_notify(Some(pipeline), layer, change);
        apply(self.layer_mut(target));
        self.update_layer_authority(target, layer, authority, change, |a, b| {
            layer_group_equal(a, b, change, EvalFlags::empty())
        });
    }

    fn set_layer_sampler(
        &mut self,
        pipeline: PipelineId,
        index: u32,
        update: impl FnOnce(&mut SamplerCache, SamplerId) -> SamplerId,
    ) {
        let change = LayerState::SAMPLER;
        let layer = self.get_or_create_layer(pipeline, index);
        let authority = self.layer_authority(layer, change);
        let old = self.layer(authority).sampler;
        let new = update(&mut self.samplers, old);
        if new == old {
            return;
        }
        self.write_layer(pipeline, layer, authority, change, |d| d.sampler = new);
    }

    /// # Panics
    ///
    /// Panics if the pipeline has no layer at `index`.
    fn existing_layer(&self, pipeline: PipelineId, index: u32) -> LayerId {
        match self.get_layer(pipeline, index) {
            Some(layer) => layer,
            None => panic!("pipeline {pipeline:?} has no layer at index {index}"),
        }
    }

    fn resolve_layer(&self, pipeline: PipelineId, index: u32, group: LayerState) -> &LayerData {
        let layer = self.existing_layer(pipeline, index);
        self.layer(self.layer_authority(layer, group))
    }

    pub(crate) fn layer_texture_of(&self, layer: LayerId) -> Option<TextureHandle> {
        self.layer(self.layer_authority(layer, LayerState::TEXTURE_DATA))
            .texture
    }

    // -- Texture --

    /// Sets or clears the layer's texture.
    pub fn set_layer_texture(
        &mut self,
        pipeline: PipelineId,
        index: u32,
        texture: Option<TextureHandle>,
    ) {
        self.change_layer(
            pipeline,
            index,
            LayerState::TEXTURE_DATA,
            |d| d.texture == texture,
            |d| d.texture = texture,
        );
    }

    /// The layer's texture.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has no layer at `index`.
    #[must_use]
    pub fn layer_texture(&self, pipeline: PipelineId, index: u32) -> Option<TextureHandle> {
        self.layer_texture_of(self.existing_layer(pipeline, index))
    }

    /// Sets the texture target type sampled by the layer.
    pub fn set_layer_texture_type(
        &mut self,
        pipeline: PipelineId,
        index: u32,
        texture_type: TextureType,
    ) {
        self.change_layer(
            pipeline,
            index,
            LayerState::TEXTURE_TYPE,
            |d| d.texture_type == texture_type,
            |d| d.texture_type = texture_type,
        );
    }

    /// The texture target type sampled by the layer.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has no layer at `index`.
    #[must_use]
    pub fn layer_texture_type(&self, pipeline: PipelineId, index: u32) -> TextureType {
        self.resolve_layer(pipeline, index, LayerState::TEXTURE_TYPE)
            .texture_type
    }

    // -- Combine --

    /// Replaces the combine function of one or both channels.
    pub fn set_layer_combine(
        &mut self,
        pipeline: PipelineId,
        index: u32,
        channel: CombineChannel,
        function: CombineFunction,
    ) {
        self.change_layer(
            pipeline,
            index,
            LayerState::COMBINE,
            |d| {
                let mut combine = d.big().combine;
                combine.channels_mut(channel).for_each(|f| *f = function);
                combine == d.big().combine
            },
            |d| {
                let combine = &mut d.big_mut().combine;
                combine.channels_mut(channel).for_each(|f| *f = function);
            },
        );
    }

    /// Replaces a single argument of one or both channels' combine
    /// functions, keeping everything else in the group.
    ///
    /// # Panics
    ///
    /// Panics if `arg` is not below 3.
    pub fn set_layer_combine_arg(
        &mut self,
        pipeline: PipelineId,
        index: u32,
        channel: CombineChannel,
        arg: usize,
        value: CombineArg,
    ) {
        assert!(arg < 3, "combine argument {arg} out of range");
        self.change_layer(
            pipeline,
            index,
            LayerState::COMBINE,
            |d| {
                let mut combine = d.big().combine;
                combine.channels_mut(channel).all(|f| f.args[arg] == value)
            },
            |d| {
                let combine = &mut d.big_mut().combine;
                combine.channels_mut(channel).for_each(|f| f.args[arg] = value);
            },
        );
    }

    /// The layer's RGB and alpha combine functions.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has no layer at `index`.
    #[must_use]
    pub fn layer_combine(&self, pipeline: PipelineId, index: u32) -> CombineState {
        self.resolve_layer(pipeline, index, LayerState::COMBINE)
            .big()
            .combine
    }

    /// Returns `true` if the layer's RGB and alpha combine functions cannot
    /// share a single combine call.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has no layer at `index`.
    #[must_use]
    pub fn layer_needs_separate_combine(&self, pipeline: PipelineId, index: u32) -> bool {
        self.layer_combine(pipeline, index).needs_separate_combine()
    }

    /// Sets the constant color read by [`Constant`](crate::layer::CombineSource::Constant)
    /// combine arguments.
    pub fn set_layer_combine_constant(&mut self, pipeline: PipelineId, index: u32, color: Color) {
        self.change_layer(
            pipeline,
            index,
            LayerState::COMBINE_CONSTANT,
            |d| d.big().combine_constant == color,
            |d| d.big_mut().combine_constant = color,
        );
    }

    /// The layer's combine constant.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has no layer at `index`.
    #[must_use]
    pub fn layer_combine_constant(&self, pipeline: PipelineId, index: u32) -> Color {
        self.resolve_layer(pipeline, index, LayerState::COMBINE_CONSTANT)
            .big()
            .combine_constant
    }

    // -- Geometry --

    /// Sets the texture coordinate transform.
    pub fn set_layer_matrix(&mut self, pipeline: PipelineId, index: u32, matrix: Matrix) {
        self.change_layer(
            pipeline,
            index,
            LayerState::USER_MATRIX,
            |d| d.big().matrix == matrix,
            |d| d.big_mut().matrix = matrix,
        );
    }

    /// The texture coordinate transform.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has no layer at `index`.
    #[must_use]
    pub fn layer_matrix(&self, pipeline: PipelineId, index: u32) -> Matrix {
        self.resolve_layer(pipeline, index, LayerState::USER_MATRIX)
            .big()
            .matrix
    }

    /// Sets whether point sprites generate this layer's coordinates.
    pub fn set_layer_point_sprite_coords(&mut self, pipeline: PipelineId, index: u32, on: bool) {
        self.change_layer(
            pipeline,
            index,
            LayerState::POINT_SPRITE_COORDS,
            |d| d.big().point_sprite_coords == on,
            |d| d.big_mut().point_sprite_coords = on,
        );
    }

    /// Whether point sprites generate this layer's coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has no layer at `index`.
    #[must_use]
    pub fn layer_point_sprite_coords(&self, pipeline: PipelineId, index: u32) -> bool {
        self.resolve_layer(pipeline, index, LayerState::POINT_SPRITE_COORDS)
            .big()
            .point_sprite_coords
    }

    // -- Snippets --

    /// Appends a snippet to the layer's vertex or fragment list, depending
    /// on its hook.
    pub fn add_layer_snippet(&mut self, pipeline: PipelineId, index: u32, snippet: Snippet) {
        let vertex = snippet.hook.is_vertex();
        let change = if vertex {
            LayerState::VERTEX_SNIPPETS
        } else {
            LayerState::FRAGMENT_SNIPPETS
        };
        self.change_layer(
            pipeline,
            index,
            change,
            |_| false,
            |d| {
                let big = d.big_mut();
                if vertex {
                    big.vertex_snippets.push(snippet);
                } else {
                    big.fragment_snippets.push(snippet);
                }
            },
        );
    }

    /// The layer's vertex-stage snippets in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has no layer at `index`.
    #[must_use]
    pub fn layer_vertex_snippets(&self, pipeline: PipelineId, index: u32) -> &[Snippet] {
        &self
            .resolve_layer(pipeline, index, LayerState::VERTEX_SNIPPETS)
            .big()
            .vertex_snippets
    }

    /// The layer's fragment-stage snippets in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has no layer at `index`.
    #[must_use]
    pub fn layer_fragment_snippets(&self, pipeline: PipelineId, index: u32) -> &[Snippet] {
        &self
            .resolve_layer(pipeline, index, LayerState::FRAGMENT_SNIPPETS)
            .big()
            .fragment_snippets
    }

    // -- Sampler --

    /// Sets the minification and magnification filters.
    pub fn set_layer_filters(
        &mut self,
        pipeline: PipelineId,
        index: u32,
        min_filter: FilterMode,
        mag_filter: FilterMode,
    ) {
        self.set_layer_sampler(pipeline, index, |cache, old| {
            cache.update_filters(old, min_filter, mag_filter)
        });
    }

    /// Sets the wrap mode on all three axes.
    pub fn set_layer_wrap_mode(&mut self, pipeline: PipelineId, index: u32, mode: WrapMode) {
        self.set_layer_sampler(pipeline, index, |cache, old| {
            cache.update_wrap_modes(old, mode, mode, mode)
        });
    }

    /// Sets the wrap mode along s.
    pub fn set_layer_wrap_mode_s(&mut self, pipeline: PipelineId, index: u32, mode: WrapMode) {
        self.set_layer_sampler(pipeline, index, |cache, old| {
            let e = *cache.get(old);
            cache.update_wrap_modes(old, mode, e.wrap_t, e.wrap_p)
        });
    }

    /// Sets the wrap mode along t.
    pub fn set_layer_wrap_mode_t(&mut self, pipeline: PipelineId, index: u32, mode: WrapMode) {
        self.set_layer_sampler(pipeline, index, |cache, old| {
            let e = *cache.get(old);
            cache.update_wrap_modes(old, e.wrap_s, mode, e.wrap_p)
        });
    }

    /// Sets the wrap mode along p.
    pub fn set_layer_wrap_mode_p(&mut self, pipeline: PipelineId, index: u32, mode: WrapMode) {
        self.set_layer_sampler(pipeline, index, |cache, old| {
            let e = *cache.get(old);
            cache.update_wrap_modes(old, e.wrap_s, e.wrap_t, mode)
        });
    }

    /// The layer's interned sampler configuration.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has no layer at `index`.
    #[must_use]
    pub fn layer_sampler(&self, pipeline: PipelineId, index: u32) -> SamplerEntry {
        let id = self.resolve_layer(pipeline, index, LayerState::SAMPLER).sampler;
        *self.samplers.get(id)
    }

    /// The minification filter.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has no layer at `index`.
    #[must_use]
    pub fn layer_min_filter(&self, pipeline: PipelineId, index: u32) -> FilterMode {
        self.layer_sampler(pipeline, index).min_filter
    }

    /// The magnification filter.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has no layer at `index`.
    #[must_use]
    pub fn layer_mag_filter(&self, pipeline: PipelineId, index: u32) -> FilterMode {
        self.layer_sampler(pipeline, index).mag_filter
    }

    /// The wrap modes along s, t and p.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has no layer at `index`.
    #[must_use]
    pub fn layer_wrap_modes(&self, pipeline: PipelineId, index: u32) -> [WrapMode; 3] {
        let e = self.layer_sampler(pipeline, index);
        [e.wrap_s, e.wrap_t, e.wrap_p]
    }

    /// Textures sampled by any layer of the pipeline, in layer order.
    #[must_use]
    pub fn pipeline_textures(&self, pipeline: PipelineId) -> Vec<TextureHandle> {
        self.pipeline_layers(pipeline)
            .into_iter()
            .filter_map(|layer| self.layer_texture_of(layer))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{CombineFunc, CombineOp, CombineSource, SnippetHook};

    #[test]
    fn single_combine_argument_keeps_inherited_fields() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        let add = CombineFunction {
            func: CombineFunc::Add,
            ..CombineFunction::DEFAULT_RGB
        };
        ctx.set_layer_combine(p, 0, CombineChannel::Rgb, add);
        let q = ctx.copy_pipeline(p);

        let arg = CombineArg::new(CombineSource::Constant, CombineOp::OneMinusSrcColor);
        ctx.set_layer_combine_arg(q, 0, CombineChannel::Rgb, 1, arg);

        let combine = ctx.layer_combine(q, 0);
        assert_eq!(combine.rgb.func, CombineFunc::Add);
        assert_eq!(combine.rgb.args[0], add.args[0]);
        assert_eq!(combine.rgb.args[1], arg);
        assert_eq!(combine.alpha, CombineFunction::DEFAULT_ALPHA);
        assert_eq!(ctx.layer_combine(p, 0).rgb, add);
    }

    #[test]
    fn layer_changes_do_not_leak_into_parent() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        ctx.set_layer_texture(p, 0, Some(TextureHandle(7)));
        let q = ctx.copy_pipeline(p);

        ctx.set_layer_texture(q, 0, Some(TextureHandle(8)));
        ctx.set_layer_matrix(q, 0, Matrix::from_scale(2.0, 2.0, 1.0));
        ctx.set_layer_point_sprite_coords(q, 0, true);

        assert_eq!(ctx.layer_texture(p, 0), Some(TextureHandle(7)));
        assert!(ctx.layer_matrix(p, 0).is_identity());
        assert!(!ctx.layer_point_sprite_coords(p, 0));
        assert_eq!(ctx.layer_texture(q, 0), Some(TextureHandle(8)));
        assert!(ctx.layer_point_sprite_coords(q, 0));
    }

    #[test]
    fn changing_parent_layer_keeps_child_view() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        ctx.set_layer_combine_constant(p, 0, Color::BLACK);
        let q = ctx.copy_pipeline(p);

        ctx.set_layer_combine_constant(p, 0, Color::WHITE);
        assert_eq!(ctx.layer_combine_constant(q, 0), Color::BLACK);
        assert_eq!(ctx.layer_combine_constant(p, 0), Color::WHITE);
    }

    #[test]
    fn unchanged_value_does_not_fork() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        ctx.set_layer_combine_constant(p, 0, Color::BLACK);
        let q = ctx.copy_pipeline(p);
        let before = ctx.layer_node_count();
        ctx.set_layer_combine_constant(q, 0, Color::BLACK);
        assert_eq!(ctx.layer_node_count(), before);
        assert_eq!(ctx.get_layer(q, 0), ctx.get_layer(p, 0));
    }

    #[test]
    fn snippets_go_to_their_stage() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        let vertex = Snippet::new(SnippetHook::TextureCoordTransform, None, Some("tc *= 2.0;"));
        let fragment = Snippet::new(SnippetHook::LayerFragment, None, Some("frag.a = 1.0;"));
        ctx.add_layer_snippet(p, 0, vertex.clone());
        ctx.add_layer_snippet(p, 0, fragment.clone());
        let q = ctx.copy_pipeline(p);
        ctx.add_layer_snippet(q, 0, fragment.clone());

        assert_eq!(ctx.layer_vertex_snippets(p, 0), [vertex.clone()]);
        assert_eq!(ctx.layer_fragment_snippets(p, 0), [fragment.clone()]);
        assert_eq!(ctx.layer_vertex_snippets(q, 0), [vertex]);
        assert_eq!(ctx.layer_fragment_snippets(q, 0).len(), 2);
    }

    #[test]
    fn sampler_settings_are_interned() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        ctx.set_layer_filters(p, 0, FilterMode::Linear, FilterMode::Linear);
        ctx.set_layer_wrap_mode_t(p, 0, WrapMode::Repeat);
        ctx.set_layer_filters(p, 1, FilterMode::Linear, FilterMode::Linear);
        ctx.set_layer_wrap_mode_t(p, 1, WrapMode::Repeat);

        assert_eq!(ctx.layer_sampler(p, 0), ctx.layer_sampler(p, 1));
        assert_eq!(
            ctx.layer_wrap_modes(p, 0),
            [WrapMode::Automatic, WrapMode::Repeat, WrapMode::Automatic]
        );
        assert_eq!(ctx.layer_min_filter(p, 1), FilterMode::Linear);
        // Default, linear/automatic and linear/repeat-t.
        assert_eq!(ctx.sampler_count(), 3);
    }

    #[test]
    fn separate_combine_follows_channels() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        ctx.set_layer_texture_type(p, 0, TextureType::Rectangle);
        assert!(!ctx.layer_needs_separate_combine(p, 0));

        let replace = CombineFunction {
            func: CombineFunc::Replace,
            ..CombineFunction::DEFAULT_ALPHA
        };
        ctx.set_layer_combine(p, 0, CombineChannel::Alpha, replace);
        assert!(ctx.layer_needs_separate_combine(p, 0));

        ctx.set_layer_combine(p, 0, CombineChannel::Rgba, replace);
        assert!(!ctx.layer_needs_separate_combine(p, 0));
        assert_eq!(ctx.layer_texture_type(p, 0), TextureType::Rectangle);
    }

    #[test]
    #[should_panic(expected = "has no layer at index")]
    fn reading_missing_layer_panics() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        let _ = ctx.layer_texture(p, 3);
    }

    #[test]
    fn textures_are_listed_in_layer_order() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        ctx.set_layer_texture(p, 4, Some(TextureHandle(2)));
        ctx.set_layer_combine_constant(p, 2, Color::BLACK);
        ctx.set_layer_texture(p, 0, Some(TextureHandle(1)));
        assert_eq!(
            ctx.pipeline_textures(p),
            [TextureHandle(1), TextureHandle(2)]
        );
    }
}
