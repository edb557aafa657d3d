// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipeline-level property setters and getters.
//!
//! Every setter follows the same shape: bail out if the current authority
//! already holds the value, prepare the pipeline for the change, write the
//! value, then let [`update_pipeline_authority`](Context::update_pipeline_authority)
//! either drop the now-redundant local copy or prune the ancestry.

use super::compare::group_equal;
use super::{
    AlphaTest, BlendEnable, BlendState, CullFaceMode, CullFaceState, PipelineData, PipelineId,
    Winding,
};
use crate::color::Color;
use crate::context::Context;
use crate::state::PipelineState;

impl Context {
    /// Applies `write` to `pipeline` for `change`, skipping the update when
    /// `read` already yields `value` at the current authority.
    ///
    /// `change` must not be [`PipelineState::LAYERS`].
    fn set_pipeline_group<T: PartialEq + Copy>(
        &mut self,
        pipeline: PipelineId,
        change: PipelineState,
        value: T,
        read: fn(&PipelineData) -> T,
        write: fn(&mut PipelineData, T),
    ) {
        let authority = self.pipeline_authority(pipeline, change);
        if read(self.pipeline(authority)) == value {
            return;
        }
        self.pipeline_pre_change_notify(pipeline, change);
        write(self.pipeline_mut(pipeline), value);
        // Reverting compares the whole group, not just the field written.
        self.update_pipeline_authority(pipeline, authority, change, |a, b| {
            group_equal(a, b, change)
        });
    }

    fn resolve_pipeline<T>(
        &self,
        pipeline: PipelineId,
        group: PipelineState,
        read: fn(&PipelineData) -> T,
    ) -> T {
        read(self.pipeline(self.pipeline_authority(pipeline, group)))
    }

    /// Sets the flat color.
    pub fn set_color(&mut self, pipeline: PipelineId, color: Color) {
        self.set_pipeline_group(
            pipeline,
            PipelineState::COLOR,
            color,
            |d| d.color,
            |d, v| d.color = v,
        );
    }

    /// The flat color.
    #[must_use]
    pub fn color(&self, pipeline: PipelineId) -> Color {
        self.resolve_pipeline(pipeline, PipelineState::COLOR, |d| d.color)
    }

    /// Sets whether blending is enabled.
    pub fn set_blend_enable(&mut self, pipeline: PipelineId, enable: BlendEnable) {
        self.set_pipeline_group(
            pipeline,
            PipelineState::BLEND_ENABLE,
            enable,
            |d| d.blend_enable,
            |d, v| d.blend_enable = v,
        );
    }

    /// Whether blending is enabled.
    #[must_use]
    pub fn blend_enable(&self, pipeline: PipelineId) -> BlendEnable {
        self.resolve_pipeline(pipeline, PipelineState::BLEND_ENABLE, |d| d.blend_enable)
    }

    /// Sets the alpha test.
    pub fn set_alpha_test(&mut self, pipeline: PipelineId, test: AlphaTest) {
        self.set_pipeline_group(
            pipeline,
            PipelineState::ALPHA_FUNC,
            test,
            |d| d.big().alpha_test,
            |d, v| d.big_mut().alpha_test = v,
        );
    }

    /// The alpha test.
    #[must_use]
    pub fn alpha_test(&self, pipeline: PipelineId) -> AlphaTest {
        self.resolve_pipeline(pipeline, PipelineState::ALPHA_FUNC, |d| d.big().alpha_test)
    }

    /// Sets the complete blend state.
    pub fn set_blend(&mut self, pipeline: PipelineId, blend: BlendState) {
        self.set_pipeline_group(
            pipeline,
            PipelineState::BLEND,
            blend,
            |d| d.big().blend,
            |d, v| d.big_mut().blend = v,
        );
    }

    /// Sets only the blend constant, keeping equations and factors.
    pub fn set_blend_constant(&mut self, pipeline: PipelineId, constant: Color) {
        self.set_pipeline_group(
            pipeline,
            PipelineState::BLEND,
            constant,
            |d| d.big().blend.constant,
            |d, v| d.big_mut().blend.constant = v,
        );
    }

    /// The blend state.
    #[must_use]
    pub fn blend(&self, pipeline: PipelineId) -> BlendState {
        self.resolve_pipeline(pipeline, PipelineState::BLEND, |d| d.big().blend)
    }

    /// Sets the point size.
    pub fn set_point_size(&mut self, pipeline: PipelineId, size: f32) {
        self.set_pipeline_group(
            pipeline,
            PipelineState::POINT_SIZE,
            size,
            |d| d.big().point_size,
            |d, v| d.big_mut().point_size = v,
        );
    }

    /// The point size.
    #[must_use]
    pub fn point_size(&self, pipeline: PipelineId) -> f32 {
        self.resolve_pipeline(pipeline, PipelineState::POINT_SIZE, |d| d.big().point_size)
    }

    /// Sets which faces are culled, keeping the front winding.
    pub fn set_cull_face_mode(&mut self, pipeline: PipelineId, mode: CullFaceMode) {
        self.set_pipeline_group(
            pipeline,
            PipelineState::CULL_FACE,
            mode,
            |d| d.big().cull_face.mode,
            |d, v| d.big_mut().cull_face.mode = v,
        );
    }

    /// Sets which winding is front-facing, keeping the cull mode.
    pub fn set_front_face_winding(&mut self, pipeline: PipelineId, winding: Winding) {
        self.set_pipeline_group(
            pipeline,
            PipelineState::CULL_FACE,
            winding,
            |d| d.big().cull_face.front_winding,
            |d, v| d.big_mut().cull_face.front_winding = v,
        );
    }

    /// The face culling state.
    #[must_use]
    pub fn cull_face(&self, pipeline: PipelineId) -> CullFaceState {
        self.resolve_pipeline(pipeline, PipelineState::CULL_FACE, |d| d.big().cull_face)
    }

    /// Returns whether drawing with this pipeline needs blending enabled.
    ///
    /// With [`BlendEnable::Automatic`] this is conservative: any translucent
    /// color, non-default blend equation or textured layer counts.
    #[must_use]
    pub fn pipeline_needs_blending(&self, pipeline: PipelineId) -> bool {
        match self.blend_enable(pipeline) {
            BlendEnable::Enabled => true,
            BlendEnable::Disabled => false,
            BlendEnable::Automatic => {
                let blend = self.blend(pipeline);
                if blend.is_replace() {
                    return false;
                }
                if !blend.is_over() || !self.color(pipeline).is_opaque() {
                    return true;
                }
                // Texture contents are opaque to the graph, so assume alpha.
                self.pipeline_layers(pipeline)
                    .into_iter()
                    .any(|layer| self.layer_texture_of(layer).is_some())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{AlphaFunc, BlendEquation, BlendFactor, BlendFunction};
    use crate::resource::TextureHandle;

    #[test]
    fn defaults() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        assert_eq!(ctx.color(p), Color::WHITE);
        assert_eq!(ctx.blend_enable(p), BlendEnable::Automatic);
        assert_eq!(ctx.alpha_test(p).func, AlphaFunc::Always);
        assert!(ctx.blend(p).is_over());
        assert_eq!(ctx.point_size(p), 0.0);
        assert_eq!(ctx.cull_face(p), CullFaceState::default());
    }

    #[test]
    fn single_field_of_multi_property_group_keeps_siblings() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        let additive = BlendState {
            rgb: BlendFunction::new(BlendEquation::Add, BlendFactor::One, BlendFactor::One),
            ..BlendState::default()
        };
        ctx.set_blend(p, additive);
        let q = ctx.copy_pipeline(p);
        ctx.set_blend_constant(q, Color::BLACK);

        let blend = ctx.blend(q);
        assert_eq!(blend.constant, Color::BLACK);
        assert_eq!(blend.rgb, additive.rgb);
        assert_eq!(ctx.blend(p).constant, Color::TRANSPARENT);
    }

    #[test]
    fn reverting_one_field_keeps_group_authority() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        let q = ctx.copy_pipeline(p);
        ctx.set_cull_face_mode(q, CullFaceMode::Front);
        ctx.set_front_face_winding(q, Winding::Clockwise);
        ctx.set_front_face_winding(q, Winding::CounterClockwise);

        assert!(ctx.pipeline_differences(q).contains(PipelineState::CULL_FACE));
        assert_eq!(ctx.cull_face(q).mode, CullFaceMode::Front);

        ctx.set_cull_face_mode(q, CullFaceMode::None);
        assert!(!ctx.pipeline_differences(q).contains(PipelineState::CULL_FACE));
    }

    #[test]
    fn cull_face_fields_are_independent() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        ctx.set_cull_face_mode(p, CullFaceMode::Back);
        let q = ctx.copy_pipeline(p);
        ctx.set_front_face_winding(q, Winding::Clockwise);
        assert_eq!(
            ctx.cull_face(q),
            CullFaceState {
                mode: CullFaceMode::Back,
                front_winding: Winding::Clockwise,
            }
        );
        assert_eq!(ctx.cull_face(p).front_winding, Winding::CounterClockwise);
    }

    #[test]
    fn blending_follows_enable_mode() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        assert!(!ctx.pipeline_needs_blending(p));

        ctx.set_color(p, Color::new(1.0, 1.0, 1.0, 0.5));
        assert!(ctx.pipeline_needs_blending(p));

        ctx.set_blend_enable(p, BlendEnable::Disabled);
        assert!(!ctx.pipeline_needs_blending(p));
    }

    #[test]
    fn textured_layer_needs_blending() {
        let mut ctx = Context::new();
        let p = ctx.new_pipeline();
        ctx.set_layer_texture(p, 0, Some(TextureHandle(1)));
        assert!(ctx.pipeline_needs_blending(p));

        let mut replace = BlendState::default();
        replace.rgb = BlendFunction::REPLACE;
        replace.alpha = BlendFunction::REPLACE;
        ctx.set_blend(p, replace);
        assert!(!ctx.pipeline_needs_blending(p));
    }
}
