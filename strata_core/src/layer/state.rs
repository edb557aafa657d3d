// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer property types and per-node storage.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::color::Color;
use crate::matrix::Matrix;
use crate::pipeline::PipelineId;
use crate::resource::TextureHandle;
use crate::sampler::SamplerId;
use crate::state::LayerState;

/// Texture target a layer samples from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureType {
    /// Two-dimensional texture.
    #[default]
    TwoD,
    /// Three-dimensional texture.
    ThreeD,
    /// Rectangle texture addressed in texels.
    Rectangle,
}

/// Combine function applied to the arguments of a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CombineFunc {
    /// `arg0`
    Replace,
    /// `arg0 * arg1`
    Modulate,
    /// `arg0 + arg1`
    Add,
    /// `arg0 + arg1 - 0.5`
    AddSigned,
    /// `arg0 * arg2 + arg1 * (1 - arg2)`
    Interpolate,
    /// `arg0 - arg1`
    Subtract,
    /// Dot product written to RGB.
    Dot3Rgb,
    /// Dot product written to RGBA.
    Dot3Rgba,
}

impl CombineFunc {
    /// Number of arguments the function reads.
    #[must_use]
    pub const fn n_args(self) -> usize {
        match self {
            Self::Replace => 1,
            Self::Interpolate => 3,
            _ => 2,
        }
    }
}

/// Where a combine argument reads its value from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CombineSource {
    /// This layer's texture.
    Texture,
    /// The texture of the layer with the given index.
    TextureLayer(u32),
    /// The layer's combine constant.
    Constant,
    /// The pipeline color.
    PrimaryColor,
    /// The output of the previous layer.
    Previous,
}

/// Which component of a source an argument uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CombineOp {
    /// The source color.
    SrcColor,
    /// One minus the source color.
    OneMinusSrcColor,
    /// The source alpha.
    SrcAlpha,
    /// One minus the source alpha.
    OneMinusSrcAlpha,
}

impl CombineOp {
    /// Returns `true` for the `OneMinus*` variants.
    #[must_use]
    pub const fn is_inverted(self) -> bool {
        matches!(self, Self::OneMinusSrcColor | Self::OneMinusSrcAlpha)
    }
}

/// One argument of a combine function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CombineArg {
    /// Source the argument reads.
    pub source: CombineSource,
    /// Component of the source.
    pub op: CombineOp,
}

impl CombineArg {
    /// Creates an argument.
    #[must_use]
    pub const fn new(source: CombineSource, op: CombineOp) -> Self {
        Self { source, op }
    }
}

/// A combine function for one channel with up to three arguments.
///
/// Only the first [`CombineFunc::n_args`] arguments are significant.
#[derive(Clone, Copy, Debug)]
pub struct CombineFunction {
    /// The function.
    pub func: CombineFunc,
    /// Arguments; trailing ones beyond `func.n_args()` are ignored.
    pub args: [CombineArg; 3],
}

impl CombineFunction {
    /// `MODULATE(TEXTURE, PREVIOUS)` reading colors.
    pub const DEFAULT_RGB: Self = Self::with_op(CombineOp::SrcColor);
    /// `MODULATE(TEXTURE, PREVIOUS)` reading alphas.
    pub const DEFAULT_ALPHA: Self = Self::with_op(CombineOp::SrcAlpha);

    const fn with_op(op: CombineOp) -> Self {
        Self {
            func: CombineFunc::Modulate,
            args: [
                CombineArg::new(CombineSource::Texture, op),
                CombineArg::new(CombineSource::Previous, op),
                CombineArg::new(CombineSource::Constant, op),
            ],
        }
    }

    /// The arguments the function actually reads.
    #[must_use]
    pub fn used_args(&self) -> &[CombineArg] {
        &self.args[..self.func.n_args()]
    }
}

impl PartialEq for CombineFunction {
    fn eq(&self, other: &Self) -> bool {
        self.func == other.func && self.used_args() == other.used_args()
    }
}

impl Eq for CombineFunction {}

impl core::hash::Hash for CombineFunction {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.func.hash(state);
        self.used_args().hash(state);
    }
}

/// Selects which combine function(s) a setter writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CombineChannel {
    /// RGB only.
    Rgb,
    /// Alpha only.
    Alpha,
    /// Both.
    Rgba,
}

/// RGB and alpha combine functions of one layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CombineState {
    /// RGB channel.
    pub rgb: CombineFunction,
    /// Alpha channel.
    pub alpha: CombineFunction,
}

impl Default for CombineState {
    fn default() -> Self {
        Self {
            rgb: CombineFunction::DEFAULT_RGB,
            alpha: CombineFunction::DEFAULT_ALPHA,
        }
    }
}

impl CombineState {
    /// Returns `true` if RGB and alpha cannot be expressed as one combine
    /// call.
    ///
    /// A single call suffices when both channels use the same function, read
    /// the same sources, and agree on whether each used operand is inverted.
    #[must_use]
    pub fn needs_separate_combine(&self) -> bool {
        if self.rgb.func != self.alpha.func {
            return true;
        }
        self.rgb
            .used_args()
            .iter()
            .zip(self.alpha.used_args())
            .any(|(rgb, alpha)| {
                rgb.source != alpha.source || rgb.op.is_inverted() != alpha.op.is_inverted()
            })
    }

    pub(crate) fn channels_mut(
        &mut self,
        channel: CombineChannel,
    ) -> impl Iterator<Item = &mut CombineFunction> {
        let (rgb, alpha) = match channel {
            CombineChannel::Rgb => (true, false),
            CombineChannel::Alpha => (false, true),
            CombineChannel::Rgba => (true, true),
        };
        [(rgb, &mut self.rgb), (alpha, &mut self.alpha)]
            .into_iter()
            .filter_map(|(on, f)| on.then_some(f))
    }
}

/// Shader stage hook a layer snippet attaches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SnippetHook {
    /// Vertex stage: transforms this layer's texture coordinates.
    TextureCoordTransform,
    /// Fragment stage: wraps the whole layer's contribution.
    LayerFragment,
    /// Fragment stage: wraps the texture lookup.
    TextureLookup,
}

impl SnippetHook {
    /// Returns `true` if the hook runs in the vertex stage.
    #[must_use]
    pub const fn is_vertex(self) -> bool {
        matches!(self, Self::TextureCoordTransform)
    }
}

/// A piece of shader source attached to a hook point.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Snippet {
    /// Where the snippet is inserted.
    pub hook: SnippetHook,
    /// Global declarations.
    pub declarations: Option<String>,
    /// Code run before the hooked code.
    pub pre: Option<String>,
    /// Code that replaces the hooked code.
    pub replace: Option<String>,
    /// Code run after the hooked code.
    pub post: Option<String>,
}

impl Snippet {
    /// Creates a snippet with declarations and post code.
    #[must_use]
    pub fn new(hook: SnippetHook, declarations: Option<&str>, post: Option<&str>) -> Self {
        Self {
            hook,
            declarations: declarations.map(String::from),
            pre: None,
            replace: None,
            post: post.map(String::from),
        }
    }

    /// Sets the pre code.
    #[must_use]
    pub fn with_pre(mut self, pre: &str) -> Self {
        self.pre = Some(String::from(pre));
        self
    }

    /// Sets the replacement code.
    #[must_use]
    pub fn with_replace(mut self, replace: &str) -> Self {
        self.replace = Some(String::from(replace));
        self
    }
}

// ---------------------------------------------------------------------------
// Node payload
// ---------------------------------------------------------------------------

/// Rarely-changed layer groups, allocated on first use.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LayerBigState {
    pub(crate) combine: CombineState,
    pub(crate) combine_constant: Color,
    pub(crate) matrix: Matrix,
    pub(crate) point_sprite_coords: bool,
    pub(crate) vertex_snippets: Vec<Snippet>,
    pub(crate) fragment_snippets: Vec<Snippet>,
}

impl Default for LayerBigState {
    fn default() -> Self {
        Self {
            combine: CombineState::default(),
            combine_constant: Color::TRANSPARENT,
            matrix: Matrix::IDENTITY,
            point_sprite_coords: false,
            vertex_snippets: Vec::new(),
            fragment_snippets: Vec::new(),
        }
    }
}

/// Per-node layer storage. Only groups in `differences` hold meaningful
/// values; the rest are placeholders.
#[derive(Debug)]
pub(crate) struct LayerData {
    pub(crate) index: u32,
    pub(crate) owner: Option<PipelineId>,
    pub(crate) differences: LayerState,
    pub(crate) unit_index: u32,
    pub(crate) texture_type: TextureType,
    pub(crate) texture: Option<TextureHandle>,
    pub(crate) sampler: SamplerId,
    pub(crate) big_state: Option<Box<LayerBigState>>,
}

impl LayerData {
    /// The root layer: authority for every group.
    pub(crate) fn root(sampler: SamplerId) -> Self {
        Self {
            index: 0,
            owner: None,
            differences: LayerState::all(),
            unit_index: 0,
            texture_type: TextureType::TwoD,
            texture: None,
            sampler,
            big_state: Some(Box::default()),
        }
    }

    /// A derived layer that inherits everything.
    pub(crate) fn derived(index: u32, sampler: SamplerId) -> Self {
        Self {
            differences: LayerState::empty(),
            big_state: None,
            index,
            ..Self::root(sampler)
        }
    }

    pub(crate) fn big(&self) -> &LayerBigState {
        match &self.big_state {
            Some(big) => big,
            None => panic!("layer has {:?} but no big state", self.differences),
        }
    }

    pub(crate) fn big_mut(&mut self) -> &mut LayerBigState {
        self.big_state.get_or_insert_with(Box::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(source: CombineSource, op: CombineOp) -> CombineArg {
        CombineArg::new(source, op)
    }

    #[test]
    fn default_combine_shares_one_call() {
        assert!(!CombineState::default().needs_separate_combine());
    }

    #[test]
    fn different_functions_need_separate_combine() {
        let mut state = CombineState::default();
        state.alpha.func = CombineFunc::Add;
        assert!(state.needs_separate_combine());
    }

    #[test]
    fn differing_sources_need_separate_combine() {
        let mut state = CombineState::default();
        state.alpha.args[1] = arg(CombineSource::Constant, CombineOp::SrcAlpha);
        assert!(state.needs_separate_combine());
    }

    #[test]
    fn inversion_mismatch_needs_separate_combine() {
        let mut state = CombineState::default();
        state.rgb.args[0] = arg(CombineSource::Texture, CombineOp::OneMinusSrcColor);
        assert!(state.needs_separate_combine());

        // Inverted on both sides is fine.
        state.alpha.args[0] = arg(CombineSource::Texture, CombineOp::OneMinusSrcAlpha);
        assert!(!state.needs_separate_combine());
    }

    #[test]
    fn unused_arguments_are_ignored() {
        let mut state = CombineState::default();
        state.rgb.func = CombineFunc::Replace;
        state.alpha.func = CombineFunc::Replace;
        state.alpha.args[1] = arg(CombineSource::PrimaryColor, CombineOp::OneMinusSrcAlpha);
        assert!(!state.needs_separate_combine());
        assert_eq!(state.rgb.used_args().len(), 1);
    }

    #[test]
    fn equality_ignores_unused_arguments() {
        let mut a = CombineFunction::DEFAULT_RGB;
        let b = CombineFunction::DEFAULT_RGB;
        a.args[2] = arg(CombineSource::PrimaryColor, CombineOp::SrcAlpha);
        assert_eq!(a, b);
        a.func = CombineFunc::Interpolate;
        let mut c = b;
        c.func = CombineFunc::Interpolate;
        assert_ne!(a, c);
    }

    #[test]
    fn snippet_hooks_split_by_stage() {
        let s = Snippet::new(SnippetHook::TextureLookup, None, Some("texel *= 2.0;"));
        assert!(!s.hook.is_vertex());
        assert!(SnippetHook::TextureCoordTransform.is_vertex());
    }
}
