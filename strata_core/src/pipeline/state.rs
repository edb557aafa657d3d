// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipeline property types and per-node storage.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::color::Color;
use crate::layer::LayerId;
use crate::state::PipelineState;

/// Whether blending is enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendEnable {
    /// Enabled only when the pipeline might produce translucent output.
    #[default]
    Automatic,
    /// Always on.
    Enabled,
    /// Always off.
    Disabled,
}

/// Alpha test comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlphaFunc {
    /// Never passes.
    Never,
    /// Passes if alpha < reference.
    Less,
    /// Passes if alpha == reference.
    Equal,
    /// Passes if alpha <= reference.
    LessEqual,
    /// Passes if alpha > reference.
    Greater,
    /// Passes if alpha != reference.
    NotEqual,
    /// Passes if alpha >= reference.
    GreaterEqual,
    /// Always passes.
    Always,
}

/// Alpha test configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlphaTest {
    /// Comparison function.
    pub func: AlphaFunc,
    /// Reference value in `0.0..=1.0`.
    pub reference: f32,
}

impl Default for AlphaTest {
    fn default() -> Self {
        Self {
            func: AlphaFunc::Always,
            reference: 0.0,
        }
    }
}

/// Blend factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// `0`
    Zero,
    /// `1`
    One,
    /// Source color.
    SrcColor,
    /// `1 - source color`
    OneMinusSrcColor,
    /// Destination color.
    DstColor,
    /// `1 - destination color`
    OneMinusDstColor,
    /// Source alpha.
    SrcAlpha,
    /// `1 - source alpha`
    OneMinusSrcAlpha,
    /// Destination alpha.
    DstAlpha,
    /// `1 - destination alpha`
    OneMinusDstAlpha,
    /// Blend constant.
    ConstantColor,
    /// `1 - blend constant`
    OneMinusConstantColor,
    /// `min(src alpha, 1 - dst alpha)`
    SrcAlphaSaturate,
}

/// Blend equation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    /// `src * sf + dst * df`
    Add,
    /// `src * sf - dst * df`
    Subtract,
    /// `dst * df - src * sf`
    ReverseSubtract,
    /// Component-wise minimum.
    Min,
    /// Component-wise maximum.
    Max,
}

/// Equation and factors for one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlendFunction {
    /// Equation.
    pub equation: BlendEquation,
    /// Source factor.
    pub src: BlendFactor,
    /// Destination factor.
    pub dst: BlendFactor,
}

impl BlendFunction {
    /// Premultiplied "over": `ADD(ONE, ONE_MINUS_SRC_ALPHA)`.
    pub const OVER: Self = Self::new(
        BlendEquation::Add,
        BlendFactor::One,
        BlendFactor::OneMinusSrcAlpha,
    );
    /// Blending that leaves the source untouched: `ADD(ONE, ZERO)`.
    pub const REPLACE: Self = Self::new(BlendEquation::Add, BlendFactor::One, BlendFactor::Zero);

    /// Creates a blend function.
    #[must_use]
    pub const fn new(equation: BlendEquation, src: BlendFactor, dst: BlendFactor) -> Self {
        Self { equation, src, dst }
    }
}

/// Blend state of a pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendState {
    /// RGB channel function.
    pub rgb: BlendFunction,
    /// Alpha channel function.
    pub alpha: BlendFunction,
    /// Constant used by the `*ConstantColor` factors.
    pub constant: Color,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            rgb: BlendFunction::OVER,
            alpha: BlendFunction::OVER,
            constant: Color::TRANSPARENT,
        }
    }
}

impl BlendState {
    /// Returns `true` if blending with this state leaves the source as is.
    #[must_use]
    pub fn is_replace(&self) -> bool {
        self.rgb == BlendFunction::REPLACE && self.alpha == BlendFunction::REPLACE
    }

    /// Returns `true` if this is the premultiplied "over" operator.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.rgb == BlendFunction::OVER && self.alpha == BlendFunction::OVER
    }
}

/// Which faces are culled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CullFaceMode {
    /// No culling.
    #[default]
    None,
    /// Front faces.
    Front,
    /// Back faces.
    Back,
    /// Everything.
    Both,
}

/// Vertex winding that counts as front-facing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Winding {
    /// Clockwise.
    Clockwise,
    /// Counter-clockwise.
    #[default]
    CounterClockwise,
}

/// Face culling state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CullFaceState {
    /// Culling mode.
    pub mode: CullFaceMode,
    /// Front-face winding.
    pub front_winding: Winding,
}

// ---------------------------------------------------------------------------
// Node payload
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PipelineBigState {
    pub(crate) alpha_test: AlphaTest,
    pub(crate) blend: BlendState,
    pub(crate) point_size: f32,
    pub(crate) cull_face: CullFaceState,
}

/// Per-node pipeline storage. Only groups in `differences` hold meaningful
/// values.
#[derive(Debug)]
pub(crate) struct PipelineData {
    pub(crate) differences: PipelineState,
    pub(crate) is_weak: bool,
    pub(crate) age: u32,
    pub(crate) color: Color,
    pub(crate) blend_enable: BlendEnable,
    pub(crate) n_layers: u32,
    /// Layers this pipeline owns directly, in insertion order.
    pub(crate) layer_differences: Vec<LayerId>,
    pub(crate) big_state: Option<Box<PipelineBigState>>,
}

impl PipelineData {
    /// The root pipeline: authority for every group.
    pub(crate) fn root() -> Self {
        Self {
            differences: PipelineState::all(),
            is_weak: false,
            age: 0,
            color: Color::WHITE,
            blend_enable: BlendEnable::Automatic,
            n_layers: 0,
            layer_differences: Vec::new(),
            big_state: Some(Box::default()),
        }
    }

    /// A derived pipeline that inherits everything.
    pub(crate) fn derived(is_weak: bool) -> Self {
        Self {
            differences: PipelineState::empty(),
            is_weak,
            big_state: None,
            ..Self::root()
        }
    }

    pub(crate) fn big(&self) -> &PipelineBigState {
        match &self.big_state {
            Some(big) => big,
            None => panic!("pipeline has {:?} but no big state", self.differences),
        }
    }

    pub(crate) fn big_mut(&mut self) -> &mut PipelineBigState {
        self.big_state.get_or_insert_with(Box::default)
    }
}
