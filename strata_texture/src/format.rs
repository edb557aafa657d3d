// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel formats and format negotiation.

use bitflags::bitflags;

use crate::caps::Capabilities;
use crate::error::TextureError;

/// Memory layout of one pixel.
///
/// Multi-byte formats are named in memory byte order, so `Rgba8888` stores
/// red in the first byte. Packed 16-bit formats are little-endian words,
/// except [`Rgba4444`](Self::Rgba4444) which stores one nibble pair per
/// byte, high nibble first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit alpha only.
    A8,
    /// 8-bit luminance.
    G8,
    /// 5-6-5 RGB in a 16-bit word, red in the top bits.
    Rgb565,
    /// 4-4-4-4 RGBA.
    Rgba4444,
    /// [`Rgba4444`](Self::Rgba4444), premultiplied.
    Rgba4444Pre,
    /// 5-5-5-1 RGBA in a 16-bit word, alpha in the lowest bit.
    Rgba5551,
    /// [`Rgba5551`](Self::Rgba5551), premultiplied.
    Rgba5551Pre,
    /// 24-bit RGB.
    Rgb888,
    /// 24-bit BGR.
    Bgr888,
    /// 32-bit RGBA.
    Rgba8888,
    /// 32-bit RGBA, premultiplied.
    Rgba8888Pre,
    /// 32-bit BGRA.
    Bgra8888,
    /// 32-bit BGRA, premultiplied.
    Bgra8888Pre,
    /// 32-bit ARGB.
    Argb8888,
    /// 32-bit ARGB, premultiplied.
    Argb8888Pre,
    /// 32-bit ABGR.
    Abgr8888,
    /// 32-bit ABGR, premultiplied.
    Abgr8888Pre,
}

impl PixelFormat {
    /// Every format, in declaration order.
    pub const ALL: [Self; 17] = [
        Self::A8,
        Self::G8,
        Self::Rgb565,
        Self::Rgba4444,
        Self::Rgba4444Pre,
        Self::Rgba5551,
        Self::Rgba5551Pre,
        Self::Rgb888,
        Self::Bgr888,
        Self::Rgba8888,
        Self::Rgba8888Pre,
        Self::Bgra8888,
        Self::Bgra8888Pre,
        Self::Argb8888,
        Self::Argb8888Pre,
        Self::Abgr8888,
        Self::Abgr8888Pre,
    ];

    /// Size of one pixel in bytes.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::A8 | Self::G8 => 1,
            Self::Rgb565
            | Self::Rgba4444
            | Self::Rgba4444Pre
            | Self::Rgba5551
            | Self::Rgba5551Pre => 2,
            Self::Rgb888 | Self::Bgr888 => 3,
            _ => 4,
        }
    }

    /// Returns `true` if the format stores alpha.
    #[must_use]
    pub const fn has_alpha(self) -> bool {
        !matches!(self, Self::G8 | Self::Rgb565 | Self::Rgb888 | Self::Bgr888)
    }

    /// Returns `true` if color channels are stored multiplied by alpha.
    #[must_use]
    pub const fn is_premultiplied(self) -> bool {
        matches!(
            self,
            Self::Rgba4444Pre
                | Self::Rgba5551Pre
                | Self::Rgba8888Pre
                | Self::Bgra8888Pre
                | Self::Argb8888Pre
                | Self::Abgr8888Pre
        )
    }

    /// The same layout with the given premultiplication.
    ///
    /// Formats without a premultiplied variant are returned unchanged.
    #[must_use]
    pub const fn with_premultiplied(self, premultiplied: bool) -> Self {
        let (straight, pre) = match self {
            Self::Rgba4444 | Self::Rgba4444Pre => (Self::Rgba4444, Self::Rgba4444Pre),
            Self::Rgba5551 | Self::Rgba5551Pre => (Self::Rgba5551, Self::Rgba5551Pre),
            Self::Rgba8888 | Self::Rgba8888Pre => (Self::Rgba8888, Self::Rgba8888Pre),
            Self::Bgra8888 | Self::Bgra8888Pre => (Self::Bgra8888, Self::Bgra8888Pre),
            Self::Argb8888 | Self::Argb8888Pre => (Self::Argb8888, Self::Argb8888Pre),
            Self::Abgr8888 | Self::Abgr8888Pre => (Self::Abgr8888, Self::Abgr8888Pre),
            other => return other,
        };
        if premultiplied { pre } else { straight }
    }

    const fn bit(self) -> u32 {
        1 << self as u32
    }

    /// Formats tried, in order, when this one is not supported.
    const fn fallbacks(self) -> &'static [Self] {
        match self {
            Self::A8 => &[Self::Rgba8888],
            Self::G8 | Self::Rgb565 => &[Self::Rgb888, Self::Rgba8888],
            Self::Bgr888 => &[Self::Rgb888, Self::Rgba8888],
            Self::Rgb888 => &[Self::Rgba8888],
            _ => &[Self::Rgba8888],
        }
    }
}

bitflags! {
    /// A set of [`PixelFormat`]s, one bit per format in declaration order.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct FormatSet: u32 {
        /// [`PixelFormat::A8`].
        const A8 = PixelFormat::A8.bit();
        /// [`PixelFormat::G8`].
        const G8 = PixelFormat::G8.bit();
        /// [`PixelFormat::Rgb565`].
        const RGB565 = PixelFormat::Rgb565.bit();
        /// [`PixelFormat::Rgba4444`].
        const RGBA4444 = PixelFormat::Rgba4444.bit();
        /// [`PixelFormat::Rgba4444Pre`].
        const RGBA4444_PRE = PixelFormat::Rgba4444Pre.bit();
        /// [`PixelFormat::Rgba5551`].
        const RGBA5551 = PixelFormat::Rgba5551.bit();
        /// [`PixelFormat::Rgba5551Pre`].
        const RGBA5551_PRE = PixelFormat::Rgba5551Pre.bit();
        /// [`PixelFormat::Rgb888`].
        const RGB888 = PixelFormat::Rgb888.bit();
        /// [`PixelFormat::Bgr888`].
        const BGR888 = PixelFormat::Bgr888.bit();
        /// [`PixelFormat::Rgba8888`].
        const RGBA8888 = PixelFormat::Rgba8888.bit();
        /// [`PixelFormat::Rgba8888Pre`].
        const RGBA8888_PRE = PixelFormat::Rgba8888Pre.bit();
        /// [`PixelFormat::Bgra8888`].
        const BGRA8888 = PixelFormat::Bgra8888.bit();
        /// [`PixelFormat::Bgra8888Pre`].
        const BGRA8888_PRE = PixelFormat::Bgra8888Pre.bit();
        /// [`PixelFormat::Argb8888`].
        const ARGB8888 = PixelFormat::Argb8888.bit();
        /// [`PixelFormat::Argb8888Pre`].
        const ARGB8888_PRE = PixelFormat::Argb8888Pre.bit();
        /// [`PixelFormat::Abgr8888`].
        const ABGR8888 = PixelFormat::Abgr8888.bit();
        /// [`PixelFormat::Abgr8888Pre`].
        const ABGR8888_PRE = PixelFormat::Abgr8888Pre.bit();
    }
}

impl FormatSet {
    /// Returns the set of the given formats.
    #[must_use]
    pub const fn of(formats: &[PixelFormat]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < formats.len() {
            bits |= formats[i].bit();
            i += 1;
        }
        Self::from_bits_truncate(bits)
    }

    /// Returns `true` if `format` is in the set.
    #[must_use]
    pub const fn supports(self, format: PixelFormat) -> bool {
        self.bits() & format.bit() != 0
    }
}

impl From<PixelFormat> for FormatSet {
    fn from(format: PixelFormat) -> Self {
        Self::from_bits_truncate(format.bit())
    }
}

/// The outcome of [`negotiate_format`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NegotiatedFormat {
    /// The format the caller asked for.
    pub requested: PixelFormat,
    /// The format tiles are stored in.
    pub internal: PixelFormat,
}

impl NegotiatedFormat {
    /// Returns `true` if uploads must convert between the two formats.
    #[must_use]
    pub fn needs_conversion(&self) -> bool {
        self.requested != self.internal
    }
}

/// Picks the storage format for pixels supplied as `requested`.
///
/// The requested format wins if supported. Otherwise fallbacks are tried
/// with the same premultiplication, ending at 32-bit RGBA.
///
/// # Errors
///
/// Returns [`TextureError::FormatUnsupported`] if nothing in the chain is
/// supported.
pub fn negotiate_format(
    requested: PixelFormat,
    caps: &Capabilities,
) -> Result<NegotiatedFormat, TextureError> {
    let premultiplied = requested.is_premultiplied();
    core::iter::once(requested)
        .chain(
            requested
                .fallbacks()
                .iter()
                .map(|f| f.with_premultiplied(premultiplied)),
        )
        .find(|&f| caps.formats.supports(f))
        .map(|internal| NegotiatedFormat {
            requested,
            internal,
        })
        .ok_or(TextureError::FormatUnsupported(requested))
}
