// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability sets describing what a texture backend supports.

use crate::format::{FormatSet, PixelFormat};

/// Limits and features of a texture backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Largest width or height of a single tile.
    pub max_texture_size: u32,
    /// Whether tile sizes may be arbitrary. Without this, tiles are powers
    /// of two and carry waste.
    pub npot_textures: bool,
    /// Formats tiles can be stored in.
    pub formats: FormatSet,
    /// Whether mipmap levels can be generated.
    pub mipmaps: bool,
}

impl Capabilities {
    /// A typical desktop GPU: large NPOT textures in any format.
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            max_texture_size: 8192,
            npot_textures: true,
            formats: FormatSet::all(),
            mipmaps: true,
        }
    }

    /// A minimal embedded GPU: power-of-two tiles up to 2048 and no BGR or
    /// alpha-first layouts.
    #[must_use]
    pub const fn gles2() -> Self {
        Self {
            max_texture_size: 2048,
            npot_textures: false,
            formats: FormatSet::of(&[
                PixelFormat::A8,
                PixelFormat::G8,
                PixelFormat::Rgb565,
                PixelFormat::Rgba4444,
                PixelFormat::Rgba4444Pre,
                PixelFormat::Rgba5551,
                PixelFormat::Rgba5551Pre,
                PixelFormat::Rgb888,
                PixelFormat::Rgba8888,
                PixelFormat::Rgba8888Pre,
            ]),
            mipmaps: true,
        }
    }

    /// No size limit at all. Useful for software backends.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_texture_size: u32::MAX,
            npot_textures: true,
            formats: FormatSet::all(),
            mipmaps: true,
        }
    }

    /// Returns a copy with a different size limit.
    #[must_use]
    pub const fn with_max_texture_size(mut self, size: u32) -> Self {
        self.max_texture_size = size;
        self
    }

    /// Returns a copy with a different format set.
    #[must_use]
    pub const fn with_formats(mut self, formats: FormatSet) -> Self {
        self.formats = formats;
        self
    }

    /// Returns a copy with NPOT support switched.
    #[must_use]
    pub const fn with_npot_textures(mut self, npot: bool) -> Self {
        self.npot_textures = npot;
        self
    }

    /// Returns a copy with mipmap support switched.
    #[must_use]
    pub const fn with_mipmaps(mut self, mipmaps: bool) -> Self {
        self.mipmaps = mipmaps;
        self
    }

    /// Returns `true` if a single tile of this size can be created.
    #[must_use]
    pub const fn texture_size_supported(&self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        if width > self.max_texture_size || height > self.max_texture_size {
            return false;
        }
        self.npot_textures || (width.is_power_of_two() && height.is_power_of_two())
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::desktop()
    }
}
