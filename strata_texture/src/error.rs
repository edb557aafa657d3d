// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Texture errors.

use core::fmt;

use crate::format::PixelFormat;

/// Errors from texture creation, planning and transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureError {
    /// A zero width or height was requested.
    InvalidSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// No tile layout fits within the capability set's limits.
    SizeUnsupported {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// Neither the format nor any fallback is supported.
    FormatUnsupported(PixelFormat),
    /// The region does not lie within the texture or bitmap.
    RegionOutOfBounds {
        /// Left edge.
        x: u32,
        /// Top edge.
        y: u32,
        /// Region width.
        width: u32,
        /// Region height.
        height: u32,
    },
    /// The rowstride is shorter than one row of pixels.
    RowstrideTooSmall {
        /// Given rowstride in bytes.
        rowstride: usize,
        /// Minimum rowstride in bytes.
        min: usize,
    },
    /// The pixel buffer is shorter than the layout requires.
    DataTooShort {
        /// Given length in bytes.
        len: usize,
        /// Required length in bytes.
        required: usize,
    },
    /// The backend failed to allocate a tile.
    AllocationFailed,
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize { width, height } => {
                write!(f, "invalid texture size {width}x{height}")
            }
            Self::SizeUnsupported { width, height } => {
                write!(f, "no supported tile layout for {width}x{height}")
            }
            Self::FormatUnsupported(format) => write!(f, "pixel format {format:?} unsupported"),
            Self::RegionOutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(f, "region {width}x{height}+{x}+{y} out of bounds"),
            Self::RowstrideTooSmall { rowstride, min } => {
                write!(f, "rowstride {rowstride} below minimum {min}")
            }
            Self::DataTooShort { len, required } => {
                write!(f, "pixel data has {len} bytes, {required} required")
            }
            Self::AllocationFailed => f.write_str("tile allocation failed"),
        }
    }
}

impl core::error::Error for TextureError {}
