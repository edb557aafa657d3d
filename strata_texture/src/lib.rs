// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Texture tiling and sliced region transfer for strata.
//!
//! A [`Texture`] may be larger than any single GPU texture the backend can
//! create, or have a size the backend cannot allocate directly. This crate
//! splits such images into a grid of tiles and keeps the split invisible to
//! callers:
//!
//! - [`plan_tiles`] chooses column and row spans. Backends with arbitrary
//!   tile sizes get exact spans; power-of-two backends get padded spans
//!   whose *waste* is bounded by [`SliceConfig::max_waste`].
//! - [`TileGrid`] uploads and reads back regions that cross tile seams,
//!   refilling waste from edge pixels so filtering never samples padding.
//! - [`negotiate_format`] picks the format pixels are stored in when the
//!   backend lacks the requested one.
//!
//! Storage goes through the [`TextureBackend`] trait; [`MemoryBackend`]
//! implements it in plain memory.
//!
//! ```
//! use strata_texture::{
//!     Bitmap, Capabilities, MemoryBackend, PixelFormat, SliceConfig, Texture,
//! };
//!
//! let caps = Capabilities::gles2().with_max_texture_size(64);
//! let mut backend = MemoryBackend::new(caps);
//! let image = Bitmap::new(100, 40, PixelFormat::Rgba8888);
//! let texture = Texture::create_from_bitmap(&mut backend, &image, SliceConfig::DEFAULT)?;
//! assert!(texture.is_tiled());
//! texture.destroy(&mut backend);
//! # Ok::<(), strata_texture::TextureError>(())
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `strata_core`'s tracer bodies.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

mod backend;
mod bitmap;
mod caps;
mod error;
mod format;
mod grid;
mod memory;
mod texture;
mod tiles;

pub use backend::TextureBackend;
pub use bitmap::Bitmap;
pub use caps::Capabilities;
pub use error::TextureError;
pub use format::{FormatSet, NegotiatedFormat, PixelFormat, negotiate_format};
pub use grid::{DownloadStats, TileGrid, UploadStats, tiles_in_region};
pub use memory::MemoryBackend;
pub use texture::Texture;
pub use tiles::{
    SliceConfig, TileLayout, TileSpan, TileStrategy, plan_tiles, pot_spans, rect_spans,
};
