// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for tile storage.
//!
//! A texture never touches GPU memory itself. It plans tiles, then asks a
//! [`TextureBackend`] to create, fill, read back and destroy them. Each
//! backend provides:
//!
//! - **Capabilities**: the limits tile planning and format negotiation work
//!   within.
//! - **Tile storage**: one resource per tile, identified by a
//!   [`ResourceKey`] the backend chooses.
//! - **Transfer**: rectangle uploads and whole-tile readback. Readback is
//!   whole-tile only, since that is all some graphics APIs offer.
//!
//! [`MemoryBackend`](crate::MemoryBackend) implements the contract in plain
//! memory for tests and software rendering.

use strata_core::ResourceKey;

use crate::bitmap::Bitmap;
use crate::caps::Capabilities;
use crate::error::TextureError;
use crate::format::PixelFormat;

/// Stores texture tiles on behalf of [`Texture`](crate::Texture).
///
/// Tiles are created with their full padded size. Every bitmap passed to
/// [`upload`](Self::upload) and [`download`](Self::download) is in the
/// tile's own format.
///
/// # Transfer pseudocode
///
/// ```rust,ignore
/// let tile = backend.create_tile(256, 256, PixelFormat::Rgba8888Pre)?;
/// backend.upload(tile, 0, 0, &bitmap, 0, 0, 256, 256);
///
/// let mut readback = Bitmap::new(256, 256, PixelFormat::Rgba8888Pre);
/// backend.download(tile, &mut readback, 0, 0);
/// backend.destroy_tile(tile);
/// ```
pub trait TextureBackend {
    /// Limits of this backend.
    fn capabilities(&self) -> Capabilities;

    /// Allocates an uninitialized tile.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::AllocationFailed`] if the backend is out of
    /// resources.
    fn create_tile(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<ResourceKey, TextureError>;

    /// Copies a `width` x `height` region of `src`, starting at
    /// (`src_x`, `src_y`), to (`x`, `y`) in the tile.
    fn upload(
        &mut self,
        tile: ResourceKey,
        x: u32,
        y: u32,
        src: &Bitmap,
        src_x: u32,
        src_y: u32,
        width: u32,
        height: u32,
    );

    /// Reads the whole tile into `dst` at (`dst_x`, `dst_y`).
    fn download(&mut self, tile: ResourceKey, dst: &mut Bitmap, dst_x: u32, dst_y: u32);

    /// Frees a tile.
    fn destroy_tile(&mut self, tile: ResourceKey);
}
