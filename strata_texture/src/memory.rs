// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory texture backend.

use hashbrown::HashMap;
use strata_core::ResourceKey;

use crate::backend::TextureBackend;
use crate::bitmap::Bitmap;
use crate::caps::Capabilities;
use crate::error::TextureError;
use crate::format::PixelFormat;

/// A [`TextureBackend`] that keeps every tile as a [`Bitmap`].
#[derive(Debug)]
pub struct MemoryBackend {
    caps: Capabilities,
    tiles: HashMap<ResourceKey, Bitmap>,
    next_key: u64,
    tile_budget: Option<usize>,
}

impl MemoryBackend {
    /// Creates an empty backend reporting `caps`.
    #[must_use]
    pub fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            tiles: HashMap::new(),
            next_key: 0,
            tile_budget: None,
        }
    }

    /// Limits how many tiles may be live at once; creation fails beyond it.
    #[must_use]
    pub fn with_tile_budget(mut self, budget: usize) -> Self {
        self.tile_budget = Some(budget);
        self
    }

    /// Contents of a live tile.
    #[must_use]
    pub fn tile(&self, key: ResourceKey) -> Option<&Bitmap> {
        self.tiles.get(&key)
    }

    /// Number of live tiles.
    #[must_use]
    pub fn live_tiles(&self) -> usize {
        self.tiles.len()
    }

    /// Adopts a bitmap as a tile created elsewhere, for use as an external
    /// resource.
    pub fn insert_external(&mut self, bitmap: Bitmap) -> ResourceKey {
        let key = self.allocate_key();
        self.tiles.insert(key, bitmap);
        key
    }

    fn allocate_key(&mut self) -> ResourceKey {
        let key = ResourceKey(self.next_key);
        self.next_key += 1;
        key
    }

    /// # Panics
    ///
    /// Panics if `key` is not a live tile.
    fn tile_mut(&mut self, key: ResourceKey) -> &mut Bitmap {
        match self.tiles.get_mut(&key) {
            Some(tile) => tile,
            None => panic!("unknown tile {key:?}"),
        }
    }
}

impl TextureBackend for MemoryBackend {
    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn create_tile(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<ResourceKey, TextureError> {
        if self.tile_budget.is_some_and(|budget| self.tiles.len() >= budget) {
            return Err(TextureError::AllocationFailed);
        }
        let key = self.allocate_key();
        self.tiles.insert(key, Bitmap::new(width, height, format));
        Ok(key)
    }

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
    ) {
        let copied = self
            .tile_mut(tile)
            .copy_region(src, src_x, src_y, x, y, width, height);
        assert!(copied.is_ok(), "upload outside tile {tile:?}: {copied:?}");
    }

    fn download(&mut self, tile: ResourceKey, dst: &mut Bitmap, dst_x: u32, dst_y: u32) {
        let source = self.tile_mut(tile);
        let copied = dst.copy_region(source, 0, 0, dst_x, dst_y, source.width(), source.height());
        assert!(copied.is_ok(), "download of {tile:?} does not fit: {copied:?}");
    }

    fn destroy_tile(&mut self, tile: ResourceKey) {
        self.tiles.remove(&tile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_round_trip() {
        let mut backend = MemoryBackend::new(Capabilities::unlimited());
        let tile = backend.create_tile(2, 2, PixelFormat::Rgba8888).unwrap();

        let mut src = Bitmap::new(1, 1, PixelFormat::Rgba8888);
        src.set_pixel(0, 0, [1, 2, 3, 4]);
        backend.upload(tile, 1, 1, &src, 0, 0, 1, 1);

        let mut out = Bitmap::new(3, 3, PixelFormat::Rgba8888);
        backend.download(tile, &mut out, 1, 1);
        assert_eq!(out.pixel(2, 2), [1, 2, 3, 4]);
        assert_eq!(out.pixel(1, 1), [0, 0, 0, 0]);

        backend.destroy_tile(tile);
        assert_eq!(backend.live_tiles(), 0);
    }

    #[test]
    fn budget_limits_allocation() {
        let mut backend = MemoryBackend::new(Capabilities::unlimited()).with_tile_budget(1);
        assert!(backend.create_tile(1, 1, PixelFormat::A8).is_ok());
        assert_eq!(
            backend.create_tile(1, 1, PixelFormat::A8),
            Err(TextureError::AllocationFailed)
        );
    }
}
