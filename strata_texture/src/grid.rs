// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sliced region transfer over a grid of backend tiles.

use alloc::vec::Vec;

use strata_core::ResourceKey;
use strata_core::trace::{RegionDownloadedEvent, RegionUploadedEvent};

use crate::backend::TextureBackend;
use crate::bitmap::Bitmap;
use crate::error::TextureError;
use crate::format::PixelFormat;
use crate::tiles::{TileLayout, TileSpan, count};

/// What an upload touched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadStats {
    /// Region width.
    pub width: u32,
    /// Region height.
    pub height: u32,
    /// Tiles the region intersected.
    pub tiles_touched: u32,
    /// Waste strips refreshed from edge pixels.
    pub waste_strips: u32,
}

impl UploadStats {
    /// Trace event for this upload.
    #[must_use]
    pub fn event(&self) -> RegionUploadedEvent {
        RegionUploadedEvent {
            width: self.width,
            height: self.height,
            tiles_touched: self.tiles_touched,
            waste_strips: self.waste_strips,
        }
    }
}

/// What a download read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DownloadStats {
    /// Tiles read back.
    pub tiles_read: u32,
    /// Tiles read through an intermediate buffer.
    pub staged_tiles: u32,
}

impl DownloadStats {
    /// Trace event for this download.
    #[must_use]
    pub fn event(&self) -> RegionDownloadedEvent {
        RegionDownloadedEvent {
            tiles_read: self.tiles_read,
            staged_tiles: self.staged_tiles,
        }
    }
}

/// A planned layout with one backend tile per cell.
#[derive(Clone, Debug)]
pub struct TileGrid {
    layout: TileLayout,
    format: PixelFormat,
    tiles: Vec<ResourceKey>,
}

/// Overlap of `[start, start + len)` with a span's used pixels.
fn overlap(span: &TileSpan, start: u32, len: u32) -> Option<(u32, u32)> {
    let lo = start.max(span.start);
    let hi = start.saturating_add(len).min(span.end());
    (lo < hi).then_some((lo, hi))
}

impl TileGrid {
    /// Creates one backend tile per layout cell, in row-major order.
    ///
    /// Tiles created before a failure are destroyed again.
    ///
    /// # Errors
    ///
    /// Propagates the backend's allocation failure.
    pub fn allocate(
        backend: &mut dyn TextureBackend,
        layout: TileLayout,
        format: PixelFormat,
    ) -> Result<Self, TextureError> {
        let mut tiles = Vec::with_capacity(layout.n_tiles());
        for (column, row) in layout.tiles() {
            match backend.create_tile(column.size, row.size, format) {
                Ok(tile) => tiles.push(tile),
                Err(e) => {
                    for tile in tiles {
                        backend.destroy_tile(tile);
                    }
                    return Err(e);
                }
            }
        }
        Ok(Self {
            layout,
            format,
            tiles,
        })
    }

    /// Wraps tiles that already exist.
    pub(crate) fn from_parts(
        layout: TileLayout,
        format: PixelFormat,
        tiles: Vec<ResourceKey>,
    ) -> Self {
        debug_assert_eq!(layout.n_tiles(), tiles.len(), "one tile per layout cell");
        Self {
            layout,
            format,
            tiles,
        }
    }

    /// The layout the tiles were allocated for.
    #[must_use]
    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    /// Storage format of every tile.
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Backend keys of the tiles, row-major.
    #[must_use]
    pub fn tiles(&self) -> &[ResourceKey] {
        &self.tiles
    }

    /// Destroys every tile.
    pub fn release(self, backend: &mut dyn TextureBackend) {
        for tile in self.tiles {
            backend.destroy_tile(tile);
        }
    }

    /// Uploads a `width` x `height` region of `src` at (`src_x`, `src_y`) to
    /// (`dst_x`, `dst_y`) in texture space.
    ///
    /// Whenever the region reaches the last real column or row of a tile
    /// with waste, the waste is refilled by repeating that edge, so
    /// filtering across the edge never samples garbage. The bottom strip
    /// includes the corner under the right strip.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::RegionOutOfBounds`] if the region exceeds
    /// either the source or the texture.
    ///
    /// # Panics
    ///
    /// Panics if `src` is not in the tiles' format.
    pub fn upload_region(
        &self,
        backend: &mut dyn TextureBackend,
        src: &Bitmap,
        src_x: u32,
        src_y: u32,
        dst_x: u32,
        dst_y: u32,
        width: u32,
        height: u32,
    ) -> Result<UploadStats, TextureError> {
        assert_eq!(src.format(), self.format, "source must match tile format");
        src.check_region(src_x, src_y, width, height)?;
        self.check_region(dst_x, dst_y, width, height)?;

        let mut stats = UploadStats {
            width,
            height,
            ..UploadStats::default()
        };
        for (row_index, row) in self.layout.rows.iter().enumerate() {
            let Some((y0, y1)) = overlap(row, dst_y, height) else {
                continue;
            };
            for (column_index, column) in self.layout.columns.iter().enumerate() {
                let Some((x0, x1)) = overlap(column, dst_x, width) else {
                    continue;
                };
                let tile = self.tiles[self.layout.tile_index(column_index, row_index)];
                stats.tiles_touched += 1;

                // Region-relative source origin of this piece.
                let sx = src_x + (x0 - dst_x);
                let sy = src_y + (y0 - dst_y);
                let (w, h) = (x1 - x0, y1 - y0);
                let (tx, ty) = (x0 - column.start, y0 - row.start);
                backend.upload(tile, tx, ty, src, sx, sy, w, h);

                let need_x = column.waste > 0 && x1 == column.end();
                let need_y = row.waste > 0 && y1 == row.end();
                if need_x {
                    let strip = Bitmap::from_pixel_bytes(column.waste, h, self.format, |_, y| {
                        src.pixel_bytes(sx + w - 1, sy + y)
                    });
                    backend.upload(tile, column.used(), ty, &strip, 0, 0, column.waste, h);
                    stats.waste_strips += 1;
                }
                if need_y {
                    let strip_w = w + if need_x { column.waste } else { 0 };
                    let strip = Bitmap::from_pixel_bytes(strip_w, row.waste, self.format, |x, _| {
                        src.pixel_bytes(sx + x.min(w - 1), sy + h - 1)
                    });
                    backend.upload(tile, tx, row.used(), &strip, 0, 0, strip_w, row.waste);
                    stats.waste_strips += 1;
                }
            }
        }
        Ok(stats)
    }

    /// Reads the texture region at (`x`, `y`) the size of `dst` into `dst`.
    ///
    /// Tiles lying wholly inside the region, without waste and in the
    /// target's format, are read straight into `dst`. Others are read into a
    /// tile-sized buffer first and the visible part copied across.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::RegionOutOfBounds`] if the region exceeds the
    /// texture.
    pub fn download_region(
        &self,
        backend: &mut dyn TextureBackend,
        x: u32,
        y: u32,
        dst: &mut Bitmap,
    ) -> Result<DownloadStats, TextureError> {
        let (width, height) = (dst.width(), dst.height());
        self.check_region(x, y, width, height)?;

        let mut stats = DownloadStats::default();
        let mut staging: Option<Bitmap> = None;
        for (row_index, row) in self.layout.rows.iter().enumerate() {
            let Some((y0, y1)) = overlap(row, y, height) else {
                continue;
            };
            for (column_index, column) in self.layout.columns.iter().enumerate() {
                let Some((x0, x1)) = overlap(column, x, width) else {
                    continue;
                };
                let tile = self.tiles[self.layout.tile_index(column_index, row_index)];
                stats.tiles_read += 1;

                let whole = x0 == column.start
                    && x1 == column.end()
                    && y0 == row.start
                    && y1 == row.end()
                    && column.waste == 0
                    && row.waste == 0;
                if whole && dst.format() == self.format {
                    backend.download(tile, dst, x0 - x, y0 - y);
                    continue;
                }

                stats.staged_tiles += 1;
                let mut buffer = match staging.take() {
                    Some(b) if b.width() == column.size && b.height() == row.size => b,
                    _ => Bitmap::new(column.size, row.size, self.format),
                };
                backend.download(tile, &mut buffer, 0, 0);
                dst.copy_region(
                    &buffer,
                    x0 - column.start,
                    y0 - row.start,
                    x0 - x,
                    y0 - y,
                    x1 - x0,
                    y1 - y0,
                )?;
                staging = Some(buffer);
            }
        }
        Ok(stats)
    }

    fn check_region(&self, x: u32, y: u32, width: u32, height: u32) -> Result<(), TextureError> {
        let fits = |start: u32, len: u32, size: u32| {
            u64::from(start) + u64::from(len) <= u64::from(size)
        };
        if fits(x, width, self.layout.width) && fits(y, height, self.layout.height) {
            Ok(())
        } else {
            Err(TextureError::RegionOutOfBounds {
                x,
                y,
                width,
                height,
            })
        }
    }
}

/// Number of tiles a region overlaps.
#[must_use]
pub fn tiles_in_region(layout: &TileLayout, x: u32, y: u32, width: u32, height: u32) -> u32 {
    let columns = layout
        .columns
        .iter()
        .filter(|s| overlap(s, x, width).is_some())
        .count();
    let rows = layout
        .rows
        .iter()
        .filter(|s| overlap(s, y, height).is_some())
        .count();
    count(columns * rows)
}
