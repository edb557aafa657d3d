// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile planning: splitting one logical image into hardware-sized tiles.
//!
//! A layout is the product of independent column and row spans. Each span
//! covers `size - waste` pixels of the image; the trailing `waste` pixels
//! exist only to round the tile up to a size the hardware accepts.

use alloc::vec::Vec;

use strata_core::trace::TilesPlannedEvent;

use crate::caps::Capabilities;
use crate::error::TextureError;

/// One tile's extent along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileSpan {
    /// First image pixel covered.
    pub start: u32,
    /// Tile size including waste.
    pub size: u32,
    /// Padding pixels at the end of the tile.
    pub waste: u32,
}

impl TileSpan {
    /// Image pixels covered, excluding waste.
    #[must_use]
    pub const fn used(&self) -> u32 {
        self.size - self.waste
    }

    /// One past the last image pixel covered.
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.start + self.used()
    }
}

/// How tile sizes are chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileStrategy {
    /// Arbitrary tile sizes, never any waste.
    Rect,
    /// Power-of-two tile sizes, with waste on the last span.
    PowerOfTwo,
}

/// Slicing policy for one texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SliceConfig {
    /// Largest waste a power-of-two span may carry before it is split.
    /// Negative disables slicing: the texture is a single tile or fails.
    /// With NPOT support that tile is exactly the image size.
    pub max_waste: i32,
    /// Optional cap on tile size, below the backend's own limit.
    pub max_tile_size: Option<u32>,
}

impl SliceConfig {
    /// Slicing with up to 127 pixels of waste per span.
    pub const DEFAULT: Self = Self {
        max_waste: 127,
        max_tile_size: None,
    };

    /// A single tile or nothing.
    pub const UNSLICED: Self = Self {
        max_waste: -1,
        max_tile_size: None,
    };

    /// Returns a copy with a tile size cap.
    #[must_use]
    pub const fn with_max_tile_size(mut self, size: u32) -> Self {
        self.max_tile_size = Some(size);
        self
    }

    fn supported(&self, caps: &Capabilities, width: u32, height: u32) -> bool {
        let capped = match self.max_tile_size {
            Some(max) => width <= max && height <= max,
            None => true,
        };
        capped && caps.texture_size_supported(width, height)
    }
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The tiles covering one texture.
///
/// Tiles are numbered row-major: tile `row * columns + column`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileLayout {
    /// Image width.
    pub width: u32,
    /// Image height.
    pub height: u32,
    /// Strategy the spans were built with.
    pub strategy: TileStrategy,
    /// Column spans, left to right.
    pub columns: Vec<TileSpan>,
    /// Row spans, top to bottom.
    pub rows: Vec<TileSpan>,
}

impl TileLayout {
    /// A layout of exactly one tile with the given waste.
    ///
    /// Waste is clamped so the tile size stays within `u32`.
    #[must_use]
    pub fn single(width: u32, height: u32, x_waste: u32, y_waste: u32) -> Self {
        let x_waste = x_waste.min(u32::MAX - width);
        let y_waste = y_waste.min(u32::MAX - height);
        let strategy = if x_waste == 0 && y_waste == 0 {
            TileStrategy::Rect
        } else {
            TileStrategy::PowerOfTwo
        };
        Self {
            width,
            height,
            strategy,
            columns: alloc::vec![TileSpan {
                start: 0,
                size: width + x_waste,
                waste: x_waste,
            }],
            rows: alloc::vec![TileSpan {
                start: 0,
                size: height + y_waste,
                waste: y_waste,
            }],
        }
    }

    /// Number of tiles.
    #[must_use]
    pub fn n_tiles(&self) -> usize {
        self.columns.len() * self.rows.len()
    }

    /// Returns `true` if the texture needs more than one tile.
    #[must_use]
    pub fn is_sliced(&self) -> bool {
        self.n_tiles() > 1
    }

    /// Returns `true` if any tile carries waste.
    #[must_use]
    pub fn has_waste(&self) -> bool {
        self.columns.iter().chain(&self.rows).any(|s| s.waste > 0)
    }

    /// Tile index of a column and row.
    #[must_use]
    pub fn tile_index(&self, column: usize, row: usize) -> usize {
        row * self.columns.len() + column
    }

    /// Spans of every tile, row-major.
    pub fn tiles(&self) -> impl Iterator<Item = (TileSpan, TileSpan)> + '_ {
        self.rows
            .iter()
            .flat_map(|&row| self.columns.iter().map(move |&column| (column, row)))
    }

    /// Trace event describing this layout.
    #[must_use]
    pub fn event(&self) -> TilesPlannedEvent {
        let waste = |spans: &[TileSpan]| spans.last().map_or(0, |s| s.waste);
        TilesPlannedEvent {
            width: self.width,
            height: self.height,
            columns: count(self.columns.len()),
            rows: count(self.rows.len()),
            power_of_two: self.strategy == TileStrategy::PowerOfTwo,
            waste_x: waste(&self.columns),
            waste_y: waste(&self.rows),
        }
    }
}

pub(crate) fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Spans of at most `max_span` pixels covering `size`, without waste.
///
/// # Panics
///
/// Panics if `max_span` is zero.
#[must_use]
pub fn rect_spans(size: u32, max_span: u32) -> Vec<TileSpan> {
    assert!(max_span > 0, "zero span size");
    let mut spans = Vec::new();
    let mut start = 0;
    while start < size {
        let span = max_span.min(size - start);
        spans.push(TileSpan {
            start,
            size: span,
            waste: 0,
        });
        start += span;
    }
    spans
}

/// Power-of-two spans covering `size`, starting from `max_span`.
///
/// Whole `max_span` tiles are used while they fit. The remainder gets the
/// largest power of two, halving from `max_span`, whose waste is at most
/// `max_waste`; if that power is smaller than the remainder, it becomes a
/// full tile and the rest is planned the same way.
///
/// # Panics
///
/// Panics if `max_span` is not a power of two.
#[must_use]
pub fn pot_spans(size: u32, max_span: u32, max_waste: u32) -> Vec<TileSpan> {
    assert!(max_span.is_power_of_two(), "span size {max_span} is not a power of two");
    let mut spans = Vec::new();
    let mut start = 0;
    let mut remaining = size;
    let mut span = max_span;
    while remaining > 0 {
        if remaining >= span {
            spans.push(TileSpan {
                start,
                size: span,
                waste: 0,
            });
            start += span;
            remaining -= span;
        } else if span - remaining <= max_waste {
            spans.push(TileSpan {
                start,
                size: span,
                waste: span - remaining,
            });
            remaining = 0;
        } else {
            // Stops at the first power whose waste is small enough or which
            // no longer covers the remainder; one pixel always qualifies.
            while span > remaining && span - remaining > max_waste {
                span /= 2;
            }
        }
    }
    spans
}

/// Plans the tiles for a `width` x `height` texture.
///
/// With NPOT support, tiles start at the full texture size. Otherwise they
/// start at the power of two covering it, and each axis is later split
/// wherever a span would waste more than `max_waste` pixels. Either way the
/// larger dimension is halved until the backend accepts the tile size.
///
/// # Errors
///
/// Returns [`TextureError::InvalidSize`] for an empty texture, and
/// [`TextureError::SizeUnsupported`] if no tile size is accepted or slicing
/// is disabled and one tile is not enough.
pub fn plan_tiles(
    width: u32,
    height: u32,
    caps: &Capabilities,
    config: SliceConfig,
) -> Result<TileLayout, TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::InvalidSize { width, height });
    }
    let unsupported = TextureError::SizeUnsupported { width, height };

    let Ok(max_waste) = u32::try_from(config.max_waste) else {
        return plan_single(width, height, caps, config).ok_or(unsupported);
    };

    let (strategy, mut tile_w, mut tile_h) = if caps.npot_textures {
        (TileStrategy::Rect, width, height)
    } else {
        let (Some(w), Some(h)) = (
            width.checked_next_power_of_two(),
            height.checked_next_power_of_two(),
        ) else {
            return Err(unsupported);
        };
        (TileStrategy::PowerOfTwo, w, h)
    };

    while !config.supported(caps, tile_w, tile_h) {
        if tile_w == 1 && tile_h == 1 {
            return Err(unsupported);
        }
        if tile_w > tile_h {
            tile_w /= 2;
        } else {
            tile_h /= 2;
        }
    }

    let (columns, rows) = match strategy {
        TileStrategy::Rect => (rect_spans(width, tile_w), rect_spans(height, tile_h)),
        TileStrategy::PowerOfTwo => (
            pot_spans(width, tile_w, max_waste),
            pot_spans(height, tile_h, max_waste),
        ),
    };
    Ok(TileLayout {
        width,
        height,
        strategy,
        columns,
        rows,
    })
}

/// One tile covering the whole texture: exact with NPOT support, rounded up
/// to powers of two otherwise.
fn plan_single(
    width: u32,
    height: u32,
    caps: &Capabilities,
    config: SliceConfig,
) -> Option<TileLayout> {
    let (tile_w, tile_h) = if caps.npot_textures {
        (width, height)
    } else {
        (
            width.checked_next_power_of_two()?,
            height.checked_next_power_of_two()?,
        )
    };
    config
        .supported(caps, tile_w, tile_h)
        .then(|| TileLayout::single(width, height, tile_w - width, tile_h - height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: u32, size: u32, waste: u32) -> TileSpan {
        TileSpan { start, size, waste }
    }

    fn assert_covers(spans: &[TileSpan], size: u32) {
        let mut next = 0;
        for s in spans {
            assert_eq!(s.start, next, "gap or overlap in {spans:?}");
            next = s.end();
        }
        assert_eq!(next, size, "spans {spans:?} do not cover {size}");
    }

    #[test]
    fn pot_halves_until_waste_fits() {
        let caps = Capabilities::gles2().with_max_texture_size(256);
        let config = SliceConfig {
            max_waste: 4,
            max_tile_size: None,
        };
        let layout = plan_tiles(300, 300, &caps, config).unwrap();
        let expected = [span(0, 256, 0), span(256, 32, 0), span(288, 16, 4)];
        assert_eq!(layout.columns, expected);
        assert_eq!(layout.rows, expected);
        assert_eq!(layout.n_tiles(), 9);
        assert!(layout.has_waste());
    }

    #[test]
    fn rect_spans_cover_without_waste() {
        let spans = rect_spans(1000, 256);
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[3], span(768, 232, 0));
        assert_covers(&spans, 1000);
    }

    #[test]
    fn spans_cover_exactly() {
        for size in [1, 2, 3, 17, 63, 64, 65, 255, 300, 513, 1000] {
            for max_waste in [0, 1, 4, 127] {
                assert_covers(&pot_spans(size, 256, max_waste), size);
            }
            assert_covers(&rect_spans(size, 100), size);
        }
    }

    #[test]
    fn zero_waste_pot_is_exact() {
        let spans = pot_spans(300, 512, 0);
        assert!(spans.iter().all(|s| s.waste == 0));
        assert_eq!(
            spans.iter().map(|s| s.size).collect::<Vec<_>>(),
            [256, 32, 8, 4]
        );
    }

    #[test]
    fn npot_fits_in_one_tile() {
        let layout = plan_tiles(300, 200, &Capabilities::desktop(), SliceConfig::DEFAULT).unwrap();
        assert!(!layout.is_sliced());
        assert_eq!(layout.columns, [span(0, 300, 0)]);
    }

    #[test]
    fn npot_halves_the_larger_side() {
        let caps = Capabilities::desktop().with_max_texture_size(128);
        let layout = plan_tiles(300, 100, &caps, SliceConfig::DEFAULT).unwrap();
        assert_eq!(layout.columns.iter().map(|s| s.size).collect::<Vec<_>>(), [75, 75, 75, 75]);
        assert_eq!(layout.rows, [span(0, 100, 0)]);
    }

    #[test]
    fn unsliced_rounds_up_to_power_of_two() {
        let layout = plan_tiles(300, 100, &Capabilities::gles2(), SliceConfig::UNSLICED).unwrap();
        assert_eq!(layout.columns, [span(0, 512, 212)]);
        assert_eq!(layout.rows, [span(0, 128, 28)]);
    }

    #[test]
    fn unsliced_npot_is_exact() {
        let layout = plan_tiles(300, 100, &Capabilities::desktop(), SliceConfig::UNSLICED).unwrap();
        assert_eq!(layout.columns, [span(0, 300, 0)]);
        assert_eq!(layout.rows, [span(0, 100, 0)]);
    }

    #[test]
    fn unsliced_too_large_fails() {
        let caps = Capabilities::desktop().with_max_texture_size(256);
        assert_eq!(
            plan_tiles(300, 10, &caps, SliceConfig::UNSLICED),
            Err(TextureError::SizeUnsupported {
                width: 300,
                height: 10
            })
        );
    }

    #[test]
    fn empty_texture_is_invalid() {
        assert_eq!(
            plan_tiles(0, 10, &Capabilities::desktop(), SliceConfig::DEFAULT),
            Err(TextureError::InvalidSize {
                width: 0,
                height: 10
            })
        );
    }

    #[test]
    fn tile_size_cap_applies() {
        let config = SliceConfig::DEFAULT.with_max_tile_size(64);
        let layout = plan_tiles(100, 100, &Capabilities::desktop(), config).unwrap();
        assert!(layout.columns.iter().all(|s| s.size <= 64));
        assert_eq!(layout.n_tiles(), 4);
    }

    #[test]
    fn event_summarizes_layout() {
        let caps = Capabilities::gles2().with_max_texture_size(256);
        let config = SliceConfig {
            max_waste: 4,
            max_tile_size: None,
        };
        let event = plan_tiles(300, 256, &caps, config).unwrap().event();
        assert_eq!((event.columns, event.rows), (3, 1));
        assert!(event.power_of_two);
        assert_eq!((event.waste_x, event.waste_y), (4, 0));
    }

    #[test]
    fn single_tile_waste_is_clamped() {
        let layout = TileLayout::single(10, u32::MAX - 2, 6, 8);
        assert_eq!(layout.columns[0].size, 16);
        assert_eq!(layout.rows[0].size, u32::MAX);
        assert_eq!(layout.rows[0].waste, 2);
        assert_eq!(layout.rows[0].used(), u32::MAX - 2);
    }
}
