// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Textures: a negotiated format, a tile layout and the tiles behind it.

use alloc::vec;

use strata_core::ResourceKey;

use crate::backend::TextureBackend;
use crate::bitmap::Bitmap;
use crate::caps::Capabilities;
use crate::error::TextureError;
use crate::format::{NegotiatedFormat, PixelFormat, negotiate_format};
use crate::grid::{DownloadStats, TileGrid, UploadStats};
use crate::tiles::{SliceConfig, TileLayout, plan_tiles};

/// A 2D texture stored as one or more backend tiles.
///
/// Textures do not free their tiles on drop, since that needs the backend.
/// Call [`destroy`](Self::destroy) when done.
#[derive(Clone, Debug)]
pub struct Texture {
    width: u32,
    height: u32,
    format: NegotiatedFormat,
    grid: TileGrid,
    foreign: bool,
    mipmaps: bool,
}

impl Texture {
    /// Creates an uninitialized texture.
    ///
    /// `format` is the format pixels will be supplied in. Tiles may be
    /// stored in a different format; see [`format`](Self::format).
    ///
    /// # Errors
    ///
    /// Fails if the size is empty or cannot be tiled, if no storage format
    /// is supported, or if the backend cannot allocate the tiles.
    pub fn create_with_size(
        backend: &mut dyn TextureBackend,
        width: u32,
        height: u32,
        format: PixelFormat,
        config: SliceConfig,
    ) -> Result<Self, TextureError> {
        let caps = backend.capabilities();
        let format = negotiate_format(format, &caps)?;
        let layout = plan_tiles(width, height, &caps, config)?;
        let grid = TileGrid::allocate(backend, layout, format.internal)?;
        Ok(Self {
            width,
            height,
            format,
            grid,
            foreign: false,
            mipmaps: caps.mipmaps,
        })
    }

    /// Creates a texture holding a copy of `bitmap`.
    ///
    /// # Errors
    ///
    /// As [`create_with_size`](Self::create_with_size).
    pub fn create_from_bitmap(
        backend: &mut dyn TextureBackend,
        bitmap: &Bitmap,
        config: SliceConfig,
    ) -> Result<Self, TextureError> {
        let (width, height) = (bitmap.width(), bitmap.height());
        let texture = Self::create_with_size(backend, width, height, bitmap.format(), config)?;
        if let Err(e) = texture.set_region(backend, bitmap, 0, 0, 0, 0, width, height) {
            texture.destroy(backend);
            return Err(e);
        }
        Ok(texture)
    }

    /// Creates a texture from raw pixel rows.
    ///
    /// # Errors
    ///
    /// Fails if `data` does not cover the described layout, and otherwise
    /// as [`create_with_size`](Self::create_with_size).
    pub fn create_from_data(
        backend: &mut dyn TextureBackend,
        width: u32,
        height: u32,
        format: PixelFormat,
        rowstride: usize,
        data: &[u8],
        config: SliceConfig,
    ) -> Result<Self, TextureError> {
        let bitmap = Bitmap::from_data(width, height, format, rowstride, data.to_vec())?;
        Self::create_from_bitmap(backend, &bitmap, config)
    }

    /// Wraps a tile created outside this crate.
    ///
    /// The tile is `width + x_waste` by `height + y_waste` pixels, with the
    /// image in its top-left corner. The texture never destroys it.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::InvalidSize`] for an empty size and
    /// [`TextureError::FormatUnsupported`] if `format` cannot be stored as
    /// is.
    pub fn create_from_external_resource(
        caps: &Capabilities,
        resource: ResourceKey,
        width: u32,
        height: u32,
        format: PixelFormat,
        x_waste: u32,
        y_waste: u32,
    ) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::InvalidSize { width, height });
        }
        if !caps.formats.supports(format) {
            return Err(TextureError::FormatUnsupported(format));
        }
        let layout = TileLayout::single(width, height, x_waste, y_waste);
        Ok(Self {
            width,
            height,
            format: NegotiatedFormat {
                requested: format,
                internal: format,
            },
            grid: TileGrid::from_parts(layout, format, vec![resource]),
            foreign: true,
            mipmaps: caps.mipmaps,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The format tiles are stored in.
    ///
    /// May differ from the format the texture was created with.
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format.internal
    }

    /// Both the requested and the stored format.
    #[must_use]
    pub fn negotiated_format(&self) -> NegotiatedFormat {
        self.format
    }

    /// Bytes per row of tightly packed data in the stored format.
    #[must_use]
    pub fn rowstride(&self) -> usize {
        self.width as usize * self.format.internal.bytes_per_pixel()
    }

    /// Returns `true` if the texture is split over several tiles.
    #[must_use]
    pub fn is_tiled(&self) -> bool {
        self.grid.layout().is_sliced()
    }

    /// Number of tiles.
    #[must_use]
    pub fn n_tiles(&self) -> usize {
        self.grid.layout().n_tiles()
    }

    /// The tile layout.
    #[must_use]
    pub fn layout(&self) -> &TileLayout {
        self.grid.layout()
    }

    /// Backend keys of the tiles, row-major.
    #[must_use]
    pub fn tiles(&self) -> &[ResourceKey] {
        self.grid.tiles()
    }

    /// Returns `true` if the tile was supplied by the caller.
    #[must_use]
    pub fn is_foreign(&self) -> bool {
        self.foreign
    }

    /// Returns `true` if mipmaps can be generated for this texture.
    ///
    /// Sliced textures and textures with waste cannot be mipmapped, since
    /// the levels would filter across tile seams or padding.
    #[must_use]
    pub fn can_generate_mipmaps(&self) -> bool {
        self.mipmaps && !self.is_tiled() && !self.grid.layout().has_waste()
    }

    /// Copies a `width` x `height` region of `src` at (`src_x`, `src_y`)
    /// into the texture at (`dst_x`, `dst_y`).
    ///
    /// `src` may be in any format; it is converted to the stored format
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::RegionOutOfBounds`] if the region exceeds
    /// either the source or the texture.
    pub fn set_region(
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
        let internal = self.format.internal;
        if src.format() == internal {
            return self
                .grid
                .upload_region(backend, src, src_x, src_y, dst_x, dst_y, width, height);
        }
        let mut converted = Bitmap::new(width, height, internal);
        converted.copy_region(src, src_x, src_y, 0, 0, width, height)?;
        self.grid
            .upload_region(backend, &converted, 0, 0, dst_x, dst_y, width, height)
    }

    /// Reads the region at (`x`, `y`) the size of `dst` into `dst`,
    /// converting to its format.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::RegionOutOfBounds`] if the region exceeds the
    /// texture.
    pub fn read_region(
        &self,
        backend: &mut dyn TextureBackend,
        x: u32,
        y: u32,
        dst: &mut Bitmap,
    ) -> Result<DownloadStats, TextureError> {
        self.grid.download_region(backend, x, y, dst)
    }

    /// Returns the whole image in `format` with rows `rowstride` bytes apart.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::RowstrideTooSmall`] if a row of `format`
    /// does not fit in `rowstride`.
    pub fn get_data(
        &self,
        backend: &mut dyn TextureBackend,
        format: PixelFormat,
        rowstride: usize,
    ) -> Result<Bitmap, TextureError> {
        let mut out = Bitmap::with_rowstride(self.width, self.height, format, rowstride)?;
        self.read_region(backend, 0, 0, &mut out)?;
        Ok(out)
    }

    /// Releases the tiles. Foreign tiles are left alone.
    pub fn destroy(self, backend: &mut dyn TextureBackend) {
        if !self.foreign {
            self.grid.release(backend);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatSet;
    use crate::memory::MemoryBackend;

    #[expect(clippy::cast_possible_truncation, reason = "test pixels wrap")]
    fn pattern(width: u32, height: u32, format: PixelFormat) -> Bitmap {
        Bitmap::from_fn(width, height, format, |x, y| {
            [x as u8, y as u8, (x * 3 + y) as u8, 255]
        })
    }

    #[test]
    fn small_texture_is_one_tile() {
        let mut backend = MemoryBackend::new(Capabilities::desktop());
        let texture = Texture::create_with_size(
            &mut backend,
            300,
            200,
            PixelFormat::Rgba8888,
            SliceConfig::DEFAULT,
        )
        .unwrap();
        assert!(!texture.is_tiled());
        assert_eq!(texture.n_tiles(), 1);
        assert_eq!(texture.rowstride(), 1200);
        assert!(texture.can_generate_mipmaps());
        texture.destroy(&mut backend);
        assert_eq!(backend.live_tiles(), 0);
    }

    #[test]
    fn power_of_two_backend_slices_and_pads() {
        let mut backend = MemoryBackend::new(Capabilities::gles2());
        let texture = Texture::create_with_size(
            &mut backend,
            300,
            200,
            PixelFormat::Rgba8888,
            SliceConfig::DEFAULT,
        )
        .unwrap();
        assert!(texture.is_tiled());
        assert_eq!(texture.n_tiles(), 2);
        assert!(texture.layout().has_waste());
        assert!(!texture.can_generate_mipmaps());
        assert_eq!(backend.live_tiles(), 2);
    }

    #[test]
    fn bitmap_round_trips_through_tiles() {
        let caps = Capabilities::gles2().with_max_texture_size(32);
        let mut backend = MemoryBackend::new(caps);
        let image = pattern(70, 45, PixelFormat::Rgba8888);
        let texture =
            Texture::create_from_bitmap(&mut backend, &image, SliceConfig::DEFAULT).unwrap();
        assert!(texture.is_tiled());

        let out = texture
            .get_data(&mut backend, PixelFormat::Rgba8888, 70 * 4)
            .unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn unsupported_format_is_stored_converted() {
        let mut backend = MemoryBackend::new(Capabilities::gles2());
        let image = pattern(5, 3, PixelFormat::Bgra8888Pre);
        let texture =
            Texture::create_from_bitmap(&mut backend, &image, SliceConfig::DEFAULT).unwrap();
        assert_eq!(texture.format(), PixelFormat::Rgba8888Pre);
        assert!(texture.negotiated_format().needs_conversion());

        let out = texture
            .get_data(&mut backend, PixelFormat::Bgra8888Pre, 5 * 4)
            .unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn alpha_only_image_keeps_alpha_when_converted() {
        let caps = Capabilities::gles2().with_formats(FormatSet::all() - FormatSet::A8);
        let mut backend = MemoryBackend::new(caps);
        let image = Bitmap::from_fn(2, 2, PixelFormat::A8, |_, _| [0, 0, 0, 42]);
        let texture =
            Texture::create_from_bitmap(&mut backend, &image, SliceConfig::DEFAULT).unwrap();
        assert_eq!(texture.format(), PixelFormat::Rgba8888);

        let out = texture.get_data(&mut backend, PixelFormat::A8, 2).unwrap();
        assert_eq!(out.data(), [42; 4]);
        assert_eq!(out, image);
    }

    #[test]
    fn padded_rows_are_honored() {
        let mut backend = MemoryBackend::new(Capabilities::desktop());
        let mut data = vec![0_u8; 16 + 12];
        data[..12].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        data[16..].copy_from_slice(&[13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24]);
        let texture = Texture::create_from_data(
            &mut backend,
            3,
            2,
            PixelFormat::Rgba8888,
            16,
            &data,
            SliceConfig::DEFAULT,
        )
        .unwrap();

        let out = texture
            .get_data(&mut backend, PixelFormat::Rgba8888, 12)
            .unwrap();
        assert_eq!(out.pixel(0, 0), [1, 2, 3, 4]);
        assert_eq!(out.pixel(2, 1), [21, 22, 23, 24]);
    }

    #[test]
    fn short_data_is_rejected() {
        let mut backend = MemoryBackend::new(Capabilities::desktop());
        let result = Texture::create_from_data(
            &mut backend,
            3,
            2,
            PixelFormat::Rgba8888,
            12,
            &[0; 20],
            SliceConfig::DEFAULT,
        );
        assert_eq!(
            result.err(),
            Some(TextureError::DataTooShort {
                len: 20,
                required: 24
            })
        );
        assert_eq!(backend.live_tiles(), 0);
    }

    #[test]
    fn partial_update_lands_in_place() {
        let mut backend = MemoryBackend::new(Capabilities::desktop());
        let texture = Texture::create_with_size(
            &mut backend,
            4,
            4,
            PixelFormat::Rgba8888,
            SliceConfig::DEFAULT,
        )
        .unwrap();
        let mut patch = Bitmap::new(1, 1, PixelFormat::Rgb888);
        patch.set_pixel(0, 0, [9, 8, 7, 255]);
        texture
            .set_region(&mut backend, &patch, 0, 0, 2, 1, 1, 1)
            .unwrap();

        let out = texture
            .get_data(&mut backend, PixelFormat::Rgba8888, 16)
            .unwrap();
        assert_eq!(out.pixel(2, 1), [9, 8, 7, 255]);
        assert_eq!(out.pixel(1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn region_outside_texture_is_rejected() {
        let mut backend = MemoryBackend::new(Capabilities::desktop());
        let texture = Texture::create_with_size(
            &mut backend,
            4,
            4,
            PixelFormat::Rgba8888,
            SliceConfig::DEFAULT,
        )
        .unwrap();
        let patch = Bitmap::new(2, 2, PixelFormat::Rgba8888);
        assert_eq!(
            texture.set_region(&mut backend, &patch, 0, 0, 3, 3, 2, 2),
            Err(TextureError::RegionOutOfBounds {
                x: 3,
                y: 3,
                width: 2,
                height: 2
            })
        );
    }

    #[test]
    fn oversized_unsliced_texture_fails() {
        let mut backend = MemoryBackend::new(Capabilities::gles2());
        let result = Texture::create_with_size(
            &mut backend,
            3000,
            10,
            PixelFormat::Rgba8888,
            SliceConfig::UNSLICED,
        );
        assert_eq!(
            result.err(),
            Some(TextureError::SizeUnsupported {
                width: 3000,
                height: 10
            })
        );
    }

    #[test]
    fn external_resource_is_borrowed() {
        let mut backend = MemoryBackend::new(Capabilities::gles2());
        let tile = backend.insert_external(pattern(8, 8, PixelFormat::Rgba8888));
        let texture = Texture::create_from_external_resource(
            &backend.capabilities(),
            tile,
            6,
            5,
            PixelFormat::Rgba8888,
            2,
            3,
        )
        .unwrap();
        assert!(texture.is_foreign());
        assert!(!texture.is_tiled());
        assert!(!texture.can_generate_mipmaps());

        let out = texture
            .get_data(&mut backend, PixelFormat::Rgba8888, 6 * 4)
            .unwrap();
        assert_eq!(out, pattern(6, 5, PixelFormat::Rgba8888));

        texture.destroy(&mut backend);
        assert_eq!(backend.live_tiles(), 1);
    }

    #[test]
    fn external_resource_format_must_be_supported() {
        let caps = Capabilities::gles2();
        assert_eq!(
            Texture::create_from_external_resource(
                &caps,
                ResourceKey(7),
                4,
                4,
                PixelFormat::Argb8888,
                0,
                0,
            )
            .err(),
            Some(TextureError::FormatUnsupported(PixelFormat::Argb8888))
        );
    }
}
