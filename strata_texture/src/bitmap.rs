// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU-side pixel buffers.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::error::TextureError;
use crate::format::PixelFormat;

/// A rectangle of pixels in one [`PixelFormat`], with rows `rowstride`
/// bytes apart.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    format: PixelFormat,
    rowstride: usize,
    data: Vec<u8>,
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("rowstride", &self.rowstride)
            .finish_non_exhaustive()
    }
}

impl Bitmap {
    /// Creates a zeroed bitmap with tightly packed rows.
    #[must_use]
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let rowstride = width as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            rowstride,
            data: vec![0; rowstride * height as usize],
        }
    }

    /// Creates a zeroed bitmap with the given rowstride.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::RowstrideTooSmall`] if a row does not fit.
    pub fn with_rowstride(
        width: u32,
        height: u32,
        format: PixelFormat,
        rowstride: usize,
    ) -> Result<Self, TextureError> {
        check_rowstride(width, format, rowstride)?;
        Ok(Self {
            width,
            height,
            format,
            rowstride,
            data: vec![0; rowstride * height as usize],
        })
    }

    /// Wraps existing pixel data.
    ///
    /// The last row may be short of `rowstride` as long as it holds
    /// `width` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::RowstrideTooSmall`] or
    /// [`TextureError::DataTooShort`] if the data does not cover the
    /// described layout.
    pub fn from_data(
        width: u32,
        height: u32,
        format: PixelFormat,
        rowstride: usize,
        data: Vec<u8>,
    ) -> Result<Self, TextureError> {
        let min = check_rowstride(width, format, rowstride)?;
        let required = match height {
            0 => 0,
            h => rowstride * (h as usize - 1) + min,
        };
        if data.len() < required {
            return Err(TextureError::DataTooShort {
                len: data.len(),
                required,
            });
        }
        Ok(Self {
            width,
            height,
            format,
            rowstride,
            data,
        })
    }

    /// Creates a tightly packed bitmap by evaluating `f` at every pixel.
    pub fn from_fn(
        width: u32,
        height: u32,
        format: PixelFormat,
        mut f: impl FnMut(u32, u32) -> [u8; 4],
    ) -> Self {
        let mut bitmap = Self::new(width, height, format);
        for y in 0..height {
            for x in 0..width {
                bitmap.set_pixel(x, y, f(x, y));
            }
        }
        bitmap
    }

    /// Like [`from_fn`](Self::from_fn), but copies raw pixel bytes already
    /// in `format`.
    pub(crate) fn from_pixel_bytes<'a>(
        width: u32,
        height: u32,
        format: PixelFormat,
        f: impl Fn(u32, u32) -> &'a [u8],
    ) -> Self {
        let mut bitmap = Self::new(width, height, format);
        for y in 0..height {
            for x in 0..width {
                bitmap.pixel_bytes_mut(x, y).copy_from_slice(f(x, y));
            }
        }
        bitmap
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

    /// Pixel format.
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Distance between rows in bytes.
    #[must_use]
    pub fn rowstride(&self) -> usize {
        self.rowstride
    }

    /// Raw pixel bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the bitmap, returning its bytes.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} bitmap",
            self.width,
            self.height
        );
        y as usize * self.rowstride + x as usize * self.format.bytes_per_pixel()
    }

    pub(crate) fn pixel_bytes(&self, x: u32, y: u32) -> &[u8] {
        let at = self.offset(x, y);
        &self.data[at..at + self.format.bytes_per_pixel()]
    }

    pub(crate) fn pixel_bytes_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let at = self.offset(x, y);
        let bpp = self.format.bytes_per_pixel();
        &mut self.data[at..at + bpp]
    }

    /// Reads one pixel as RGBA, premultiplied exactly when the format is.
    ///
    /// # Panics
    ///
    /// Panics if the pixel is outside the bitmap.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        unpack(self.format, self.pixel_bytes(x, y))
    }

    /// Writes one RGBA pixel, quantizing to the format.
    ///
    /// # Panics
    ///
    /// Panics if the pixel is outside the bitmap.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let format = self.format;
        pack(format, rgba, self.pixel_bytes_mut(x, y));
    }

    /// Checks that a region lies within the bitmap.
    pub(crate) fn check_region(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<(), TextureError> {
        let fits =
            |start: u32, len: u32, size: u32| u64::from(start) + u64::from(len) <= u64::from(size);
        if fits(x, width, self.width) && fits(y, height, self.height) {
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

    /// Copies a `width` x `height` region of `src` into this bitmap,
    /// converting between formats if they differ.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::RegionOutOfBounds`] if the region does not
    /// fit in either bitmap.
    pub fn copy_region(
        &mut self,
        src: &Self,
        src_x: u32,
        src_y: u32,
        dst_x: u32,
        dst_y: u32,
        width: u32,
        height: u32,
    ) -> Result<(), TextureError> {
        src.check_region(src_x, src_y, width, height)?;
        self.check_region(dst_x, dst_y, width, height)?;
        if width == 0 || height == 0 {
            return Ok(());
        }

        if src.format == self.format {
            let len = width as usize * self.format.bytes_per_pixel();
            for row in 0..height {
                let from = src.offset(src_x, src_y + row);
                let to = self.offset(dst_x, dst_y + row);
                self.data[to..to + len].copy_from_slice(&src.data[from..from + len]);
            }
            return Ok(());
        }

        let premultiply = match (src.format.is_premultiplied(), self.format.is_premultiplied()) {
            (false, true) => Some(true),
            (true, false) => Some(false),
            _ => None,
        };
        for row in 0..height {
            for col in 0..width {
                let mut rgba = src.pixel(src_x + col, src_y + row);
                match premultiply {
                    Some(true) => rgba = premultiplied(rgba),
                    Some(false) => rgba = unpremultiplied(rgba),
                    None => {}
                }
                self.set_pixel(dst_x + col, dst_y + row, rgba);
            }
        }
        Ok(())
    }

    /// Returns a tightly packed copy in another format.
    #[must_use]
    pub fn convert(&self, format: PixelFormat) -> Self {
        let mut out = Self::new(self.width, self.height, format);
        // Both bitmaps have the same size, so the region always fits.
        let copied = out.copy_region(self, 0, 0, 0, 0, self.width, self.height);
        debug_assert!(copied.is_ok(), "full-size copy is in bounds");
        out
    }

    /// Returns a copy with a different rowstride.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::RowstrideTooSmall`] if a row does not fit.
    pub fn with_new_rowstride(&self, rowstride: usize) -> Result<Self, TextureError> {
        let mut out = Self::with_rowstride(self.width, self.height, self.format, rowstride)?;
        out.copy_region(self, 0, 0, 0, 0, self.width, self.height)?;
        Ok(out)
    }
}

fn check_rowstride(
    width: u32,
    format: PixelFormat,
    rowstride: usize,
) -> Result<usize, TextureError> {
    let min = width as usize * format.bytes_per_pixel();
    if rowstride < min {
        return Err(TextureError::RowstrideTooSmall { rowstride, min });
    }
    Ok(min)
}

// ---------------------------------------------------------------------------
// Pixel packing
// ---------------------------------------------------------------------------

#[expect(clippy::cast_possible_truncation, reason = "masked to five bits")]
fn expand5(v: u16) -> u8 {
    let v = (v & 0x1f) as u8;
    (v << 3) | (v >> 2)
}

#[expect(clippy::cast_possible_truncation, reason = "masked to six bits")]
fn expand6(v: u16) -> u8 {
    let v = (v & 0x3f) as u8;
    (v << 2) | (v >> 4)
}

fn unpack(format: PixelFormat, p: &[u8]) -> [u8; 4] {
    use PixelFormat as F;
    match format {
        F::A8 => [0, 0, 0, p[0]],
        F::G8 => [p[0], p[0], p[0], 255],
        F::Rgb565 => {
            let v = u16::from_le_bytes([p[0], p[1]]);
            [expand5(v >> 11), expand6(v >> 5), expand5(v), 255]
        }
        F::Rgba4444 | F::Rgba4444Pre => [
            (p[0] >> 4) * 17,
            (p[0] & 0xf) * 17,
            (p[1] >> 4) * 17,
            (p[1] & 0xf) * 17,
        ],
        F::Rgba5551 | F::Rgba5551Pre => {
            let v = u16::from_le_bytes([p[0], p[1]]);
            let a = if v & 1 != 0 { 255 } else { 0 };
            [expand5(v >> 11), expand5(v >> 6), expand5(v >> 1), a]
        }
        F::Rgb888 => [p[0], p[1], p[2], 255],
        F::Bgr888 => [p[2], p[1], p[0], 255],
        F::Rgba8888 | F::Rgba8888Pre => [p[0], p[1], p[2], p[3]],
        F::Bgra8888 | F::Bgra8888Pre => [p[2], p[1], p[0], p[3]],
        F::Argb8888 | F::Argb8888Pre => [p[1], p[2], p[3], p[0]],
        F::Abgr8888 | F::Abgr8888Pre => [p[3], p[2], p[1], p[0]],
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "luminance and nibble pairs both fit in a byte"
)]
fn pack(format: PixelFormat, [r, g, b, a]: [u8; 4], out: &mut [u8]) {
    use PixelFormat as F;
    let nibble = |c: u8| (u16::from(c) + 8) / 17;
    match format {
        F::A8 => out[0] = a,
        F::G8 => {
            let luma = (77 * u32::from(r) + 150 * u32::from(g) + 29 * u32::from(b)) >> 8;
            out[0] = luma as u8;
        }
        F::Rgb565 => {
            let v = (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3);
            out.copy_from_slice(&v.to_le_bytes());
        }
        F::Rgba4444 | F::Rgba4444Pre => {
            out[0] = ((nibble(r) << 4) | nibble(g)) as u8;
            out[1] = ((nibble(b) << 4) | nibble(a)) as u8;
        }
        F::Rgba5551 | F::Rgba5551Pre => {
            let v = (u16::from(r >> 3) << 11)
                | (u16::from(g >> 3) << 6)
                | (u16::from(b >> 3) << 1)
                | u16::from(a >= 128);
            out.copy_from_slice(&v.to_le_bytes());
        }
        F::Rgb888 => out.copy_from_slice(&[r, g, b]),
        F::Bgr888 => out.copy_from_slice(&[b, g, r]),
        F::Rgba8888 | F::Rgba8888Pre => out.copy_from_slice(&[r, g, b, a]),
        F::Bgra8888 | F::Bgra8888Pre => out.copy_from_slice(&[b, g, r, a]),
        F::Argb8888 | F::Argb8888Pre => out.copy_from_slice(&[a, r, g, b]),
        F::Abgr8888 | F::Abgr8888Pre => out.copy_from_slice(&[a, b, g, r]),
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "c * a / 255 never exceeds 255"
)]
fn premultiplied([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let mul = |c: u8| ((u32::from(c) * u32::from(a) + 127) / 255) as u8;
    [mul(r), mul(g), mul(b), a]
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the quotient is clamped to 255 first"
)]
fn unpremultiplied([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let div = |c: u8| ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8;
    [div(r), div(g), div(b), a]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rowstride_and_length_are_validated() {
        assert_eq!(
            Bitmap::with_rowstride(4, 1, PixelFormat::Rgb888, 11),
            Err(TextureError::RowstrideTooSmall {
                rowstride: 11,
                min: 12
            })
        );
        // Two rows of 16 bytes, the last one unpadded.
        assert!(Bitmap::from_data(3, 2, PixelFormat::Rgba8888, 16, vec![0; 28]).is_ok());
        assert_eq!(
            Bitmap::from_data(3, 2, PixelFormat::Rgba8888, 16, vec![0; 27]),
            Err(TextureError::DataTooShort {
                len: 27,
                required: 28
            })
        );
    }

    #[test]
    fn packed_formats_keep_representable_values() {
        let cases = [
            (PixelFormat::Rgb565, [255, 0, 255, 255]),
            (PixelFormat::Rgba4444, [0x11, 0x22, 0xff, 0x88]),
            (PixelFormat::Rgba5551, [255, 0, 0, 0]),
            (PixelFormat::G8, [255, 255, 255, 255]),
            (PixelFormat::A8, [0, 0, 0, 42]),
            (PixelFormat::Argb8888, [1, 2, 3, 4]),
            (PixelFormat::Bgr888, [9, 8, 7, 255]),
        ];
        for (format, rgba) in cases {
            let mut bitmap = Bitmap::new(1, 1, format);
            bitmap.set_pixel(0, 0, rgba);
            assert_eq!(bitmap.pixel(0, 0), rgba, "{format:?}");
        }
    }

    #[test]
    fn byte_order_follows_format_name() {
        let mut bitmap = Bitmap::new(1, 1, PixelFormat::Argb8888);
        bitmap.set_pixel(0, 0, [1, 2, 3, 4]);
        assert_eq!(bitmap.data(), [4, 1, 2, 3]);

        let mut bitmap = Bitmap::new(1, 1, PixelFormat::Rgb565);
        bitmap.set_pixel(0, 0, [255, 0, 0, 255]);
        assert_eq!(bitmap.data(), [0x00, 0xf8]);
    }

    #[test]
    fn luminance_weights() {
        let mut bitmap = Bitmap::new(1, 1, PixelFormat::G8);
        bitmap.set_pixel(0, 0, [0, 255, 0, 255]);
        assert_eq!(bitmap.data(), [149]);
    }

    #[test]
    fn conversion_applies_premultiplication() {
        let mut straight = Bitmap::new(1, 1, PixelFormat::Rgba8888);
        straight.set_pixel(0, 0, [255, 128, 0, 128]);

        let pre = straight.convert(PixelFormat::Bgra8888Pre);
        assert_eq!(pre.pixel(0, 0), [128, 64, 0, 128]);

        let back = pre.convert(PixelFormat::Rgba8888);
        assert_eq!(back.pixel(0, 0), [255, 128, 0, 128]);
    }

    #[test]
    fn copy_region_checks_bounds() {
        let src = Bitmap::new(4, 4, PixelFormat::Rgba8888);
        let mut dst = Bitmap::new(2, 2, PixelFormat::Rgba8888);
        assert!(dst.copy_region(&src, 2, 2, 0, 0, 2, 2).is_ok());
        assert_eq!(
            dst.copy_region(&src, 0, 0, 1, 0, 2, 2),
            Err(TextureError::RegionOutOfBounds {
                x: 1,
                y: 0,
                width: 2,
                height: 2
            })
        );
    }

    #[test]
    fn new_rowstride_keeps_pixels() {
        let mut bitmap = Bitmap::new(2, 2, PixelFormat::Rgb888);
        bitmap.set_pixel(1, 1, [1, 2, 3, 255]);
        let padded = bitmap.with_new_rowstride(8).unwrap();
        assert_eq!(padded.rowstride(), 8);
        assert_eq!(padded.pixel(1, 1), [1, 2, 3, 255]);
    }
}
