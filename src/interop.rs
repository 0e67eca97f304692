//! Conversion between native bitmaps and `image` crate buffers.

use image::RgbaImage;

use crate::{Bitmap, ColorMasks, Dib, Error};

/// Swaps between RGBA and the library's in-memory pixel order, which is
/// BGRA on little-endian hosts and RGBA on big-endian ones.
fn swap_native_order(pixels: &mut [u8]) {
    if cfg!(target_endian = "little") {
        for pixel in pixels.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }
    }
}

impl Dib {
    /// Decodes any bitmap into an 8-bit RGBA buffer, top row first.
    ///
    /// `None` when the native 32-bit conversion fails, e.g. for image types
    /// it does not handle.
    pub fn to_rgba_image(&self) -> Result<Option<RgbaImage>, Error> {
        let Some(converted) = self.convert_to_32_bits()? else {
            return Ok(None);
        };
        let (width, height) = (converted.width()?, converted.height()?);
        if width == 0 || height == 0 {
            return Ok(Some(RgbaImage::new(width, height)));
        }

        let pitch = width as usize * 4;
        let mut pixels = vec![0u8; pitch * height as usize];
        converted.convert_to_raw_bits(&mut pixels, pitch as i32, 32, ColorMasks::RGBA, true)?;
        swap_native_order(&mut pixels);
        Ok(RgbaImage::from_raw(width, height, pixels))
    }
}

impl Bitmap {
    /// Builds a 32-bit bitmap from an RGBA buffer.
    pub fn from_rgba_image(image: &RgbaImage) -> Result<Option<Bitmap>, Error> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Bitmap::allocate(width as i32, height as i32, 32, ColorMasks::RGBA);
        }

        let mut pixels = image.as_raw().clone();
        swap_native_order(&mut pixels);
        Bitmap::from_raw_bits(
            &pixels,
            width as i32,
            height as i32,
            width as i32 * 4,
            32,
            ColorMasks::RGBA,
            true,
        )
    }
}
