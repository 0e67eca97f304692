use std::{
    ffi::{c_long, c_void},
    marker::{PhantomData, PhantomPinned},
    ops::{Deref, DerefMut},
    path::Path,
    ptr::NonNull,
};

use crate::{
    BitmapInfo, BitmapInfoHeader, Buffer, BufferMut, ColorChannel, ColorType, Dither, Error,
    Filter, IccProfile, ImageFormat, ImageType, Prototype, Quantize, Resolved, RgbQuad, ToneMap,
    Value,
    bindings::{self, *},
    library,
};

/// An opaque native bitmap (`FIBITMAP`).
///
/// Only ever seen behind a reference: `&Dib` from an owning [`Bitmap`], a
/// [`LockedPage`](crate::LockedPage) or a bitmap's embedded thumbnail. Width,
/// height and the rest are queried from the native side on every call.
#[repr(C)]
pub struct Dib {
    _private: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

impl std::fmt::Debug for Dib {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Dib").field(&self.as_ptr()).finish()
    }
}

/// Red, green and blue bit masks for the allocation and raw-bits calls.
/// All zero means "use the library default for this bit depth".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorMasks {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl ColorMasks {
    pub const NONE: Self = Self::new(0, 0, 0);
    pub const RGB555: Self = Self::new(0x7C00, 0x03E0, 0x001F);
    pub const RGB565: Self = Self::new(0xF800, 0x07E0, 0x001F);
    /// Masks of a 24/32-bit pixel in the library's native colour order.
    #[cfg(target_endian = "little")]
    pub const RGBA: Self = Self::new(0x00FF_0000, 0x0000_FF00, 0x0000_00FF);
    #[cfg(target_endian = "big")]
    pub const RGBA: Self = Self::new(0xFF00_0000, 0x00FF_0000, 0x0000_FF00);

    pub const fn new(red: u32, green: u32, blue: u32) -> Self {
        Self { red, green, blue }
    }

    fn values(self) -> [Value<'static>; 3] {
        [
            Value::U32(self.red),
            Value::U32(self.green),
            Value::U32(self.blue),
        ]
    }
}

/// Calls a bitmap-creating function and takes ownership of what it returns.
///
/// The release call is resolved first, so an owned handle never exists
/// without a way to free it.
pub(crate) fn create(
    prototype: &'static Prototype,
    args: Vec<Value<'_>>,
) -> Result<Option<Bitmap>, Error> {
    let unload = Resolved::new(library(), &UNLOAD)?;
    let raw = unsafe { bindings::call(prototype, args) }?.pointer();
    Ok(unsafe { Bitmap::from_raw(raw, unload) })
}

/// `None` becomes a null address.
pub(crate) fn optional(buffer: Option<Buffer<'_>>) -> Value<'_> {
    buffer.map_or_else(Value::null, Value::Buffer)
}

macro_rules! getters {
    ($($(#[$meta:meta])* $method:ident -> $out:ty = $prototype:ident.$accessor:ident;)+) => {
        $(
            $(#[$meta])*
            pub fn $method(&self) -> Result<$out, Error> {
                Ok(unsafe { bindings::call(&$prototype, vec![self.handle()]) }?.$accessor())
            }
        )+
    };
}

macro_rules! conversions {
    ($($(#[$meta:meta])* $method:ident = $prototype:ident;)+) => {
        $(
            $(#[$meta])*
            pub fn $method(&self) -> Result<Option<Bitmap>, Error> {
                create(&$prototype, vec![self.handle()])
            }
        )+
    };
}

impl Dib {
    /// # Safety
    ///
    /// `raw` must be null or a live `FIBITMAP` that outlives `'a`.
    pub(crate) unsafe fn from_ptr<'a>(raw: *mut c_void) -> Option<&'a Dib> {
        unsafe { (raw as *const Dib).as_ref() }
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self as *const Dib as *mut c_void
    }

    pub(crate) fn handle(&self) -> Value<'static> {
        Value::Pointer(self.as_ptr())
    }

    getters! {
        /// Whether pixel data is present, as opposed to a header-only load.
        has_pixels -> bool = HAS_PIXELS.bool;
        width -> u32 = GET_WIDTH.u32;
        height -> u32 = GET_HEIGHT.u32;
        bpp -> u32 = GET_BPP.u32;
        /// Width of one scan line in bytes, without padding.
        line -> u32 = GET_LINE.u32;
        /// Width of one scan line in bytes, including alignment padding.
        pitch -> u32 = GET_PITCH.u32;
        dib_size -> u32 = GET_DIB_SIZE.u32;
        memory_size -> u32 = GET_MEMORY_SIZE.u32;
        colors_used -> u32 = GET_COLORS_USED.u32;
        dots_per_meter_x -> u32 = GET_DOTS_PER_METER_X.u32;
        dots_per_meter_y -> u32 = GET_DOTS_PER_METER_Y.u32;
        red_mask -> u32 = GET_RED_MASK.u32;
        green_mask -> u32 = GET_GREEN_MASK.u32;
        blue_mask -> u32 = GET_BLUE_MASK.u32;
        transparency_count -> u32 = GET_TRANSPARENCY_COUNT.u32;
        is_transparent -> bool = IS_TRANSPARENT.bool;
        /// `-1` when no transparent index is set.
        transparent_index -> i32 = GET_TRANSPARENT_INDEX.i32;
        has_background_color -> bool = HAS_BACKGROUND_COLOR.bool;
    }

    pub fn image_type(&self) -> Result<ImageType, Error> {
        Ok(unsafe { bindings::call(&GET_IMAGE_TYPE, vec![self.handle()]) }?
            .i32()
            .into())
    }

    pub fn color_type(&self) -> Result<ColorType, Error> {
        Ok(unsafe { bindings::call(&GET_COLOR_TYPE, vec![self.handle()]) }?
            .i32()
            .into())
    }

    pub fn set_dots_per_meter_x(&mut self, resolution: u32) -> Result<(), Error> {
        unsafe { bindings::call(&SET_DOTS_PER_METER_X, vec![self.handle(), Value::U32(resolution)]) }?
            .void();
        Ok(())
    }

    pub fn set_dots_per_meter_y(&mut self, resolution: u32) -> Result<(), Error> {
        unsafe { bindings::call(&SET_DOTS_PER_METER_Y, vec![self.handle(), Value::U32(resolution)]) }?
            .void();
        Ok(())
    }

    fn bits_ptr(&self) -> Result<Option<(*mut u8, usize)>, Error> {
        let p = unsafe { bindings::call(&GET_BITS, vec![self.handle()]) }?.pointer() as *mut u8;
        if p.is_null() {
            return Ok(None);
        }
        let len = self.pitch()? as usize * self.height()? as usize;
        Ok(Some((p, len)))
    }

    /// The whole pixel buffer, bottom scan line first. `None` for a
    /// header-only bitmap.
    pub fn bits(&self) -> Result<Option<&[u8]>, Error> {
        Ok(self
            .bits_ptr()?
            .map(|(p, len)| unsafe { std::slice::from_raw_parts(p as *const u8, len) }))
    }

    pub fn bits_mut(&mut self) -> Result<Option<&mut [u8]>, Error> {
        Ok(self
            .bits_ptr()?
            .map(|(p, len)| unsafe { std::slice::from_raw_parts_mut(p, len) }))
    }

    fn scan_line_ptr(&self, y: u32) -> Result<Option<(*mut u8, usize)>, Error> {
        if y >= self.height()? {
            return Ok(None);
        }
        let p = unsafe {
            bindings::call(&GET_SCAN_LINE, vec![self.handle(), Value::I32(y as i32)])
        }?
        .pointer() as *mut u8;
        if p.is_null() {
            return Ok(None);
        }
        Ok(Some((p, self.line()? as usize)))
    }

    /// Scan line `y`, counted from the bottom. `None` when out of range or
    /// when the bitmap has no pixels.
    pub fn scan_line(&self, y: u32) -> Result<Option<&[u8]>, Error> {
        Ok(self
            .scan_line_ptr(y)?
            .map(|(p, len)| unsafe { std::slice::from_raw_parts(p as *const u8, len) }))
    }

    pub fn scan_line_mut(&mut self, y: u32) -> Result<Option<&mut [u8]>, Error> {
        Ok(self
            .scan_line_ptr(y)?
            .map(|(p, len)| unsafe { std::slice::from_raw_parts_mut(p, len) }))
    }

    /// Palette index at `(x, y)` of a palettized bitmap.
    pub fn pixel_index(&self, x: u32, y: u32) -> Result<Option<u8>, Error> {
        let mut value = 0u8;
        let ok = unsafe {
            bindings::call(
                &GET_PIXEL_INDEX,
                vec![self.handle(), Value::U32(x), Value::U32(y), Value::out(&mut value)],
            )
        }?
        .bool();
        Ok(ok.then_some(value))
    }

    /// Colour at `(x, y)` of a 16-, 24- or 32-bit bitmap.
    pub fn pixel_color(&self, x: u32, y: u32) -> Result<Option<RgbQuad>, Error> {
        let mut value = RgbQuad::default();
        let ok = unsafe {
            bindings::call(
                &GET_PIXEL_COLOR,
                vec![self.handle(), Value::U32(x), Value::U32(y), Value::out(&mut value)],
            )
        }?
        .bool();
        Ok(ok.then_some(value))
    }

    pub fn set_pixel_index(&mut self, x: u32, y: u32, index: u8) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &SET_PIXEL_INDEX,
                vec![self.handle(), Value::U32(x), Value::U32(y), Buffer::from(&index).into()],
            )
        }?
        .bool())
    }

    pub fn set_pixel_color(&mut self, x: u32, y: u32, color: RgbQuad) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &SET_PIXEL_COLOR,
                vec![self.handle(), Value::U32(x), Value::U32(y), Buffer::from(&color).into()],
            )
        }?
        .bool())
    }

    fn palette_ptr(&self) -> Result<Option<(*mut RgbQuad, usize)>, Error> {
        let p = unsafe { bindings::call(&GET_PALETTE, vec![self.handle()]) }?.pointer() as *mut RgbQuad;
        if p.is_null() {
            return Ok(None);
        }
        Ok(Some((p, self.colors_used()? as usize)))
    }

    /// The palette of a palettized bitmap, `colors_used` entries long.
    pub fn palette(&self) -> Result<Option<&[RgbQuad]>, Error> {
        Ok(self
            .palette_ptr()?
            .map(|(p, len)| unsafe { std::slice::from_raw_parts(p as *const RgbQuad, len) }))
    }

    pub fn palette_mut(&mut self) -> Result<Option<&mut [RgbQuad]>, Error> {
        Ok(self
            .palette_ptr()?
            .map(|(p, len)| unsafe { std::slice::from_raw_parts_mut(p, len) }))
    }

    pub fn info_header(&self) -> Result<Option<&BitmapInfoHeader>, Error> {
        let p = unsafe { bindings::call(&GET_INFO_HEADER, vec![self.handle()]) }?.pointer();
        Ok(unsafe { (p as *const BitmapInfoHeader).as_ref() })
    }

    pub fn info(&self) -> Result<Option<&BitmapInfo>, Error> {
        let p = unsafe { bindings::call(&GET_INFO, vec![self.handle()]) }?.pointer();
        Ok(unsafe { (p as *const BitmapInfo).as_ref() })
    }

    /// Per-index alpha values of a palettized bitmap.
    pub fn transparency_table(&self) -> Result<Option<&[u8]>, Error> {
        let p = unsafe { bindings::call(&GET_TRANSPARENCY_TABLE, vec![self.handle()]) }?.pointer();
        if p.is_null() {
            return Ok(None);
        }
        let len = self.transparency_count()? as usize;
        Ok(Some(unsafe { std::slice::from_raw_parts(p as *const u8, len) }))
    }

    pub fn set_transparent(&mut self, enabled: bool) -> Result<(), Error> {
        unsafe { bindings::call(&SET_TRANSPARENT, vec![self.handle(), Value::Bool(enabled)]) }?.void();
        Ok(())
    }

    /// Replaces the transparency table; an empty table removes it.
    pub fn set_transparency_table(&mut self, table: &[u8]) -> Result<(), Error> {
        let table_arg = if table.is_empty() {
            Value::null()
        } else {
            Buffer::from(table).into()
        };
        unsafe {
            bindings::call(
                &SET_TRANSPARENCY_TABLE,
                vec![self.handle(), table_arg, Value::I32(table.len() as i32)],
            )
        }?
        .void();
        Ok(())
    }

    pub fn set_transparent_index(&mut self, index: i32) -> Result<(), Error> {
        unsafe { bindings::call(&SET_TRANSPARENT_INDEX, vec![self.handle(), Value::I32(index)]) }?
            .void();
        Ok(())
    }

    pub fn background_color(&self) -> Result<Option<RgbQuad>, Error> {
        let mut color = RgbQuad::default();
        let ok = unsafe {
            bindings::call(&GET_BACKGROUND_COLOR, vec![self.handle(), Value::out(&mut color)])
        }?
        .bool();
        Ok(ok.then_some(color))
    }

    /// Sets the file background colour, or removes it with `None`.
    pub fn set_background_color(&mut self, color: Option<RgbQuad>) -> Result<bool, Error> {
        let color_arg = optional(color.as_ref().map(Buffer::from));
        Ok(unsafe { bindings::call(&SET_BACKGROUND_COLOR, vec![self.handle(), color_arg]) }?.bool())
    }

    /// The embedded thumbnail. It belongs to this bitmap.
    pub fn thumbnail(&self) -> Result<Option<&Dib>, Error> {
        let p = unsafe { bindings::call(&GET_THUMBNAIL, vec![self.handle()]) }?.pointer();
        Ok(unsafe { Dib::from_ptr(p) })
    }

    /// Attaches a copy of `thumbnail`, or removes the current one with `None`.
    pub fn set_thumbnail(&mut self, thumbnail: Option<&Dib>) -> Result<bool, Error> {
        let thumbnail_arg = thumbnail.map_or_else(Value::null, Dib::handle);
        Ok(unsafe { bindings::call(&SET_THUMBNAIL, vec![self.handle(), thumbnail_arg]) }?.bool())
    }

    pub fn icc_profile(&self) -> Result<Option<&IccProfile>, Error> {
        let p = unsafe { bindings::call(&GET_ICC_PROFILE, vec![self.handle()]) }?.pointer();
        Ok(unsafe { (p as *const IccProfile).as_ref() })
    }

    /// Copies `data` into a new profile owned by this bitmap.
    pub fn create_icc_profile(&mut self, data: &[u8]) -> Result<Option<&IccProfile>, Error> {
        let data_arg = if data.is_empty() {
            Value::null()
        } else {
            Buffer::from(data).into()
        };
        let p = unsafe {
            bindings::call(
                &CREATE_ICC_PROFILE,
                vec![self.handle(), data_arg, Value::Long(data.len() as c_long)],
            )
        }?
        .pointer();
        Ok(unsafe { (p as *const IccProfile).as_ref() })
    }

    pub fn destroy_icc_profile(&mut self) -> Result<(), Error> {
        unsafe { bindings::call(&DESTROY_ICC_PROFILE, vec![self.handle()]) }?.void();
        Ok(())
    }

    /// A deep copy: pixels, palette and metadata.
    pub fn try_clone(&self) -> Result<Option<Bitmap>, Error> {
        create(&CLONE, vec![self.handle()])
    }

    /// Writes the bitmap to `path` in `format`.
    ///
    /// Non UTF-8 path components are replaced before the call.
    pub fn save(&self, format: ImageFormat, path: impl AsRef<Path>, flags: i32) -> Result<bool, Error> {
        let path = path.as_ref().to_string_lossy();
        Ok(unsafe {
            bindings::call(
                &SAVE,
                vec![Value::I32(format.0), self.handle(), Value::Str(&path), Value::I32(flags)],
            )
        }?
        .bool())
    }

    conversions! {
        convert_to_4_bits = CONVERT_TO_4_BITS;
        convert_to_8_bits = CONVERT_TO_8_BITS;
        convert_to_greyscale = CONVERT_TO_GREYSCALE;
        convert_to_16_bits_555 = CONVERT_TO_16_BITS_555;
        convert_to_16_bits_565 = CONVERT_TO_16_BITS_565;
        convert_to_24_bits = CONVERT_TO_24_BITS;
        convert_to_32_bits = CONVERT_TO_32_BITS;
        convert_to_float = CONVERT_TO_FLOAT;
        convert_to_rgbf = CONVERT_TO_RGBF;
        convert_to_rgbaf = CONVERT_TO_RGBAF;
        convert_to_uint16 = CONVERT_TO_UINT16;
        convert_to_rgb16 = CONVERT_TO_RGB16;
        convert_to_rgba16 = CONVERT_TO_RGBA16;
    }

    pub fn color_quantize(&self, quantize: Quantize) -> Result<Option<Bitmap>, Error> {
        create(&COLOR_QUANTIZE, vec![self.handle(), Value::I32(quantize.raw())])
    }

    /// Quantizes to `palette_size` colours, keeping the `reserve` entries at
    /// the start of the palette.
    pub fn color_quantize_ex(
        &self,
        quantize: Quantize,
        palette_size: i32,
        reserve: &[RgbQuad],
    ) -> Result<Option<Bitmap>, Error> {
        let reserve_arg = if reserve.is_empty() {
            Value::null()
        } else {
            Buffer::from(reserve).into()
        };
        create(
            &COLOR_QUANTIZE_EX,
            vec![
                self.handle(),
                Value::I32(quantize.raw()),
                Value::I32(palette_size),
                Value::I32(reserve.len() as i32),
                reserve_arg,
            ],
        )
    }

    pub fn threshold(&self, threshold: u8) -> Result<Option<Bitmap>, Error> {
        create(&THRESHOLD, vec![self.handle(), Value::U8(threshold)])
    }

    pub fn dither(&self, algorithm: Dither) -> Result<Option<Bitmap>, Error> {
        create(&DITHER, vec![self.handle(), Value::I32(algorithm.raw())])
    }

    pub fn convert_to_standard_type(&self, scale_linear: bool) -> Result<Option<Bitmap>, Error> {
        create(&CONVERT_TO_STANDARD_TYPE, vec![self.handle(), Value::Bool(scale_linear)])
    }

    pub fn convert_to_type(&self, target: ImageType, scale_linear: bool) -> Result<Option<Bitmap>, Error> {
        create(
            &CONVERT_TO_TYPE,
            vec![self.handle(), Value::I32(target.raw()), Value::Bool(scale_linear)],
        )
    }

    /// Copies the pixels into `bits` as `bpp`-bit scan lines `pitch` bytes
    /// apart.
    ///
    /// # Panics
    ///
    /// If `pitch` is shorter than one `bpp`-bit scan line, or `bits` cannot
    /// hold every line at that pitch.
    pub fn convert_to_raw_bits(
        &self,
        bits: &mut [u8],
        pitch: i32,
        bpp: u32,
        masks: ColorMasks,
        top_down: bool,
    ) -> Result<(), Error> {
        check_raw_layout(bits.len(), self.width()?.into(), self.height()?.into(), pitch, bpp);
        let [red, green, blue] = masks.values();
        unsafe {
            bindings::call(
                &CONVERT_TO_RAW_BITS,
                vec![
                    BufferMut::from(bits).into(),
                    self.handle(),
                    Value::I32(pitch),
                    Value::U32(bpp),
                    red,
                    green,
                    blue,
                    Value::Bool(top_down),
                ],
            )
        }?
        .void();
        Ok(())
    }

    pub fn tone_mapping(&self, operator: ToneMap, first: f64, second: f64) -> Result<Option<Bitmap>, Error> {
        create(
            &TONE_MAPPING,
            vec![self.handle(), Value::I32(operator.raw()), Value::F64(first), Value::F64(second)],
        )
    }

    pub fn tmo_drago03(&self, gamma: f64, exposure: f64) -> Result<Option<Bitmap>, Error> {
        create(&TMO_DRAGO03, vec![self.handle(), Value::F64(gamma), Value::F64(exposure)])
    }

    pub fn tmo_reinhard05(&self, intensity: f64, contrast: f64) -> Result<Option<Bitmap>, Error> {
        create(&TMO_REINHARD05, vec![self.handle(), Value::F64(intensity), Value::F64(contrast)])
    }

    pub fn tmo_reinhard05_ex(
        &self,
        intensity: f64,
        contrast: f64,
        adaptation: f64,
        color_correction: f64,
    ) -> Result<Option<Bitmap>, Error> {
        create(
            &TMO_REINHARD05_EX,
            vec![
                self.handle(),
                Value::F64(intensity),
                Value::F64(contrast),
                Value::F64(adaptation),
                Value::F64(color_correction),
            ],
        )
    }

    pub fn tmo_fattal02(&self, color_saturation: f64, attenuation: f64) -> Result<Option<Bitmap>, Error> {
        create(
            &TMO_FATTAL02,
            vec![self.handle(), Value::F64(color_saturation), Value::F64(attenuation)],
        )
    }

    /// Rotates by `angle` degrees, filling uncovered areas with `background`
    /// (an element of the bitmap's pixel type) or black.
    ///
    /// # Panics
    ///
    /// If `background` is shorter than [`fill_color_len`] for this bitmap.
    pub fn rotate(&self, angle: f64, background: Option<Buffer<'_>>) -> Result<Option<Bitmap>, Error> {
        if let Some(background) = &background {
            check_fill_color(background, self.image_type()?, self.bpp()?);
        }
        create(&ROTATE, vec![self.handle(), Value::F64(angle), optional(background)])
    }

    pub fn rotate_ex(
        &self,
        angle: f64,
        shift: (f64, f64),
        origin: (f64, f64),
        use_mask: bool,
    ) -> Result<Option<Bitmap>, Error> {
        create(
            &ROTATE_EX,
            vec![
                self.handle(),
                Value::F64(angle),
                Value::F64(shift.0),
                Value::F64(shift.1),
                Value::F64(origin.0),
                Value::F64(origin.1),
                Value::Bool(use_mask),
            ],
        )
    }

    pub fn flip_horizontal(&mut self) -> Result<bool, Error> {
        Ok(unsafe { bindings::call(&FLIP_HORIZONTAL, vec![self.handle()]) }?.bool())
    }

    pub fn flip_vertical(&mut self) -> Result<bool, Error> {
        Ok(unsafe { bindings::call(&FLIP_VERTICAL, vec![self.handle()]) }?.bool())
    }

    pub fn rescale(&self, width: i32, height: i32, filter: Filter) -> Result<Option<Bitmap>, Error> {
        create(
            &RESCALE,
            vec![self.handle(), Value::I32(width), Value::I32(height), Value::I32(filter.raw())],
        )
    }

    /// Rescales the `left..right` x `top..bottom` region to the destination
    /// size. `flags` takes the `RESCALE_*` values from [`flags`](crate::flags).
    #[allow(clippy::too_many_arguments)]
    pub fn rescale_rect(
        &self,
        width: i32,
        height: i32,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        filter: Filter,
        flags: u32,
    ) -> Result<Option<Bitmap>, Error> {
        create(
            &RESCALE_RECT,
            vec![
                self.handle(),
                Value::I32(width),
                Value::I32(height),
                Value::I32(left),
                Value::I32(top),
                Value::I32(right),
                Value::I32(bottom),
                Value::I32(filter.raw()),
                Value::U32(flags),
            ],
        )
    }

    /// A thumbnail no larger than `max_pixel_size` on either side; with
    /// `convert`, high dynamic range input is tone mapped to 24 bits.
    pub fn make_thumbnail(&self, max_pixel_size: i32, convert: bool) -> Result<Option<Bitmap>, Error> {
        create(
            &MAKE_THUMBNAIL,
            vec![self.handle(), Value::I32(max_pixel_size), Value::Bool(convert)],
        )
    }

    pub fn adjust_curve(&mut self, lut: &[u8; 256], channel: ColorChannel) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &ADJUST_CURVE,
                vec![self.handle(), Buffer::from(&lut[..]).into(), Value::I32(channel.raw())],
            )
        }?
        .bool())
    }

    pub fn adjust_gamma(&mut self, gamma: f64) -> Result<bool, Error> {
        Ok(unsafe { bindings::call(&ADJUST_GAMMA, vec![self.handle(), Value::F64(gamma)]) }?.bool())
    }

    /// `percentage` in `-100..=100`.
    pub fn adjust_brightness(&mut self, percentage: f64) -> Result<bool, Error> {
        Ok(unsafe { bindings::call(&ADJUST_BRIGHTNESS, vec![self.handle(), Value::F64(percentage)]) }?
            .bool())
    }

    /// `percentage` in `-100..=100`.
    pub fn adjust_contrast(&mut self, percentage: f64) -> Result<bool, Error> {
        Ok(unsafe { bindings::call(&ADJUST_CONTRAST, vec![self.handle(), Value::F64(percentage)]) }?
            .bool())
    }

    pub fn invert(&mut self) -> Result<bool, Error> {
        Ok(unsafe { bindings::call(&INVERT, vec![self.handle()]) }?.bool())
    }

    pub fn histogram(&self, channel: ColorChannel) -> Result<Option<[u32; 256]>, Error> {
        let mut histogram = [0u32; 256];
        let ok = unsafe {
            bindings::call(
                &GET_HISTOGRAM,
                vec![
                    self.handle(),
                    BufferMut::from(&mut histogram[..]).into(),
                    Value::I32(channel.raw()),
                ],
            )
        }?
        .bool();
        Ok(ok.then_some(histogram))
    }

    pub fn adjust_colors(
        &mut self,
        brightness: f64,
        contrast: f64,
        gamma: f64,
        invert: bool,
    ) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &ADJUST_COLORS,
                vec![
                    self.handle(),
                    Value::F64(brightness),
                    Value::F64(contrast),
                    Value::F64(gamma),
                    Value::Bool(invert),
                ],
            )
        }?
        .bool())
    }

    /// Replaces each colour in `from` with its counterpart in `to` (both ways
    /// with `swap`) and returns the number of pixels changed.
    ///
    /// # Panics
    ///
    /// If the two slices differ in length.
    pub fn apply_color_mapping(
        &mut self,
        from: &[RgbQuad],
        to: &[RgbQuad],
        ignore_alpha: bool,
        swap: bool,
    ) -> Result<u32, Error> {
        assert_eq!(from.len(), to.len(), "colour mapping tables differ in length");
        if from.is_empty() {
            return Ok(0);
        }
        Ok(unsafe {
            bindings::call(
                &APPLY_COLOR_MAPPING,
                vec![
                    self.handle(),
                    Buffer::from(from).into(),
                    Buffer::from(to).into(),
                    Value::U32(from.len() as u32),
                    Value::Bool(ignore_alpha),
                    Value::Bool(swap),
                ],
            )
        }?
        .u32())
    }

    pub fn swap_colors(&mut self, a: RgbQuad, b: RgbQuad, ignore_alpha: bool) -> Result<u32, Error> {
        Ok(unsafe {
            bindings::call(
                &SWAP_COLORS,
                vec![
                    self.handle(),
                    Buffer::from(&a).into(),
                    Buffer::from(&b).into(),
                    Value::Bool(ignore_alpha),
                ],
            )
        }?
        .u32())
    }

    /// # Panics
    ///
    /// If the two slices differ in length.
    pub fn apply_palette_index_mapping(&mut self, from: &[u8], to: &[u8], swap: bool) -> Result<u32, Error> {
        assert_eq!(from.len(), to.len(), "index mapping tables differ in length");
        if from.is_empty() {
            return Ok(0);
        }
        Ok(unsafe {
            bindings::call(
                &APPLY_PALETTE_INDEX_MAPPING,
                vec![
                    self.handle(),
                    Buffer::from(from).into(),
                    Buffer::from(to).into(),
                    Value::U32(from.len() as u32),
                    Value::Bool(swap),
                ],
            )
        }?
        .u32())
    }

    pub fn swap_palette_indices(&mut self, a: u8, b: u8) -> Result<u32, Error> {
        Ok(unsafe {
            bindings::call(
                &SWAP_PALETTE_INDICES,
                vec![self.handle(), Buffer::from(&a).into(), Buffer::from(&b).into()],
            )
        }?
        .u32())
    }

    pub fn channel(&self, channel: ColorChannel) -> Result<Option<Bitmap>, Error> {
        create(&GET_CHANNEL, vec![self.handle(), Value::I32(channel.raw())])
    }

    pub fn set_channel(&mut self, source: &Dib, channel: ColorChannel) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &SET_CHANNEL,
                vec![self.handle(), source.handle(), Value::I32(channel.raw())],
            )
        }?
        .bool())
    }

    pub fn complex_channel(&self, channel: ColorChannel) -> Result<Option<Bitmap>, Error> {
        create(&GET_COMPLEX_CHANNEL, vec![self.handle(), Value::I32(channel.raw())])
    }

    pub fn set_complex_channel(&mut self, source: &Dib, channel: ColorChannel) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &SET_COMPLEX_CHANNEL,
                vec![self.handle(), source.handle(), Value::I32(channel.raw())],
            )
        }?
        .bool())
    }

    /// A new bitmap holding the `left..right` x `top..bottom` region.
    pub fn copy(&self, left: i32, top: i32, right: i32, bottom: i32) -> Result<Option<Bitmap>, Error> {
        create(
            &COPY,
            vec![
                self.handle(),
                Value::I32(left),
                Value::I32(top),
                Value::I32(right),
                Value::I32(bottom),
            ],
        )
    }

    /// Pastes `source` at `(left, top)`; `alpha` above 255 means a plain copy.
    pub fn paste(&mut self, source: &Dib, left: i32, top: i32, alpha: i32) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &PASTE,
                vec![
                    self.handle(),
                    source.handle(),
                    Value::I32(left),
                    Value::I32(top),
                    Value::I32(alpha),
                ],
            )
        }?
        .bool())
    }

    /// A bitmap sharing this one's pixels for the given region. The view
    /// borrows this bitmap, which keeps the shared pixels alive.
    pub fn create_view(&self, left: u32, top: u32, right: u32, bottom: u32) -> Result<Option<View<'_>>, Error> {
        let bitmap = create(
            &CREATE_VIEW,
            vec![
                self.handle(),
                Value::U32(left),
                Value::U32(top),
                Value::U32(right),
                Value::U32(bottom),
            ],
        )?;
        Ok(bitmap.map(|bitmap| View {
            bitmap,
            _parent: PhantomData,
        }))
    }

    /// Blends a 32-bit bitmap over a background: the file background colour
    /// with `use_file_background`, else `app_background`, else `background`,
    /// else a checkerboard.
    pub fn composite(
        &self,
        use_file_background: bool,
        app_background: Option<RgbQuad>,
        background: Option<&Dib>,
    ) -> Result<Option<Bitmap>, Error> {
        create(
            &COMPOSITE,
            vec![
                self.handle(),
                Value::Bool(use_file_background),
                optional(app_background.as_ref().map(Buffer::from)),
                background.map_or_else(Value::null, Dib::handle),
            ],
        )
    }

    pub fn pre_multiply_with_alpha(&mut self) -> Result<bool, Error> {
        Ok(unsafe { bindings::call(&PRE_MULTIPLY_WITH_ALPHA, vec![self.handle()]) }?.bool())
    }

    /// Fills the whole bitmap with `color`, an element of its pixel type.
    /// `options` takes the `COLOR_*` values from [`flags`](crate::flags).
    ///
    /// # Panics
    ///
    /// If `color` is shorter than [`fill_color_len`] for this bitmap.
    pub fn fill_background(&mut self, color: Buffer<'_>, options: i32) -> Result<bool, Error> {
        check_fill_color(&color, self.image_type()?, self.bpp()?);
        Ok(unsafe {
            bindings::call(
                &FILL_BACKGROUND,
                vec![self.handle(), color.into(), Value::I32(options)],
            )
        }?
        .bool())
    }

    /// Grows (positive) or crops (negative) each side, filling new area with
    /// `color`.
    ///
    /// # Panics
    ///
    /// If `color` is shorter than [`fill_color_len`] for this bitmap.
    pub fn enlarge_canvas(
        &self,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        color: Option<Buffer<'_>>,
        options: i32,
    ) -> Result<Option<Bitmap>, Error> {
        if let Some(color) = &color {
            check_fill_color(color, self.image_type()?, self.bpp()?);
        }
        create(
            &ENLARGE_CANVAS,
            vec![
                self.handle(),
                Value::I32(left),
                Value::I32(top),
                Value::I32(right),
                Value::I32(bottom),
                optional(color),
                Value::I32(options),
            ],
        )
    }

    pub fn multigrid_poisson_solver(&self, cycles: i32) -> Result<Option<Bitmap>, Error> {
        create(&MULTIGRID_POISSON_SOLVER, vec![self.handle(), Value::I32(cycles)])
    }
}

/// Builds the 256-entry lookup table [`Dib::adjust_colors`] would apply,
/// together with the number of adjustments it encodes.
pub fn adjust_colors_lookup_table(
    brightness: f64,
    contrast: f64,
    gamma: f64,
    invert: bool,
) -> Result<([u8; 256], i32), Error> {
    let mut lut = [0u8; 256];
    let adjustments = unsafe {
        bindings::call(
            &GET_ADJUST_COLORS_LOOKUP_TABLE,
            vec![
                BufferMut::from(&mut lut[..]).into(),
                Value::F64(brightness),
                Value::F64(contrast),
                Value::F64(gamma),
                Value::Bool(invert),
            ],
        )
    }?
    .i32();
    Ok((lut, adjustments))
}

/// An owned native bitmap. Dropping it unloads the bitmap.
pub struct Bitmap {
    raw: NonNull<Dib>,
    unload: Resolved,
}

// The native bitmap has no thread affinity; `&Dib` is not shared across
// threads because `Dib` is not `Sync`.
unsafe impl Send for Bitmap {}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Bitmap").field(&self.raw).finish()
    }
}

impl Bitmap {
    /// # Safety
    ///
    /// `raw` must be null or a bitmap handle nobody else will unload.
    pub(crate) unsafe fn from_raw(raw: *mut c_void, unload: Resolved) -> Option<Self> {
        NonNull::new(raw as *mut Dib).map(|raw| Bitmap { raw, unload })
    }

    /// Allocates a standard bitmap of `bpp` bits per pixel.
    pub fn allocate(width: i32, height: i32, bpp: i32, masks: ColorMasks) -> Result<Option<Self>, Error> {
        let [red, green, blue] = masks.values();
        create(
            &ALLOCATE,
            vec![Value::I32(width), Value::I32(height), Value::I32(bpp), red, green, blue],
        )
    }

    pub fn allocate_t(
        image_type: ImageType,
        width: i32,
        height: i32,
        bpp: i32,
        masks: ColorMasks,
    ) -> Result<Option<Self>, Error> {
        let [red, green, blue] = masks.values();
        create(
            &ALLOCATE_T,
            vec![
                Value::I32(image_type.raw()),
                Value::I32(width),
                Value::I32(height),
                Value::I32(bpp),
                red,
                green,
                blue,
            ],
        )
    }

    /// Allocates and fills with `color`, optionally copying in a palette.
    pub fn allocate_ex(
        width: i32,
        height: i32,
        bpp: i32,
        color: Option<RgbQuad>,
        options: i32,
        palette: &[RgbQuad],
        masks: ColorMasks,
    ) -> Result<Option<Self>, Error> {
        let [red, green, blue] = masks.values();
        let palette_arg = if palette.is_empty() {
            Value::null()
        } else {
            Buffer::from(palette).into()
        };
        create(
            &ALLOCATE_EX,
            vec![
                Value::I32(width),
                Value::I32(height),
                Value::I32(bpp),
                optional(color.as_ref().map(Buffer::from)),
                Value::I32(options),
                palette_arg,
                red,
                green,
                blue,
            ],
        )
    }

    /// Like [`Bitmap::allocate_ex`] for any image type; `color` is one
    /// element of that type's pixel.
    ///
    /// # Panics
    ///
    /// If `color` is shorter than [`fill_color_len`] for `image_type`.
    #[allow(clippy::too_many_arguments)]
    pub fn allocate_ex_t(
        image_type: ImageType,
        width: i32,
        height: i32,
        bpp: i32,
        color: Option<Buffer<'_>>,
        options: i32,
        palette: &[RgbQuad],
        masks: ColorMasks,
    ) -> Result<Option<Self>, Error> {
        if let Some(color) = &color {
            check_fill_color(color, image_type, bpp.max(0) as u32);
        }
        let [red, green, blue] = masks.values();
        let palette_arg = if palette.is_empty() {
            Value::null()
        } else {
            Buffer::from(palette).into()
        };
        create(
            &ALLOCATE_EX_T,
            vec![
                Value::I32(image_type.raw()),
                Value::I32(width),
                Value::I32(height),
                Value::I32(bpp),
                optional(color),
                Value::I32(options),
                palette_arg,
                red,
                green,
                blue,
            ],
        )
    }

    /// Loads `path` as `format`. `None` when the native loader fails.
    pub fn load(format: ImageFormat, path: impl AsRef<Path>, flags: i32) -> Result<Option<Self>, Error> {
        let path = path.as_ref().to_string_lossy();
        create(
            &LOAD,
            vec![Value::I32(format.0), Value::Str(&path), Value::I32(flags)],
        )
    }

    /// Builds a standard bitmap from raw scan lines `pitch` bytes apart.
    ///
    /// # Panics
    ///
    /// If `pitch` is shorter than one `bpp`-bit scan line of `width` pixels,
    /// or `bits` cannot hold `height` lines at that pitch.
    pub fn from_raw_bits(
        bits: &[u8],
        width: i32,
        height: i32,
        pitch: i32,
        bpp: u32,
        masks: ColorMasks,
        top_down: bool,
    ) -> Result<Option<Self>, Error> {
        check_raw_layout(bits.len(), dimension(width), dimension(height), pitch, bpp);
        let [red, green, blue] = masks.values();
        create(
            &CONVERT_FROM_RAW_BITS,
            vec![
                Buffer::from(bits).into(),
                Value::I32(width),
                Value::I32(height),
                Value::I32(pitch),
                Value::U32(bpp),
                red,
                green,
                blue,
                Value::Bool(top_down),
            ],
        )
    }

    /// Like [`Bitmap::from_raw_bits`] for any image type. The pixels are
    /// always copied, so the new bitmap does not borrow `bits`.
    ///
    /// # Panics
    ///
    /// If `pitch` is shorter than one `bpp`-bit scan line of `width` pixels,
    /// or `bits` cannot hold `height` lines at that pitch.
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw_bits_ex(
        image_type: ImageType,
        bits: &[u8],
        width: i32,
        height: i32,
        pitch: i32,
        bpp: u32,
        masks: ColorMasks,
        top_down: bool,
    ) -> Result<Option<Self>, Error> {
        check_raw_layout(bits.len(), dimension(width), dimension(height), pitch, bpp);
        let [red, green, blue] = masks.values();
        create(
            &CONVERT_FROM_RAW_BITS_EX,
            vec![
                Value::Bool(true),
                Buffer::from(bits).into(),
                Value::I32(image_type.raw()),
                Value::I32(width),
                Value::I32(height),
                Value::I32(pitch),
                Value::U32(bpp),
                red,
                green,
                blue,
                Value::Bool(top_down),
            ],
        )
    }

    /// Unloads the bitmap now rather than at the end of scope.
    pub fn unload(self) {
        drop(self)
    }
}

/// Bytes the native side reads from a fill or background colour: an
/// [`RgbQuad`] for standard bitmaps, one whole pixel for every other type.
pub fn fill_color_len(image_type: ImageType, bpp: u32) -> usize {
    match image_type {
        ImageType::Bitmap => size_of::<RgbQuad>(),
        ImageType::Uint16 | ImageType::Int16 => 2,
        ImageType::Uint32 | ImageType::Int32 | ImageType::Float => 4,
        ImageType::Rgb16 => 6,
        ImageType::Double | ImageType::Rgba16 => 8,
        ImageType::Rgbf => 12,
        ImageType::Complex | ImageType::Rgbaf => 16,
        ImageType::Unknown => (bpp as usize).div_ceil(8),
    }
}

fn check_fill_color(color: &Buffer<'_>, image_type: ImageType, bpp: u32) {
    let needed = fill_color_len(image_type, bpp);
    assert!(
        color.byte_len() >= needed,
        "fill colour holds {} bytes, {needed} needed for {image_type:?}",
        color.byte_len()
    );
}

/// A non-positive dimension allocates nothing, so nothing is copied.
fn dimension(value: i32) -> u64 {
    value.max(0) as u64
}

/// Checks that `len` bytes hold `height` scan lines of `width` pixels at
/// `bpp` bits each, `pitch` bytes apart. The native copy moves one whole
/// line per row starting at `row * pitch`.
fn check_raw_layout(len: usize, width: u64, height: u64, pitch: i32, bpp: u32) {
    if width == 0 || height == 0 {
        return;
    }
    let line = (width * u64::from(bpp)).div_ceil(8);
    assert!(
        pitch >= 0 && pitch as u64 >= line,
        "raw bits pitch {pitch} is shorter than a {line}-byte scan line"
    );
    let needed = pitch as u64 * (height - 1) + line;
    assert!(
        len as u64 >= needed,
        "raw bits buffer holds {len} bytes, {needed} needed"
    );
}

impl Deref for Bitmap {
    type Target = Dib;

    fn deref(&self) -> &Dib {
        unsafe { self.raw.as_ref() }
    }
}

impl DerefMut for Bitmap {
    fn deref_mut(&mut self) -> &mut Dib {
        unsafe { self.raw.as_mut() }
    }
}

impl Drop for Bitmap {
    fn drop(&mut self) {
        unsafe { self.unload.call(vec![self.handle()]) }.void();
    }
}

/// A bitmap sharing pixels with the bitmap it was created from.
///
/// Read-only: writes through the view would alias the parent's pixels.
#[derive(Debug)]
pub struct View<'a> {
    bitmap: Bitmap,
    _parent: PhantomData<&'a Dib>,
}

impl Deref for View<'_> {
    type Target = Dib;

    fn deref(&self) -> &Dib {
        &self.bitmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_bitmap_is_zero_sized() {
        assert_eq!(std::mem::size_of::<Dib>(), 0);
        assert_eq!(std::mem::align_of::<Dib>(), 1);
    }

    #[test]
    fn rgba_masks_cover_three_distinct_bytes() {
        let ColorMasks { red, green, blue } = ColorMasks::RGBA;
        assert_eq!(red.count_ones(), 8);
        assert_eq!(red & green, 0);
        assert_eq!(green & blue, 0);
        assert_eq!((red | green | blue).count_ones(), 24);
    }

    #[test]
    #[should_panic(expected = "raw bits buffer")]
    fn short_raw_buffer_is_rejected() {
        check_raw_layout(10, 1, 4, 4, 32);
    }

    #[test]
    #[should_panic(expected = "raw bits pitch 4 is shorter than a 192-byte scan line")]
    fn pitch_shorter_than_a_line_is_rejected() {
        check_raw_layout(4, 64, 1, 4, 24);
    }

    #[test]
    #[should_panic(expected = "raw bits pitch")]
    fn negative_pitch_is_rejected() {
        check_raw_layout(1024, 4, 4, -16, 32);
    }

    #[test]
    fn last_line_needs_no_padding() {
        // Three 3-pixel 24-bit lines at pitch 12: 12 + 12 + 9 bytes.
        check_raw_layout(33, 3, 3, 12, 24);
        check_raw_layout(0, 0, 8, 0, 24);
        check_raw_layout(0, 8, 0, 32, 32);
    }

    #[test]
    fn fill_color_covers_a_whole_pixel() {
        assert_eq!(fill_color_len(ImageType::Bitmap, 8), 4);
        assert_eq!(fill_color_len(ImageType::Bitmap, 32), 4);
        assert_eq!(fill_color_len(ImageType::Rgbf, 96), 12);
        assert_eq!(fill_color_len(ImageType::Complex, 128), 16);
        assert_eq!(fill_color_len(ImageType::Unknown, 24), 3);

        let pixel = [0.5f32; 3];
        check_fill_color(&Buffer::from(&pixel[..]), ImageType::Rgbf, 96);
    }

    #[test]
    #[should_panic(expected = "fill colour holds 1 bytes, 12 needed for Rgbf")]
    fn short_fill_color_is_rejected_before_allocating() {
        let _ = Bitmap::allocate_ex_t(
            ImageType::Rgbf,
            4,
            4,
            96,
            Some(Buffer::from(&[0u8][..])),
            0,
            &[],
            ColorMasks::NONE,
        );
    }

    #[test]
    #[should_panic(expected = "raw bits pitch")]
    fn import_checks_pitch_before_calling_out() {
        let backing = [0u8; 256];
        let _ = Bitmap::from_raw_bits(&backing[..4], 64, 1, 4, 24, ColorMasks::NONE, false);
    }
}
