//! Lossless JPEG transformations: the DCT blocks are rearranged without
//! decoding, so repeated transforms do not degrade the image.

use std::path::Path;

use crate::{
    Error, JpegOperation, MemoryStream, Stream, Value,
    bindings::{self, *},
};

/// A crop rectangle in pixels, right and bottom exclusive.
///
/// The combined transforms snap it to the JPEG block grid and write the
/// adjusted rectangle back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CropRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        CropRect { left, top, right, bottom }
    }

    fn values(rect: Option<&mut CropRect>) -> [Value<'static>; 4] {
        match rect {
            Some(rect) => [
                Value::out(&mut rect.left),
                Value::out(&mut rect.top),
                Value::out(&mut rect.right),
                Value::out(&mut rect.bottom),
            ],
            None => [Value::null(), Value::null(), Value::null(), Value::null()],
        }
    }
}

fn path_str(path: &Path) -> std::borrow::Cow<'_, str> {
    path.to_string_lossy()
}

/// Applies `operation` to the JPEG file `src` and writes `dst`.
///
/// With `perfect`, the call fails instead of trimming partial edge blocks.
pub fn transform(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    operation: JpegOperation,
    perfect: bool,
) -> Result<bool, Error> {
    let (src, dst) = (path_str(src.as_ref()), path_str(dst.as_ref()));
    Ok(unsafe {
        bindings::call(
            &JPEG_TRANSFORM,
            vec![
                Value::Str(&src),
                Value::Str(&dst),
                Value::I32(operation.raw()),
                Value::Bool(perfect),
            ],
        )
    }?
    .bool())
}

/// Crops the JPEG file `src` to `rect` and writes `dst`.
pub fn crop(src: impl AsRef<Path>, dst: impl AsRef<Path>, rect: CropRect) -> Result<bool, Error> {
    let (src, dst) = (path_str(src.as_ref()), path_str(dst.as_ref()));
    Ok(unsafe {
        bindings::call(
            &JPEG_CROP,
            vec![
                Value::Str(&src),
                Value::Str(&dst),
                Value::I32(rect.left),
                Value::I32(rect.top),
                Value::I32(rect.right),
                Value::I32(rect.bottom),
            ],
        )
    }?
    .bool())
}

/// Transform and crop in one pass over the file `src`.
pub fn transform_combined(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    operation: JpegOperation,
    rect: Option<&mut CropRect>,
    perfect: bool,
) -> Result<bool, Error> {
    let (src, dst) = (path_str(src.as_ref()), path_str(dst.as_ref()));
    let [left, top, right, bottom] = CropRect::values(rect);
    Ok(unsafe {
        bindings::call(
            &JPEG_TRANSFORM_COMBINED,
            vec![
                Value::Str(&src),
                Value::Str(&dst),
                Value::I32(operation.raw()),
                left,
                top,
                right,
                bottom,
                Value::Bool(perfect),
            ],
        )
    }?
    .bool())
}

/// Transform and crop the JPEG bytes in `src`, writing the result at
/// `dst`'s cursor.
pub fn transform_combined_from_memory(
    src: &mut Stream,
    dst: &mut MemoryStream,
    operation: JpegOperation,
    rect: Option<&mut CropRect>,
    perfect: bool,
) -> Result<bool, Error> {
    let [left, top, right, bottom] = CropRect::values(rect);
    Ok(unsafe {
        bindings::call(
            &JPEG_TRANSFORM_COMBINED_FROM_MEMORY,
            vec![
                src.handle(),
                dst.handle(),
                Value::I32(operation.raw()),
                left,
                top,
                right,
                bottom,
                Value::Bool(perfect),
            ],
        )
    }?
    .bool())
}
