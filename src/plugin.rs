//! Queries against the native format plugin registry.

use std::path::Path;

use crate::{
    Error, ImageFormat, ImageType, Value,
    bindings::{self, *},
};

/// Number of registered format plugins. Identifiers run `0..count`.
pub fn plugin_count() -> Result<i32, Error> {
    Ok(unsafe { bindings::call(&GET_FIF_COUNT, vec![]) }?.i32())
}

/// Every registered format, built-in and runtime-registered.
pub fn formats() -> Result<Vec<ImageFormat>, Error> {
    Ok((0..plugin_count()?.max(0)).map(ImageFormat).collect())
}

/// Identifies the format of the file at `path` from its signature.
pub fn file_type(path: impl AsRef<Path>) -> Result<ImageFormat, Error> {
    let path = path.as_ref().to_string_lossy();
    Ok(ImageFormat(
        unsafe { bindings::call(&GET_FILE_TYPE, vec![Value::Str(&path), Value::I32(0)]) }?.i32(),
    ))
}

/// Whether the file at `path` carries `format`'s signature.
pub fn validate(format: ImageFormat, path: impl AsRef<Path>) -> Result<bool, Error> {
    let path = path.as_ref().to_string_lossy();
    Ok(unsafe { bindings::call(&VALIDATE, vec![Value::I32(format.0), Value::Str(&path)]) }?.bool())
}

/// The format of `path`, from its signature or else its extension.
pub fn detect(path: impl AsRef<Path>) -> Result<ImageFormat, Error> {
    let path = path.as_ref();
    let format = file_type(path)?;
    if format.is_known() {
        return Ok(format);
    }
    ImageFormat::from_filename(path)
}

fn tri_state(value: i32) -> Option<bool> {
    match value {
        v if v < 0 => None,
        v => Some(v != 0),
    }
}

impl ImageFormat {
    /// Looks a format up by its short name, e.g. `"PNG"`.
    pub fn from_format(name: &str) -> Result<Self, Error> {
        Ok(ImageFormat(
            unsafe { bindings::call(&GET_FIF_FROM_FORMAT, vec![Value::Str(name)]) }?.i32(),
        ))
    }

    pub fn from_mime(mime: &str) -> Result<Self, Error> {
        Ok(ImageFormat(
            unsafe { bindings::call(&GET_FIF_FROM_MIME, vec![Value::Str(mime)]) }?.i32(),
        ))
    }

    /// Guesses the format from the file name's extension.
    pub fn from_filename(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_string_lossy();
        Ok(ImageFormat(
            unsafe { bindings::call(&GET_FIF_FROM_FILENAME, vec![Value::Str(&path)]) }?.i32(),
        ))
    }

    fn string(self, prototype: &'static crate::Prototype) -> Result<Option<String>, Error> {
        Ok(unsafe { bindings::call(prototype, vec![Value::I32(self.0)]) }?.string())
    }

    fn flag(self, prototype: &'static crate::Prototype) -> Result<bool, Error> {
        Ok(unsafe { bindings::call(prototype, vec![Value::I32(self.0)]) }?.bool())
    }

    /// The short name, e.g. `"PNG"`.
    pub fn name(self) -> Result<Option<String>, Error> {
        self.string(&GET_FORMAT_FROM_FIF)
    }

    /// Comma-separated file extensions, most common first.
    pub fn extensions(self) -> Result<Option<String>, Error> {
        self.string(&GET_FIF_EXTENSION_LIST)
    }

    pub fn description(self) -> Result<Option<String>, Error> {
        self.string(&GET_FIF_DESCRIPTION)
    }

    pub fn mime_type(self) -> Result<Option<String>, Error> {
        self.string(&GET_FIF_MIME_TYPE)
    }

    /// `None` when no plugin has this identifier.
    pub fn is_enabled(self) -> Result<Option<bool>, Error> {
        Ok(tri_state(
            unsafe { bindings::call(&IS_PLUGIN_ENABLED, vec![Value::I32(self.0)]) }?.i32(),
        ))
    }

    /// Enables or disables the plugin and returns its previous state;
    /// `None` when no plugin has this identifier.
    pub fn set_enabled(self, enabled: bool) -> Result<Option<bool>, Error> {
        Ok(tri_state(
            unsafe {
                bindings::call(&SET_PLUGIN_ENABLED, vec![Value::I32(self.0), Value::Bool(enabled)])
            }?
            .i32(),
        ))
    }

    pub fn supports_reading(self) -> Result<bool, Error> {
        self.flag(&FIF_SUPPORTS_READING)
    }

    pub fn supports_writing(self) -> Result<bool, Error> {
        self.flag(&FIF_SUPPORTS_WRITING)
    }

    pub fn supports_icc_profiles(self) -> Result<bool, Error> {
        self.flag(&FIF_SUPPORTS_ICC_PROFILES)
    }

    /// Whether header-only loading with `LOAD_NOPIXELS` is supported.
    pub fn supports_no_pixels(self) -> Result<bool, Error> {
        self.flag(&FIF_SUPPORTS_NO_PIXELS)
    }

    pub fn supports_export_bpp(self, bpp: i32) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(&FIF_SUPPORTS_EXPORT_BPP, vec![Value::I32(self.0), Value::I32(bpp)])
        }?
        .bool())
    }

    pub fn supports_export_type(self, image_type: ImageType) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &FIF_SUPPORTS_EXPORT_TYPE,
                vec![Value::I32(self.0), Value::I32(image_type.raw())],
            )
        }?
        .bool())
    }
}
