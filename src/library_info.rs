//! Library-wide calls: version strings, explicit initialisation, colour
//! name lookup and native diagnostic messages.

use std::ffi::{CStr, c_char, c_void};

use crate::{
    Config, Error, Value,
    bindings::{self, *},
};

/// The library version, e.g. `"3.18.0"`. The string is owned by the library.
pub fn version() -> Result<Option<String>, Error> {
    Ok(unsafe { bindings::call(&GET_VERSION, vec![]) }?.string())
}

pub fn copyright() -> Result<Option<String>, Error> {
    Ok(unsafe { bindings::call(&GET_COPYRIGHT_MESSAGE, vec![]) }?.string())
}

/// Registers the plugins. Only needed when the library is linked
/// statically; a dynamically loaded library initialises itself on load.
pub fn initialise(load_local_plugins_only: bool) -> Result<(), Error> {
    unsafe { bindings::call(&INITIALISE, vec![Value::Bool(load_local_plugins_only)]) }?.void();
    Ok(())
}

pub fn initialise_from(config: &Config) -> Result<(), Error> {
    initialise(config.load_local_plugins_only)
}

/// Undoes [`initialise`].
pub fn deinitialise() -> Result<(), Error> {
    unsafe { bindings::call(&DEINITIALISE, vec![]) }?.void();
    Ok(())
}

pub fn is_little_endian() -> Result<bool, Error> {
    Ok(unsafe { bindings::call(&IS_LITTLE_ENDIAN, vec![]) }?.bool())
}

fn lookup_color(prototype: &'static crate::Prototype, name: &str) -> Result<Option<[u8; 3]>, Error> {
    let (mut red, mut green, mut blue) = (0u8, 0u8, 0u8);
    let found = unsafe {
        bindings::call(
            prototype,
            vec![
                Value::Str(name),
                Value::out(&mut red),
                Value::out(&mut green),
                Value::out(&mut blue),
            ],
        )
    }?
    .bool();
    Ok(found.then_some([red, green, blue]))
}

/// Red, green and blue of an X11 colour name such as `"papayawhip"`.
pub fn lookup_x11_color(name: &str) -> Result<Option<[u8; 3]>, Error> {
    lookup_color(&LOOKUP_X11_COLOR, name)
}

/// Red, green and blue of an SVG colour name.
pub fn lookup_svg_color(name: &str) -> Result<Option<[u8; 3]>, Error> {
    lookup_color(&LOOKUP_SVG_COLOR, name)
}

extern "C" fn forward_message(format: i32, message: *const c_char) {
    if message.is_null() {
        return;
    }
    let message = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    tracing::warn!(target: "freeimage", format, "{message}");
}

/// Sends the library's diagnostic messages (decoder warnings, plugin
/// errors) to `tracing` at `warn` level under the `freeimage` target.
pub fn route_messages_to_tracing() -> Result<(), Error> {
    let callback = forward_message as extern "C" fn(i32, *const c_char);
    unsafe { bindings::call(&SET_OUTPUT_MESSAGE, vec![Value::Pointer(callback as *mut c_void)]) }?
        .void();
    tracing::debug!("routing native messages to tracing");
    Ok(())
}

/// Stops forwarding diagnostic messages.
pub fn silence_messages() -> Result<(), Error> {
    unsafe { bindings::call(&SET_OUTPUT_MESSAGE, vec![Value::null()]) }?.void();
    Ok(())
}
