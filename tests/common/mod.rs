#![allow(dead_code)]

use std::sync::OnceLock;

use freeimage_rs::{Config, NativeLibrary, init_with};

/// Loads the image library for this test binary, or reports why the tests
/// that need it are skipped.
pub fn freeimage_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        let config = Config::from_env().expect("Invalid FREEIMAGE_* configuration");
        match NativeLibrary::open(&config.library_path, config.mode) {
            Ok(library) => {
                init_with(library);
                true
            }
            Err(e) => {
                eprintln!("skipping FreeImage tests: {e}");
                false
            }
        }
    })
}

