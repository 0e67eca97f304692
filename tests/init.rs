//! Process-wide initialisation, in its own binary so the C runtime can be
//! installed as the library before anything else loads one.
#![cfg(target_os = "linux")]

use std::path::Path;

use freeimage_rs::{
    Config, LoadMode, NativeLibrary, init, init_from_config, init_with, is_initialized, library,
};

const LIBC: &str = "libc.so.6";

// One test: the library slot is shared by the whole binary.
#[test]
fn test_reinit_is_ignored_once_loaded() {
    assert!(!is_initialized());

    let libc = NativeLibrary::open(LIBC, LoadMode::Now).expect("Failed to load the C runtime");
    let installed = init_with(libc);
    assert_eq!(installed.path(), Path::new(LIBC));
    assert!(is_initialized());

    let again = init("/nonexistent/libfreeimage.so", LoadMode::Lazy);
    assert!(std::ptr::eq(again, installed));
    assert_eq!(again.mode(), LoadMode::Now);

    let config = Config {
        library_path: "/nonexistent/libfreeimage.so".into(),
        ..Config::default()
    };
    assert!(std::ptr::eq(init_from_config(&config), installed));

    let other = NativeLibrary::open(LIBC, LoadMode::Lazy).expect("Failed to load the C runtime");
    assert!(std::ptr::eq(init_with(other), installed));
    assert!(std::ptr::eq(library(), installed));
}
