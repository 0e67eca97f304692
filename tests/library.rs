mod common;

use freeimage_rs::{
    Error, ImageFormat, ImageType, LoadMode, PROTOTYPES, init, library, library_info, plugin, zlib,
};

#[test]
fn test_version_and_identity() {
    if !common::freeimage_available() {
        return;
    }

    let version = library_info::version().unwrap().expect("Missing version");
    assert!(version.starts_with('3'), "unexpected version {version}");
    assert!(library_info::copyright().unwrap().is_some());
    assert_eq!(
        library_info::is_little_endian().unwrap(),
        cfg!(target_endian = "little")
    );
}

#[test]
fn test_reinit_keeps_the_loaded_library() {
    if !common::freeimage_available() {
        return;
    }

    let loaded = library().path().to_path_buf();
    let again = init("/nonexistent/libfreeimage.so", LoadMode::Now);
    assert_eq!(again.path(), loaded);
}

#[test]
fn test_core_symbols_resolve() {
    if !common::freeimage_available() {
        return;
    }

    let missing: Vec<&str> = PROTOTYPES
        .iter()
        .filter(|prototype| matches!(library().resolve(prototype), Err(Error::SymbolNotFound(_))))
        .map(|prototype| prototype.name)
        .collect();
    for name in [
        "FreeImage_Allocate",
        "FreeImage_Unload",
        "FreeImage_OpenMemory",
        "FreeImage_OpenMultiBitmap",
        "FreeImage_FindFirstMetadata",
    ] {
        assert!(!missing.contains(&name), "{name} did not resolve");
    }
}

#[test]
fn test_plugin_registry() {
    if !common::freeimage_available() {
        return;
    }

    assert!(plugin::plugin_count().unwrap() > ImageFormat::TIFF.0);
    assert!(plugin::formats().unwrap().contains(&ImageFormat::PNG));

    assert_eq!(ImageFormat::from_format("PNG").unwrap(), ImageFormat::PNG);
    assert_eq!(ImageFormat::from_mime("image/png").unwrap(), ImageFormat::PNG);
    assert_eq!(ImageFormat::from_filename("photo.JPG").unwrap(), ImageFormat::JPEG);
    assert_eq!(ImageFormat::from_filename("notes.txt").unwrap(), ImageFormat::UNKNOWN);

    let png = ImageFormat::PNG;
    assert_eq!(png.name().unwrap().as_deref(), Some("PNG"));
    assert!(png.extensions().unwrap().unwrap().contains("png"));
    assert_eq!(png.mime_type().unwrap().as_deref(), Some("image/png"));
    assert_eq!(png.is_enabled().unwrap(), Some(true));
    assert!(png.supports_reading().unwrap());
    assert!(png.supports_writing().unwrap());
    assert!(png.supports_export_bpp(24).unwrap());
    assert!(png.supports_export_type(ImageType::Bitmap).unwrap());

    assert_eq!(ImageFormat(9999).is_enabled().unwrap(), None);
}

#[test]
fn test_detect_falls_back_to_extension() {
    if !common::freeimage_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.tif");
    std::fs::write(&path, b"").unwrap();

    assert_eq!(plugin::file_type(&path).unwrap(), ImageFormat::UNKNOWN);
    assert_eq!(plugin::detect(&path).unwrap(), ImageFormat::TIFF);
}

#[test]
fn test_color_names() {
    if !common::freeimage_available() {
        return;
    }

    assert_eq!(library_info::lookup_x11_color("red").unwrap(), Some([255, 0, 0]));
    assert_eq!(library_info::lookup_svg_color("white").unwrap(), Some([255, 255, 255]));
    assert_eq!(library_info::lookup_x11_color("not-a-colour").unwrap(), None);
}

#[test]
fn test_message_routing_can_be_toggled() {
    if !common::freeimage_available() {
        return;
    }

    library_info::route_messages_to_tracing().unwrap();
    let _ = freeimage_rs::Bitmap::load(ImageFormat::PNG, "/nonexistent/missing.png", 0).unwrap();
    library_info::silence_messages().unwrap();
}

#[test]
fn test_zlib_round_trips() {
    if !common::freeimage_available() {
        return;
    }

    let data: Vec<u8> = b"freeimage ".iter().copied().cycle().take(4096).collect();

    let compressed = zlib::compress(&data).unwrap().expect("Compression failed");
    assert!(compressed.len() < data.len());
    assert!(compressed.len() <= zlib::compress_bound(data.len()));
    let restored = zlib::uncompress(&compressed, data.len()).unwrap().unwrap();
    assert_eq!(restored, data);

    let gzipped = zlib::gzip(&data).unwrap().expect("Gzip failed");
    assert_eq!(&gzipped[..2], &[0x1f, 0x8b]);
    let gunzipped = zlib::gunzip(&gzipped, data.len()).unwrap().unwrap();
    assert_eq!(gunzipped, data);

    let mut small = [0u8; 4];
    assert_eq!(zlib::compress_into(&mut small, &data).unwrap(), 0);
}

#[test]
fn test_zlib_accepts_empty_input() {
    if !common::freeimage_available() {
        return;
    }

    let compressed = zlib::compress(&[]).unwrap().expect("Empty input should compress");
    assert!(!compressed.is_empty());
    assert!(compressed.len() <= zlib::compress_bound(0));

    let gzipped = zlib::gzip(&[]).unwrap().expect("Empty input should gzip");
    assert_eq!(&gzipped[..2], &[0x1f, 0x8b]);

    let mut target = [0u8; 32];
    assert_eq!(zlib::compress_into(&mut target, &[]).unwrap(), compressed.len());
    assert_eq!(&target[..compressed.len()], &compressed[..]);
}

#[test]
fn test_crc32() {
    if !common::freeimage_available() {
        return;
    }

    assert_eq!(zlib::crc32(0, b"123456789").unwrap(), 0xCBF4_3926);
    assert_eq!(zlib::crc32(7, b"").unwrap(), 7);

    let whole = zlib::crc32(0, b"hello world").unwrap();
    let first = zlib::crc32(0, b"hello ").unwrap();
    assert_eq!(zlib::crc32(first, b"world").unwrap(), whole);
}
