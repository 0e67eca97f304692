mod common;

use std::panic::{AssertUnwindSafe, catch_unwind};

use freeimage_rs::{
    Bitmap, Buffer, ColorChannel, ColorMasks, ColorType, Filter, ImageFormat, ImageType, RgbQuad,
};
use image::RgbaImage;

fn red() -> RgbQuad {
    RgbQuad::new(255, 0, 0, 0)
}

#[test]
fn test_allocate_and_inspect() {
    if !common::freeimage_available() {
        return;
    }

    let bitmap = Bitmap::allocate(4, 4, 24, ColorMasks::NONE)
        .unwrap()
        .expect("Failed to allocate bitmap");
    assert_eq!(bitmap.width().unwrap(), 4);
    assert_eq!(bitmap.height().unwrap(), 4);
    assert_eq!(bitmap.bpp().unwrap(), 24);
    assert_eq!(bitmap.line().unwrap(), 12);
    assert_eq!(bitmap.pitch().unwrap() % 4, 0);
    assert!(bitmap.has_pixels().unwrap());
    assert_eq!(bitmap.image_type().unwrap(), ImageType::Bitmap);

    let header = bitmap.info_header().unwrap().expect("Missing info header");
    assert_eq!(header.width, 4);
    assert_eq!(header.height, 4);
    assert_eq!(header.bit_count, 24);

    let bits = bitmap.bits().unwrap().expect("Missing pixel data");
    assert_eq!(bits.len(), bitmap.pitch().unwrap() as usize * 4);
}

#[test]
fn test_pixel_color_round_trip() {
    if !common::freeimage_available() {
        return;
    }

    let mut bitmap = Bitmap::allocate(4, 4, 24, ColorMasks::NONE).unwrap().unwrap();
    assert!(bitmap.set_pixel_color(1, 1, red()).unwrap());

    let color = bitmap.pixel_color(1, 1).unwrap().expect("Failed to read pixel");
    assert_eq!((color.red(), color.green(), color.blue()), (255, 0, 0));

    let untouched = bitmap.pixel_color(0, 0).unwrap().unwrap();
    assert_eq!((untouched.red(), untouched.green(), untouched.blue()), (0, 0, 0));

    assert!(bitmap.pixel_color(10, 10).unwrap().is_none());
}

#[test]
fn test_palette_and_indices() {
    if !common::freeimage_available() {
        return;
    }

    let mut bitmap = Bitmap::allocate(8, 8, 8, ColorMasks::NONE).unwrap().unwrap();
    assert_eq!(bitmap.colors_used().unwrap(), 256);

    let palette = bitmap.palette_mut().unwrap().expect("Missing palette");
    assert_eq!(palette.len(), 256);
    palette[7] = RgbQuad::new(10, 20, 30, 0);

    assert!(bitmap.set_pixel_index(2, 3, 7).unwrap());
    assert_eq!(bitmap.pixel_index(2, 3).unwrap(), Some(7));
    assert_eq!(bitmap.palette().unwrap().unwrap()[7].green(), 20);
    assert!(bitmap.pixel_color(2, 3).unwrap().is_none());
}

#[test]
fn test_scan_lines_are_bounds_checked() {
    if !common::freeimage_available() {
        return;
    }

    let mut bitmap = Bitmap::allocate(5, 3, 32, ColorMasks::NONE).unwrap().unwrap();
    let line = bitmap.scan_line_mut(2).unwrap().expect("Missing scan line");
    assert_eq!(line.len(), 20);
    line.fill(0xAB);

    assert_eq!(bitmap.scan_line(2).unwrap().unwrap()[19], 0xAB);
    assert!(bitmap.scan_line(3).unwrap().is_none());
}

#[test]
fn test_clone_is_independent() {
    if !common::freeimage_available() {
        return;
    }

    let mut original = Bitmap::allocate(4, 4, 24, ColorMasks::NONE).unwrap().unwrap();
    let copy = original.try_clone().unwrap().expect("Failed to clone");
    original.set_pixel_color(0, 0, red()).unwrap();

    assert_eq!(original.pixel_color(0, 0).unwrap().unwrap().red(), 255);
    assert_eq!(copy.pixel_color(0, 0).unwrap().unwrap().red(), 0);
    assert_ne!(original.as_ptr(), copy.as_ptr());
}

#[test]
fn test_conversions_produce_new_bitmaps() {
    if !common::freeimage_available() {
        return;
    }

    let mut bitmap = Bitmap::allocate(16, 16, 24, ColorMasks::NONE).unwrap().unwrap();
    bitmap.set_pixel_color(3, 3, red()).unwrap();

    let rgba = bitmap.convert_to_32_bits().unwrap().expect("32-bit conversion failed");
    assert_eq!(rgba.bpp().unwrap(), 32);
    assert_eq!(bitmap.bpp().unwrap(), 24);

    let grey = bitmap.convert_to_greyscale().unwrap().expect("Greyscale conversion failed");
    assert_eq!(grey.bpp().unwrap(), 8);
    assert_eq!(grey.color_type().unwrap(), ColorType::MinIsBlack);

    let float = bitmap.convert_to_rgbf().unwrap().expect("RGBF conversion failed");
    assert_eq!(float.image_type().unwrap(), ImageType::Rgbf);
    let back = float
        .convert_to_standard_type(true)
        .unwrap()
        .expect("Standard type conversion failed");
    assert_eq!(back.image_type().unwrap(), ImageType::Bitmap);

    let half = bitmap.rescale(8, 8, Filter::Bilinear).unwrap().unwrap();
    assert_eq!((half.width().unwrap(), half.height().unwrap()), (8, 8));

    let thumbnail = bitmap.make_thumbnail(4, true).unwrap().unwrap();
    assert!(thumbnail.width().unwrap() <= 4);
}

#[test]
fn test_copy_paste_and_view() {
    if !common::freeimage_available() {
        return;
    }

    let mut canvas = Bitmap::allocate(8, 8, 24, ColorMasks::NONE).unwrap().unwrap();
    let mut patch = Bitmap::allocate(2, 2, 24, ColorMasks::NONE).unwrap().unwrap();
    for (x, y) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        patch.set_pixel_color(x, y, red()).unwrap();
    }

    assert!(canvas.paste(&patch, 4, 4, 256).unwrap());
    let region = canvas.copy(4, 4, 6, 6).unwrap().expect("Copy failed");
    assert_eq!(region.width().unwrap(), 2);

    let view = canvas.create_view(0, 0, 4, 4).unwrap().expect("View failed");
    assert_eq!(view.width().unwrap(), 4);
    assert_eq!(view.height().unwrap(), 4);
}

#[test]
fn test_adjustments_and_histogram() {
    if !common::freeimage_available() {
        return;
    }

    let mut bitmap = Bitmap::allocate(4, 4, 8, ColorMasks::NONE).unwrap().unwrap();
    let palette = bitmap.palette_mut().unwrap().unwrap();
    for (i, entry) in palette.iter_mut().enumerate() {
        *entry = RgbQuad::new(i as u8, i as u8, i as u8, 0);
    }

    let histogram = bitmap
        .histogram(ColorChannel::Black)
        .unwrap()
        .expect("Histogram failed");
    assert_eq!(histogram[0], 16);
    assert_eq!(histogram.iter().sum::<u32>(), 16);

    assert!(bitmap.invert().unwrap());
    let histogram = bitmap.histogram(ColorChannel::Black).unwrap().unwrap();
    assert_eq!(histogram[255], 16);
}

#[test]
fn test_rgba_image_interop() {
    if !common::freeimage_available() {
        return;
    }

    let image = RgbaImage::from_fn(3, 2, |x, y| image::Rgba([x as u8 * 80, y as u8 * 100, 7, 255]));
    let bitmap = Bitmap::from_rgba_image(&image).unwrap().expect("Import failed");
    assert_eq!(bitmap.bpp().unwrap(), 32);

    // Row 0 of the image is the top row, which is the last scan line.
    let top_right = bitmap.pixel_color(2, 1).unwrap().unwrap();
    assert_eq!((top_right.red(), top_right.green(), top_right.blue()), (160, 0, 7));

    let exported = bitmap.to_rgba_image().unwrap().expect("Export failed");
    assert_eq!(exported, image);
}

#[test]
fn test_save_and_load_file() {
    if !common::freeimage_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixel.png");

    let mut bitmap = Bitmap::allocate(4, 4, 24, ColorMasks::NONE).unwrap().unwrap();
    bitmap.set_pixel_color(1, 2, red()).unwrap();
    assert!(bitmap.save(ImageFormat::PNG, &path, 0).unwrap());

    let loaded = Bitmap::load(ImageFormat::PNG, &path, 0)
        .unwrap()
        .expect("Failed to load saved file");
    assert_eq!(loaded.width().unwrap(), 4);
    assert_eq!(loaded.pixel_color(1, 2).unwrap().unwrap().red(), 255);

    assert!(
        Bitmap::load(ImageFormat::PNG, dir.path().join("missing.png"), 0)
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_raw_bits_layout_is_checked() {
    if !common::freeimage_available() {
        return;
    }

    let bitmap = Bitmap::allocate(64, 2, 24, ColorMasks::NONE).unwrap().unwrap();

    let mut bits = vec![0u8; 64 * 3 * 2];
    let narrow = catch_unwind(AssertUnwindSafe(|| {
        bitmap.convert_to_raw_bits(&mut bits, 4, 24, ColorMasks::NONE, false)
    }));
    assert!(narrow.is_err());

    let mut short = vec![0u8; 64 * 3 + 10];
    let truncated = catch_unwind(AssertUnwindSafe(|| {
        bitmap.convert_to_raw_bits(&mut short, 64 * 3, 24, ColorMasks::NONE, false)
    }));
    assert!(truncated.is_err());

    bitmap
        .convert_to_raw_bits(&mut bits, 64 * 3, 24, ColorMasks::NONE, false)
        .unwrap();
    let restored = Bitmap::from_raw_bits(&bits, 64, 2, 64 * 3, 24, ColorMasks::NONE, false)
        .unwrap()
        .expect("Failed to import raw bits");
    assert_eq!(restored.width().unwrap(), 64);
}

#[test]
fn test_fill_colour_must_cover_a_pixel() {
    if !common::freeimage_available() {
        return;
    }

    let mut floats = Bitmap::allocate_t(ImageType::Rgbf, 4, 4, 96, ColorMasks::NONE)
        .unwrap()
        .expect("Failed to allocate RGBF bitmap");
    let one_byte = [0u8];
    let short = catch_unwind(AssertUnwindSafe(|| {
        floats.fill_background(Buffer::from(&one_byte[..]), 0)
    }));
    assert!(short.is_err());

    let pixel = [0.25f32, 0.5, 0.75];
    assert!(floats.fill_background(Buffer::from(&pixel[..]), 0).unwrap());

    let bitmap = Bitmap::allocate(4, 4, 24, ColorMasks::NONE).unwrap().unwrap();
    let three = [0u8; 3];
    let rotated = catch_unwind(AssertUnwindSafe(|| {
        bitmap.rotate(45.0, Some(Buffer::from(&three[..])))
    }));
    assert!(rotated.is_err());

    let quad = red();
    let canvas = bitmap
        .enlarge_canvas(1, 1, 1, 1, Some(Buffer::from(&quad)), 0)
        .unwrap()
        .expect("Failed to enlarge canvas");
    assert_eq!(canvas.width().unwrap(), 6);
    assert_eq!(canvas.pixel_color(0, 0).unwrap().unwrap().red(), 255);
}
