mod common;

use freeimage_rs::{
    Bitmap, ColorMasks, ImageFormat, MemoryReader, MemoryStream, RgbQuad, SeekOrigin,
    file_type_of, load_from_bytes,
};

fn sample() -> Bitmap {
    let mut bitmap = Bitmap::allocate(6, 5, 24, ColorMasks::NONE).unwrap().unwrap();
    for y in 0..5 {
        for x in 0..6 {
            let color = RgbQuad::new((x * 40) as u8, (y * 50) as u8, 99, 0);
            bitmap.set_pixel_color(x, y, color).unwrap();
        }
    }
    bitmap
}

fn encode_png(bitmap: &Bitmap) -> Vec<u8> {
    let mut stream = MemoryStream::new().unwrap().expect("Failed to open stream");
    assert!(stream.save(bitmap, ImageFormat::PNG, 0).unwrap());
    stream.to_vec().unwrap().expect("Failed to acquire stream")
}

#[test]
fn test_acquire_matches_stream_length() {
    if !common::freeimage_available() {
        return;
    }

    let bitmap = sample();
    let mut stream = MemoryStream::new().unwrap().unwrap();
    assert!(stream.save(&bitmap, ImageFormat::PNG, 0).unwrap());

    assert!(stream.seek(0, SeekOrigin::End).unwrap());
    let length = stream.tell().unwrap();
    let bytes = stream.acquire().unwrap().expect("Failed to acquire stream");
    assert!(!bytes.is_empty());
    assert_eq!(bytes.len() as i64, length as i64);
    assert_eq!(&bytes[1..4], b"PNG");
}

#[test]
fn test_png_round_trip_through_reader() {
    if !common::freeimage_available() {
        return;
    }

    let original = sample();
    let png = encode_png(&original);

    let mut reader = MemoryReader::new(&png).unwrap().expect("Failed to open reader");
    assert_eq!(reader.file_type().unwrap(), ImageFormat::PNG);
    let decoded = reader
        .load(ImageFormat::PNG, 0)
        .unwrap()
        .expect("Failed to decode");
    reader.close();

    assert_eq!(decoded.width().unwrap(), original.width().unwrap());
    assert_eq!(decoded.height().unwrap(), original.height().unwrap());
    assert_eq!(decoded.bpp().unwrap(), original.bpp().unwrap());
    for y in 0..5 {
        for x in 0..6 {
            let a = original.pixel_color(x, y).unwrap().unwrap();
            let b = decoded.pixel_color(x, y).unwrap().unwrap();
            assert_eq!((a.red(), a.green(), a.blue()), (b.red(), b.green(), b.blue()));
        }
    }
}

#[test]
fn test_byte_helpers() {
    if !common::freeimage_available() {
        return;
    }

    let png = encode_png(&sample());
    assert_eq!(file_type_of(&png).unwrap(), ImageFormat::PNG);
    assert_eq!(file_type_of(b"definitely not an image").unwrap(), ImageFormat::UNKNOWN);

    let decoded = load_from_bytes(&png, 0).unwrap().expect("Failed to decode");
    assert_eq!(decoded.width().unwrap(), 6);
    assert!(load_from_bytes(b"garbage", 0).unwrap().is_none());
}

#[test]
fn test_raw_read_and_write() {
    if !common::freeimage_available() {
        return;
    }

    let mut stream = MemoryStream::new().unwrap().unwrap();
    assert_eq!(stream.write(b"hello, stream").unwrap(), 13);
    assert_eq!(stream.write(b"").unwrap(), 0);
    assert_eq!(stream.tell().unwrap(), 13);

    assert!(stream.seek(7, SeekOrigin::Set).unwrap());
    let mut buf = [0u8; 16];
    let read = stream.read(&mut buf).unwrap();
    assert_eq!(&buf[..read], b"stream");
    assert_eq!(stream.to_vec().unwrap().unwrap(), b"hello, stream");
}

#[test]
fn test_empty_reader_opens() {
    if !common::freeimage_available() {
        return;
    }

    let mut reader = MemoryReader::new(&[]).unwrap().expect("Failed to open reader");
    assert_eq!(reader.file_type().unwrap(), ImageFormat::UNKNOWN);
    assert_eq!(reader.tell().unwrap(), 0);
}
