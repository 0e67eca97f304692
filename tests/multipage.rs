mod common;

use std::path::Path;

use freeimage_rs::{
    Bitmap, ColorMasks, ImageFormat, MemoryStream, MultiBitmap, OpenOptions, RgbQuad, SeekOrigin,
};

fn page(width: i32) -> Bitmap {
    let mut bitmap = Bitmap::allocate(width, 8, 24, ColorMasks::NONE).unwrap().unwrap();
    bitmap
        .set_pixel_color(0, 0, RgbQuad::new(width as u8, 0, 0, 0))
        .unwrap();
    bitmap
}

fn write_tiff(path: &Path, pages: i32) {
    let mut container = MultiBitmap::open(ImageFormat::TIFF, path, OpenOptions::create())
        .unwrap()
        .expect("Failed to create multi-page file");
    for i in 0..pages {
        container.append_page(&page(8 + i)).unwrap();
    }
    assert_eq!(container.page_count().unwrap(), pages);
    assert!(container.close(0));
}

#[test]
fn test_create_and_reopen() {
    if !common::freeimage_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pages.tif");
    write_tiff(&path, 3);

    let container = MultiBitmap::open(ImageFormat::TIFF, &path, OpenOptions::read_only())
        .unwrap()
        .expect("Failed to reopen");
    assert_eq!(container.page_count().unwrap(), 3);

    let second = container.lock_page(1).unwrap().expect("Failed to lock page");
    assert_eq!(second.index(), 1);
    assert_eq!(second.width().unwrap(), 9);
    second.unlock(false);

    assert!(container.close(0));
}

#[test]
fn test_locked_page_bookkeeping() {
    if !common::freeimage_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locks.tif");
    write_tiff(&path, 4);

    let container = MultiBitmap::open(ImageFormat::TIFF, &path, OpenOptions::read_only())
        .unwrap()
        .unwrap();
    assert_eq!(container.locked_page_numbers().unwrap(), Some(vec![]));

    let pages: Vec<_> = (0..4)
        .map(|i| container.lock_page(i).unwrap().expect("Failed to lock page"))
        .collect();

    // A page cannot be locked twice.
    assert!(container.lock_page(2).unwrap().is_none());

    let mut locked = container.locked_page_numbers().unwrap().unwrap();
    locked.sort();
    assert_eq!(locked, [0, 1, 2, 3]);

    let mut pages = pages.into_iter();
    let first = pages.next().unwrap();
    let second = pages.next().unwrap();
    first.unlock(false);
    drop(second);

    let mut locked = container.locked_page_numbers().unwrap().unwrap();
    locked.sort();
    assert_eq!(locked, [2, 3]);

    for page in pages {
        page.unlock(false);
    }
    assert_eq!(container.locked_page_numbers().unwrap(), Some(vec![]));
    assert!(container.close(0));
}

#[test]
fn test_page_editing() {
    if !common::freeimage_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edit.tif");
    write_tiff(&path, 2);

    let mut container = MultiBitmap::open(ImageFormat::TIFF, &path, OpenOptions::default())
        .unwrap()
        .unwrap();
    container.insert_page(0, &page(20)).unwrap();
    assert_eq!(container.page_count().unwrap(), 3);
    assert!(!container.move_page(3, 0).unwrap());
    assert!(container.move_page(1, 2).unwrap());
    assert_eq!(container.page_count().unwrap(), 3);
    container.delete_page(2).unwrap();
    assert_eq!(container.page_count().unwrap(), 2);
    assert!(container.close(0));

    let reopened = MultiBitmap::open(ImageFormat::TIFF, &path, OpenOptions::read_only())
        .unwrap()
        .unwrap();
    assert_eq!(reopened.page_count().unwrap(), 2);
    let first = reopened.lock_page(0).unwrap().unwrap();
    assert_eq!(first.width().unwrap(), 20);
}

#[test]
fn test_memory_round_trip() {
    if !common::freeimage_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.tif");
    write_tiff(&path, 2);

    let container = MultiBitmap::open(ImageFormat::TIFF, &path, OpenOptions::read_only())
        .unwrap()
        .unwrap();
    let mut stream = MemoryStream::new().unwrap().unwrap();
    assert!(container.save_to_memory(ImageFormat::TIFF, &mut stream, 0).unwrap());
    container.close(0);

    assert!(stream.seek(0, SeekOrigin::Set).unwrap());
    let loaded = MultiBitmap::load_from_memory(&mut stream, ImageFormat::TIFF, 0)
        .unwrap()
        .expect("Failed to load from memory");
    assert_eq!(loaded.page_count().unwrap(), 2);
    let page = loaded.lock_page(0).unwrap().unwrap();
    assert_eq!(page.width().unwrap(), 8);
}
