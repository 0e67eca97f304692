//! zlib and gzip helpers exported by the native library.
//!
//! The `_into` functions return the number of bytes written to `target`,
//! `0` meaning the native call failed (usually because `target` was too
//! small).

use crate::{
    Buffer, BufferMut, Error, Value,
    bindings::{self, *},
};

/// Room a compressed copy of `len` bytes may need.
pub fn compress_bound(len: usize) -> usize {
    len + len / 1000 + 12
}

/// Like [`compress_bound`] plus the gzip header and trailer.
pub fn gzip_bound(len: usize) -> usize {
    compress_bound(len) + 12
}

fn transfer(prototype: &'static crate::Prototype, target: &mut [u8], source: &[u8]) -> Result<usize, Error> {
    if target.is_empty() {
        return Ok(0);
    }
    let (target_len, source_len) = (target.len() as u32, source.len() as u32);
    let source = if source.is_empty() {
        Value::null()
    } else {
        Buffer::from(source).into()
    };
    let written = unsafe {
        bindings::call(
            prototype,
            vec![
                BufferMut::from(target).into(),
                Value::U32(target_len),
                source,
                Value::U32(source_len),
            ],
        )
    }?
    .u32();
    Ok(written as usize)
}

fn to_vec(prototype: &'static crate::Prototype, capacity: usize, source: &[u8]) -> Result<Option<Vec<u8>>, Error> {
    let mut target = vec![0u8; capacity];
    let written = transfer(prototype, &mut target, source)?;
    if written == 0 {
        return Ok(None);
    }
    target.truncate(written);
    Ok(Some(target))
}

pub fn compress_into(target: &mut [u8], source: &[u8]) -> Result<usize, Error> {
    transfer(&ZLIB_COMPRESS, target, source)
}

/// `target` must be at least as long as the original data.
pub fn uncompress_into(target: &mut [u8], source: &[u8]) -> Result<usize, Error> {
    transfer(&ZLIB_UNCOMPRESS, target, source)
}

pub fn gzip_into(target: &mut [u8], source: &[u8]) -> Result<usize, Error> {
    transfer(&ZLIB_GZIP, target, source)
}

pub fn gunzip_into(target: &mut [u8], source: &[u8]) -> Result<usize, Error> {
    transfer(&ZLIB_GUNZIP, target, source)
}

/// zlib-compresses `source`. `None` when the native call fails.
pub fn compress(source: &[u8]) -> Result<Option<Vec<u8>>, Error> {
    to_vec(&ZLIB_COMPRESS, compress_bound(source.len()), source)
}

/// Inflates zlib data whose original size is known to be `original_len`.
pub fn uncompress(source: &[u8], original_len: usize) -> Result<Option<Vec<u8>>, Error> {
    to_vec(&ZLIB_UNCOMPRESS, original_len, source)
}

pub fn gzip(source: &[u8]) -> Result<Option<Vec<u8>>, Error> {
    to_vec(&ZLIB_GZIP, gzip_bound(source.len()), source)
}

/// Inflates gzip data whose original size is known to be `original_len`.
pub fn gunzip(source: &[u8], original_len: usize) -> Result<Option<Vec<u8>>, Error> {
    to_vec(&ZLIB_GUNZIP, original_len, source)
}

/// Continues the running CRC-32 `crc` over `source`. Start from `0`.
pub fn crc32(crc: u32, source: &[u8]) -> Result<u32, Error> {
    if source.is_empty() {
        return Ok(crc);
    }
    Ok(unsafe {
        bindings::call(
            &ZLIB_CRC32,
            vec![Value::U32(crc), Buffer::from(source).into(), Value::U32(source.len() as u32)],
        )
    }?
    .u32())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_leave_room_for_incompressible_input() {
        assert_eq!(compress_bound(0), 12);
        assert_eq!(compress_bound(10_000), 10_022);
        assert!(gzip_bound(100) > compress_bound(100));
    }

    #[test]
    fn empty_target_never_reaches_the_library() {
        assert_eq!(compress_into(&mut [], b"abc").unwrap(), 0);
        assert_eq!(gunzip_into(&mut [], b"\x1f\x8b").unwrap(), 0);
        assert_eq!(crc32(7, &[]).unwrap(), 7);
    }
}
