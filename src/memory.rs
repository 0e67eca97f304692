use std::{
    ffi::{c_long, c_void},
    marker::{PhantomData, PhantomPinned},
    ops::{Deref, DerefMut},
    ptr::NonNull,
};

use crate::{
    Bitmap, Buffer, BufferMut, Dib, Error, ImageFormat, Resolved, SeekOrigin, Value,
    bindings::{self, *},
    bitmap, library,
};

/// An opaque native memory stream (`FIMEMORY`) with its own cursor.
#[repr(C)]
pub struct Stream {
    _private: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Stream").field(&self.as_ptr()).finish()
    }
}

impl Stream {
    pub fn as_ptr(&self) -> *mut c_void {
        self as *const Stream as *mut c_void
    }

    pub(crate) fn handle(&self) -> Value<'static> {
        Value::Pointer(self.as_ptr())
    }

    /// Current cursor position in bytes.
    pub fn tell(&self) -> Result<c_long, Error> {
        Ok(unsafe { bindings::call(&TELL_MEMORY, vec![self.handle()]) }?.long())
    }

    pub fn seek(&mut self, offset: c_long, origin: SeekOrigin) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &SEEK_MEMORY,
                vec![self.handle(), Value::Long(offset), Value::I32(origin.raw())],
            )
        }?
        .bool())
    }

    /// Reads up to `buf.len()` bytes at the cursor and returns how many were
    /// read.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        let len = buf.len() as u32;
        let read = unsafe {
            bindings::call(
                &READ_MEMORY,
                vec![BufferMut::from(buf).into(), Value::U32(1), Value::U32(len), self.handle()],
            )
        }?
        .u32();
        Ok(read as usize)
    }

    /// Identifies the format of the stream's contents from its signature.
    /// The cursor is left where it was.
    pub fn file_type(&mut self) -> Result<ImageFormat, Error> {
        Ok(ImageFormat(
            unsafe { bindings::call(&GET_FILE_TYPE_FROM_MEMORY, vec![self.handle(), Value::I32(0)]) }?
                .i32(),
        ))
    }

    /// Whether the stream's contents carry `format`'s signature.
    pub fn validate(&mut self, format: ImageFormat) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(&VALIDATE_FROM_MEMORY, vec![Value::I32(format.0), self.handle()])
        }?
        .bool())
    }

    /// Decodes a bitmap from the cursor onwards.
    pub fn load(&mut self, format: ImageFormat, flags: i32) -> Result<Option<Bitmap>, Error> {
        bitmap::create(
            &LOAD_FROM_MEMORY,
            vec![Value::I32(format.0), self.handle(), Value::I32(flags)],
        )
    }
}

fn close_memory() -> Result<Resolved, Error> {
    Resolved::new(library(), &CLOSE_MEMORY)
}

fn open_memory(data: Value<'_>, len: u32) -> Result<Option<(NonNull<Stream>, Resolved)>, Error> {
    let close = close_memory()?;
    let raw = unsafe { bindings::call(&OPEN_MEMORY, vec![data, Value::U32(len)]) }?.pointer();
    Ok(NonNull::new(raw as *mut Stream).map(|raw| (raw, close)))
}

fn release(raw: NonNull<Stream>, close: Resolved) {
    unsafe { close.call(vec![Value::Pointer(raw.as_ptr().cast())]) }.void();
}

/// An owned, growable stream, for saving into.
pub struct MemoryStream {
    raw: NonNull<Stream>,
    close: Resolved,
}

unsafe impl Send for MemoryStream {}

impl std::fmt::Debug for MemoryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MemoryStream").field(&self.raw).finish()
    }
}

impl MemoryStream {
    /// Opens an empty stream. `None` when the native side cannot allocate.
    pub fn new() -> Result<Option<Self>, Error> {
        Ok(open_memory(Value::null(), 0)?.map(|(raw, close)| MemoryStream { raw, close }))
    }

    /// Writes `bytes` at the cursor and returns how many were written.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        if bytes.is_empty() {
            return Ok(0);
        }
        let written = unsafe {
            bindings::call(
                &WRITE_MEMORY,
                vec![
                    Buffer::from(bytes).into(),
                    Value::U32(1),
                    Value::U32(bytes.len() as u32),
                    self.handle(),
                ],
            )
        }?
        .u32();
        Ok(written as usize)
    }

    /// Encodes `bitmap` as `format` at the cursor.
    pub fn save(&mut self, bitmap: &Dib, format: ImageFormat, flags: i32) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &SAVE_TO_MEMORY,
                vec![Value::I32(format.0), bitmap.handle(), self.handle(), Value::I32(flags)],
            )
        }?
        .bool())
    }

    /// The stream's whole buffer. The view stays valid until the stream is
    /// next written to or closed.
    pub fn acquire(&self) -> Result<Option<&[u8]>, Error> {
        let mut data: *mut u8 = std::ptr::null_mut();
        let mut size: u32 = 0;
        let ok = unsafe {
            bindings::call(
                &ACQUIRE_MEMORY,
                vec![self.handle(), Value::out(&mut data), Value::out(&mut size)],
            )
        }?
        .bool();
        if !ok {
            return Ok(None);
        }
        if data.is_null() || size == 0 {
            return Ok(Some(&[]));
        }
        Ok(Some(unsafe { std::slice::from_raw_parts(data as *const u8, size as usize) }))
    }

    /// Copies the stream's buffer out.
    pub fn to_vec(&self) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.acquire()?.map(<[u8]>::to_vec))
    }

    pub fn close(self) {
        drop(self)
    }
}

impl Deref for MemoryStream {
    type Target = Stream;

    fn deref(&self) -> &Stream {
        unsafe { self.raw.as_ref() }
    }
}

impl DerefMut for MemoryStream {
    fn deref_mut(&mut self) -> &mut Stream {
        unsafe { self.raw.as_mut() }
    }
}

impl Drop for MemoryStream {
    fn drop(&mut self) {
        release(self.raw, self.close);
    }
}

/// A read-only stream over caller bytes. The bytes are borrowed, not copied.
pub struct MemoryReader<'a> {
    raw: NonNull<Stream>,
    close: Resolved,
    _bytes: PhantomData<&'a [u8]>,
}

unsafe impl Send for MemoryReader<'_> {}

impl std::fmt::Debug for MemoryReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MemoryReader").field(&self.raw).finish()
    }
}

impl<'a> MemoryReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Option<Self>, Error> {
        // The native side only reads through the pointer of a stream opened
        // over existing data.
        let data = if bytes.is_empty() {
            Value::null()
        } else {
            Value::Pointer(bytes.as_ptr() as *mut c_void)
        };
        Ok(open_memory(data, bytes.len() as u32)?.map(|(raw, close)| MemoryReader {
            raw,
            close,
            _bytes: PhantomData,
        }))
    }

    pub fn close(self) {
        drop(self)
    }
}

impl Deref for MemoryReader<'_> {
    type Target = Stream;

    fn deref(&self) -> &Stream {
        unsafe { self.raw.as_ref() }
    }
}

impl DerefMut for MemoryReader<'_> {
    fn deref_mut(&mut self) -> &mut Stream {
        unsafe { self.raw.as_mut() }
    }
}

impl Drop for MemoryReader<'_> {
    fn drop(&mut self) {
        release(self.raw, self.close);
    }
}

/// Identifies the format of `bytes` without decoding them.
pub fn file_type_of(bytes: &[u8]) -> Result<ImageFormat, Error> {
    match MemoryReader::new(bytes)? {
        Some(mut reader) => reader.file_type(),
        None => Ok(ImageFormat::UNKNOWN),
    }
}

/// Decodes a bitmap from `bytes`, detecting the format from its signature.
pub fn load_from_bytes(bytes: &[u8], flags: i32) -> Result<Option<Bitmap>, Error> {
    let Some(mut reader) = MemoryReader::new(bytes)? else {
        return Ok(None);
    };
    let format = reader.file_type()?;
    if !format.is_known() {
        tracing::debug!(len = bytes.len(), "unrecognised image signature");
        return Ok(None);
    }
    reader.load(format, flags)
}
