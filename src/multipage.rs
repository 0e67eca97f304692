use std::{
    ffi::c_void,
    marker::PhantomData,
    mem::ManuallyDrop,
    ops::{Deref, DerefMut},
    path::Path,
    ptr::NonNull,
};

use crate::{
    BufferMut, Dib, Error, ImageFormat, MemoryStream, Resolved, Stream, Value,
    bindings::{self, *},
    library,
};

/// How [`MultiBitmap::open`] treats the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenOptions {
    /// Create a new, empty file.
    pub create_new: bool,
    pub read_only: bool,
    /// Keep pages being edited in memory instead of in a cache file.
    pub keep_cache_in_memory: bool,
    /// Load flags handed to the format plugin.
    pub flags: i32,
}

impl OpenOptions {
    pub fn read_only() -> Self {
        OpenOptions {
            read_only: true,
            ..Default::default()
        }
    }

    pub fn create() -> Self {
        OpenOptions {
            create_new: true,
            keep_cache_in_memory: true,
            ..Default::default()
        }
    }
}

/// An owned multi-page container (`FIMULTIBITMAP`).
///
/// `'s` is the borrow of the stream a container loaded from memory keeps
/// reading from; containers opened from a file are `MultiBitmap<'static>`.
/// Pages are borrowed with [`MultiBitmap::lock_page`]; a [`LockedPage`]
/// borrows the container, so it cannot be closed or edited while any page
/// is locked.
pub struct MultiBitmap<'s> {
    raw: NonNull<c_void>,
    close: Resolved,
    _source: PhantomData<&'s mut Stream>,
}

unsafe impl Send for MultiBitmap<'_> {}

impl std::fmt::Debug for MultiBitmap<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MultiBitmap").field(&self.raw).finish()
    }
}

fn adopt<'s>(raw: *mut c_void, close: Resolved) -> Option<MultiBitmap<'s>> {
    NonNull::new(raw).map(|raw| MultiBitmap {
        raw,
        close,
        _source: PhantomData,
    })
}

impl MultiBitmap<'static> {
    /// Opens (or with [`OpenOptions::create_new`], creates) a multi-page file.
    pub fn open(format: ImageFormat, path: impl AsRef<Path>, options: OpenOptions) -> Result<Option<Self>, Error> {
        let close = Resolved::new(library(), &CLOSE_MULTI_BITMAP)?;
        let path = path.as_ref().to_string_lossy();
        let raw = unsafe {
            bindings::call(
                &OPEN_MULTI_BITMAP,
                vec![
                    Value::I32(format.0),
                    Value::Str(&path),
                    Value::Bool(options.create_new),
                    Value::Bool(options.read_only),
                    Value::Bool(options.keep_cache_in_memory),
                    Value::I32(options.flags),
                ],
            )
        }?
        .pointer();
        Ok(adopt(raw, close))
    }
}

impl<'s> MultiBitmap<'s> {
    /// Opens the pages held in `stream`. The container reads from the stream
    /// for as long as it is open.
    pub fn load_from_memory(stream: &'s mut Stream, format: ImageFormat, flags: i32) -> Result<Option<Self>, Error> {
        let close = Resolved::new(library(), &CLOSE_MULTI_BITMAP)?;
        let raw = unsafe {
            bindings::call(
                &LOAD_MULTI_BITMAP_FROM_MEMORY,
                vec![Value::I32(format.0), stream.handle(), Value::I32(flags)],
            )
        }?
        .pointer();
        Ok(adopt(raw, close))
    }

    fn handle(&self) -> Value<'static> {
        Value::Pointer(self.raw.as_ptr())
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.raw.as_ptr()
    }

    pub fn page_count(&self) -> Result<i32, Error> {
        Ok(unsafe { bindings::call(&GET_PAGE_COUNT, vec![self.handle()]) }?.i32())
    }

    /// Appends a copy of `page`.
    pub fn append_page(&mut self, page: &Dib) -> Result<(), Error> {
        unsafe { bindings::call(&APPEND_PAGE, vec![self.handle(), page.handle()]) }?.void();
        Ok(())
    }

    /// Inserts a copy of `page` before page `index`.
    pub fn insert_page(&mut self, index: i32, page: &Dib) -> Result<(), Error> {
        unsafe {
            bindings::call(&INSERT_PAGE, vec![self.handle(), Value::I32(index), page.handle()])
        }?
        .void();
        Ok(())
    }

    pub fn delete_page(&mut self, index: i32) -> Result<(), Error> {
        unsafe { bindings::call(&DELETE_PAGE, vec![self.handle(), Value::I32(index)]) }?.void();
        Ok(())
    }

    /// Moves page `source` to position `target`.
    pub fn move_page(&mut self, target: i32, source: i32) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &MOVE_PAGE,
                vec![self.handle(), Value::I32(target), Value::I32(source)],
            )
        }?
        .bool())
    }

    /// Borrows page `index` for reading or editing. `None` when the page
    /// does not exist or is already locked.
    pub fn lock_page(&self, index: i32) -> Result<Option<LockedPage<'_, 's>>, Error> {
        let unlock = Resolved::new(library(), &UNLOCK_PAGE)?;
        let raw = unsafe { bindings::call(&LOCK_PAGE, vec![self.handle(), Value::I32(index)]) }?
            .pointer();
        Ok(NonNull::new(raw as *mut Dib).map(|page| LockedPage {
            container: self,
            page,
            index,
            unlock,
        }))
    }

    /// Indices of the currently locked pages, in no particular order.
    /// `None` when the native query fails.
    pub fn locked_page_numbers(&self) -> Result<Option<Vec<i32>>, Error> {
        let mut count = 0i32;
        let ok = unsafe {
            bindings::call(
                &GET_LOCKED_PAGE_NUMBERS,
                vec![self.handle(), Value::null(), Value::out(&mut count)],
            )
        }?
        .bool();
        if !ok {
            return Ok(None);
        }
        if count <= 0 {
            return Ok(Some(Vec::new()));
        }

        // The fill call reads `count` as the capacity of `pages` and leaves it
        // unchanged.
        let mut pages = vec![0i32; count as usize];
        let ok = unsafe {
            bindings::call(
                &GET_LOCKED_PAGE_NUMBERS,
                vec![
                    self.handle(),
                    BufferMut::from(&mut pages[..]).into(),
                    Value::out(&mut count),
                ],
            )
        }?
        .bool();
        if !ok {
            return Ok(None);
        }
        Ok(Some(pages))
    }

    /// Encodes every page as `format` into `stream`.
    pub fn save_to_memory(&self, format: ImageFormat, stream: &mut MemoryStream, flags: i32) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &SAVE_MULTI_BITMAP_TO_MEMORY,
                vec![Value::I32(format.0), self.handle(), stream.handle(), Value::I32(flags)],
            )
        }?
        .bool())
    }

    /// Closes the container, writing pending changes back with `flags`.
    /// Returns the native status; dropping instead closes with flags `0` and
    /// discards the status.
    pub fn close(self, flags: i32) -> bool {
        let this = ManuallyDrop::new(self);
        unsafe { this.close.call(vec![this.handle(), Value::I32(flags)]) }.bool()
    }
}

impl Drop for MultiBitmap<'_> {
    fn drop(&mut self) {
        let closed = unsafe { self.close.call(vec![self.handle(), Value::I32(0)]) }.bool();
        if !closed {
            tracing::warn!(container = ?self.raw, "multi-page close reported failure");
        }
    }
}

/// One page borrowed from a [`MultiBitmap`].
///
/// Dropping the page unlocks it without marking it changed; use
/// [`LockedPage::unlock`] to have edits written back.
pub struct LockedPage<'m, 's> {
    container: &'m MultiBitmap<'s>,
    page: NonNull<Dib>,
    index: i32,
    unlock: Resolved,
}

impl std::fmt::Debug for LockedPage<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockedPage")
            .field("container", &self.container.raw)
            .field("index", &self.index)
            .finish()
    }
}

impl LockedPage<'_, '_> {
    pub fn index(&self) -> i32 {
        self.index
    }

    /// Returns the page to its container; with `changed`, the page's
    /// current contents replace the stored ones.
    pub fn unlock(self, changed: bool) {
        let this = ManuallyDrop::new(self);
        this.release(changed);
    }

    fn release(&self, changed: bool) {
        unsafe {
            self.unlock.call(vec![
                self.container.handle(),
                Value::Pointer(self.page.as_ptr().cast()),
                Value::Bool(changed),
            ])
        }
        .void();
    }
}

impl Deref for LockedPage<'_, '_> {
    type Target = Dib;

    fn deref(&self) -> &Dib {
        unsafe { self.page.as_ref() }
    }
}

impl DerefMut for LockedPage<'_, '_> {
    fn deref_mut(&mut self) -> &mut Dib {
        unsafe { self.page.as_mut() }
    }
}

impl Drop for LockedPage<'_, '_> {
    fn drop(&mut self) {
        self.release(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_option_presets() {
        let read = OpenOptions::read_only();
        assert!(read.read_only && !read.create_new);
        let create = OpenOptions::create();
        assert!(create.create_new && !create.read_only && create.keep_cache_in_memory);
        assert_eq!(OpenOptions::default().flags, 0);
    }
}
