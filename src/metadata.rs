use std::{
    ffi::c_void,
    marker::{PhantomData, PhantomPinned},
    ops::{Deref, DerefMut},
    ptr::NonNull,
};

use crate::{
    Buffer, Dib, Error, MetadataModel, MetadataType, Resolved, Value,
    bindings::{self, *},
    library,
};

/// An opaque metadata tag (`FITAG`).
///
/// A `&Tag` from a lookup or from iteration belongs to the bitmap's
/// metadata and lives as long as the borrow of the bitmap. Standalone tags
/// are [`OwnedTag`]s.
#[repr(C)]
pub struct Tag {
    _private: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

impl std::fmt::Debug for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Tag").field(&self.as_ptr()).finish()
    }
}

impl Tag {
    unsafe fn from_ptr<'a>(raw: *mut c_void) -> Option<&'a Tag> {
        unsafe { (raw as *const Tag).as_ref() }
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self as *const Tag as *mut c_void
    }

    fn handle(&self) -> Value<'static> {
        Value::Pointer(self.as_ptr())
    }

    pub fn key(&self) -> Result<Option<String>, Error> {
        Ok(unsafe { bindings::call(&GET_TAG_KEY, vec![self.handle()]) }?.string())
    }

    pub fn description(&self) -> Result<Option<String>, Error> {
        Ok(unsafe { bindings::call(&GET_TAG_DESCRIPTION, vec![self.handle()]) }?.string())
    }

    pub fn id(&self) -> Result<u16, Error> {
        Ok(unsafe { bindings::call(&GET_TAG_ID, vec![self.handle()]) }?.u16())
    }

    pub fn tag_type(&self) -> Result<MetadataType, Error> {
        Ok(unsafe { bindings::call(&GET_TAG_TYPE, vec![self.handle()]) }?
            .i32()
            .into())
    }

    /// Number of values of [`Tag::tag_type`] the tag holds.
    pub fn count(&self) -> Result<u32, Error> {
        Ok(unsafe { bindings::call(&GET_TAG_COUNT, vec![self.handle()]) }?.u32())
    }

    /// Length of the value in bytes.
    pub fn length(&self) -> Result<u32, Error> {
        Ok(unsafe { bindings::call(&GET_TAG_LENGTH, vec![self.handle()]) }?.u32())
    }

    /// The raw value bytes, [`Tag::length`] long.
    pub fn value(&self) -> Result<Option<&[u8]>, Error> {
        let p = unsafe { bindings::call(&GET_TAG_VALUE, vec![self.handle()]) }?.pointer();
        if p.is_null() {
            return Ok(None);
        }
        let len = self.length()? as usize;
        Ok(Some(unsafe { std::slice::from_raw_parts(p as *const u8, len) }))
    }

    pub fn set_key(&mut self, key: &str) -> Result<bool, Error> {
        Ok(unsafe { bindings::call(&SET_TAG_KEY, vec![self.handle(), Value::Str(key)]) }?.bool())
    }

    pub fn set_description(&mut self, description: &str) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(&SET_TAG_DESCRIPTION, vec![self.handle(), Value::Str(description)])
        }?
        .bool())
    }

    pub fn set_id(&mut self, id: u16) -> Result<bool, Error> {
        Ok(unsafe { bindings::call(&SET_TAG_ID, vec![self.handle(), Value::U16(id)]) }?.bool())
    }

    pub fn set_type(&mut self, tag_type: MetadataType) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(&SET_TAG_TYPE, vec![self.handle(), Value::I32(tag_type.raw())])
        }?
        .bool())
    }

    pub fn set_count(&mut self, count: u32) -> Result<bool, Error> {
        Ok(unsafe { bindings::call(&SET_TAG_COUNT, vec![self.handle(), Value::U32(count)]) }?.bool())
    }

    pub fn set_length(&mut self, length: u32) -> Result<bool, Error> {
        Ok(unsafe { bindings::call(&SET_TAG_LENGTH, vec![self.handle(), Value::U32(length)]) }?
            .bool())
    }

    /// Stores a copy of `value`, setting the tag's length to match first.
    /// The type and count should already describe the bytes.
    pub fn set_value(&mut self, value: &[u8]) -> Result<bool, Error> {
        if !self.set_length(value.len() as u32)? {
            return Ok(false);
        }
        if value.is_empty() {
            return Ok(true);
        }
        Ok(unsafe {
            bindings::call(&SET_TAG_VALUE, vec![self.handle(), Buffer::from(value).into()])
        }?
        .bool())
    }

    /// Builds an ASCII value tag: type, count, length and value in one go.
    pub fn set_ascii(&mut self, value: &str) -> Result<bool, Error> {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        Ok(self.set_type(MetadataType::Ascii)?
            && self.set_count(bytes.len() as u32)?
            && self.set_value(&bytes)?)
    }

    pub fn try_clone(&self) -> Result<Option<OwnedTag>, Error> {
        create_tag(&CLONE_TAG, vec![self.handle()])
    }

    /// A human-readable rendering of the value as the library interprets it
    /// for `model`. `make` selects a camera maker's note layout.
    ///
    /// The text lives in a library buffer that the next call overwrites, so
    /// it is copied out here.
    pub fn display(&self, model: MetadataModel, make: Option<&str>) -> Result<Option<String>, Error> {
        Ok(unsafe {
            bindings::call(
                &TAG_TO_STRING,
                vec![Value::I32(model.raw()), self.handle(), Value::OptStr(make)],
            )
        }?
        .string())
    }
}

fn create_tag(prototype: &'static crate::Prototype, args: Vec<Value<'_>>) -> Result<Option<OwnedTag>, Error> {
    let delete = Resolved::new(library(), &DELETE_TAG)?;
    let raw = unsafe { bindings::call(prototype, args) }?.pointer();
    Ok(NonNull::new(raw as *mut Tag).map(|raw| OwnedTag { raw, delete }))
}

/// A standalone tag, deleted on drop.
pub struct OwnedTag {
    raw: NonNull<Tag>,
    delete: Resolved,
}

unsafe impl Send for OwnedTag {}

impl std::fmt::Debug for OwnedTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OwnedTag").field(&self.raw).finish()
    }
}

impl OwnedTag {
    pub fn new() -> Result<Option<Self>, Error> {
        create_tag(&CREATE_TAG, vec![])
    }

    pub fn delete(self) {
        drop(self)
    }
}

impl Deref for OwnedTag {
    type Target = Tag;

    fn deref(&self) -> &Tag {
        unsafe { self.raw.as_ref() }
    }
}

impl DerefMut for OwnedTag {
    fn deref_mut(&mut self) -> &mut Tag {
        unsafe { self.raw.as_mut() }
    }
}

impl Drop for OwnedTag {
    fn drop(&mut self) {
        unsafe { self.delete.call(vec![self.handle()]) }.void();
    }
}

struct Search {
    raw: NonNull<c_void>,
    next: Resolved,
    close: Resolved,
}

/// Iterates the tags a bitmap holds for one metadata model.
///
/// The native search is closed when the iterator is dropped, whether or
/// not it ran to the end.
pub struct MetadataIter<'a> {
    search: Option<Search>,
    pending: Option<&'a Tag>,
    exhausted: bool,
    model: MetadataModel,
    _bitmap: PhantomData<&'a Dib>,
}

impl std::fmt::Debug for MetadataIter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataIter")
            .field("model", &self.model)
            .field("open", &self.search.is_some())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

impl<'a> Iterator for MetadataIter<'a> {
    type Item = &'a Tag;

    fn next(&mut self) -> Option<&'a Tag> {
        if let Some(tag) = self.pending.take() {
            return Some(tag);
        }
        if self.exhausted {
            return None;
        }
        let search = self.search.as_ref()?;

        let mut tag: *mut c_void = std::ptr::null_mut();
        let found = unsafe {
            search
                .next
                .call(vec![Value::Pointer(search.raw.as_ptr()), Value::out(&mut tag)])
        }
        .bool();
        let tag = if found { unsafe { Tag::from_ptr(tag) } } else { None };
        if tag.is_none() {
            self.exhausted = true;
        }
        tag
    }
}

impl MetadataIter<'_> {
    pub fn model(&self) -> MetadataModel {
        self.model
    }

    /// Ends the search early.
    pub fn close(self) {
        drop(self)
    }
}

impl Drop for MetadataIter<'_> {
    fn drop(&mut self) {
        if let Some(search) = self.search.take() {
            unsafe { search.close.call(vec![Value::Pointer(search.raw.as_ptr())]) }.void();
        }
    }
}

impl Dib {
    /// Starts iterating the tags of `model`.
    pub fn metadata_iter(&self, model: MetadataModel) -> Result<MetadataIter<'_>, Error> {
        let next = Resolved::new(library(), &FIND_NEXT_METADATA)?;
        let close = Resolved::new(library(), &FIND_CLOSE_METADATA)?;

        let mut first: *mut c_void = std::ptr::null_mut();
        let raw = unsafe {
            bindings::call(
                &FIND_FIRST_METADATA,
                vec![Value::I32(model.raw()), self.handle(), Value::out(&mut first)],
            )
        }?
        .pointer();

        // A null search means the model holds no tags; there is nothing to
        // close.
        let search = NonNull::new(raw).map(|raw| Search { raw, next, close });
        let pending = match search {
            Some(_) => unsafe { Tag::from_ptr(first) },
            None => None,
        };
        Ok(MetadataIter {
            exhausted: pending.is_none(),
            search,
            pending,
            model,
            _bitmap: PhantomData,
        })
    }

    /// The tag stored under `key` in `model`.
    pub fn metadata(&self, model: MetadataModel, key: &str) -> Result<Option<&Tag>, Error> {
        let mut tag: *mut c_void = std::ptr::null_mut();
        let found = unsafe {
            bindings::call(
                &GET_METADATA,
                vec![Value::I32(model.raw()), self.handle(), Value::Str(key), Value::out(&mut tag)],
            )
        }?
        .bool();
        Ok(if found { unsafe { Tag::from_ptr(tag) } } else { None })
    }

    /// Stores a copy of `tag` under `key`, or removes the key with `None`.
    pub fn set_metadata(&mut self, model: MetadataModel, key: &str, tag: Option<&Tag>) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &SET_METADATA,
                vec![
                    Value::I32(model.raw()),
                    self.handle(),
                    Value::Str(key),
                    tag.map_or_else(Value::null, Tag::handle),
                ],
            )
        }?
        .bool())
    }

    /// Removes every tag of `model`.
    pub fn clear_metadata(&mut self, model: MetadataModel) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &SET_METADATA,
                vec![Value::I32(model.raw()), self.handle(), Value::null(), Value::null()],
            )
        }?
        .bool())
    }

    /// Stores `value` as an ASCII tag under `key`.
    pub fn set_metadata_key_value(&mut self, model: MetadataModel, key: &str, value: &str) -> Result<bool, Error> {
        Ok(unsafe {
            bindings::call(
                &SET_METADATA_KEY_VALUE,
                vec![Value::I32(model.raw()), self.handle(), Value::Str(key), Value::Str(value)],
            )
        }?
        .bool())
    }

    pub fn metadata_count(&self, model: MetadataModel) -> Result<u32, Error> {
        Ok(unsafe {
            bindings::call(&GET_METADATA_COUNT, vec![Value::I32(model.raw()), self.handle()])
        }?
        .u32())
    }

    /// Replaces this bitmap's metadata with a copy of `source`'s.
    pub fn clone_metadata_from(&mut self, source: &Dib) -> Result<bool, Error> {
        Ok(unsafe { bindings::call(&CLONE_METADATA, vec![self.handle(), source.handle()]) }?.bool())
    }
}

/// Every model a bitmap can hold tags for.
pub const MODELS: [MetadataModel; 12] = [
    MetadataModel::Comments,
    MetadataModel::ExifMain,
    MetadataModel::ExifExif,
    MetadataModel::ExifGps,
    MetadataModel::ExifMakerNote,
    MetadataModel::ExifInterop,
    MetadataModel::Iptc,
    MetadataModel::Xmp,
    MetadataModel::GeoTiff,
    MetadataModel::Animation,
    MetadataModel::Custom,
    MetadataModel::ExifRaw,
];
