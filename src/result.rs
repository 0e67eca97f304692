use std::ffi::{CStr, c_char, c_long, c_ulong, c_void};

use crate::{Ownership, Prototype, Ty, types::from_native_bool};

/// The undecoded return value of one native call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue {
    Void,
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    Long(c_long),
    ULong(c_ulong),
    F32(f32),
    F64(f64),
    Pointer(*mut c_void),
}

impl RawValue {
    pub fn ty(&self) -> Ty {
        match self {
            RawValue::Void => Ty::Void,
            RawValue::I8(_) => Ty::I8,
            RawValue::U8(_) => Ty::U8,
            RawValue::I16(_) => Ty::I16,
            RawValue::U16(_) => Ty::U16,
            RawValue::I32(_) => Ty::I32,
            RawValue::U32(_) => Ty::U32,
            RawValue::I64(_) => Ty::I64,
            RawValue::U64(_) => Ty::U64,
            RawValue::Long(_) => Ty::Long,
            RawValue::ULong(_) => Ty::ULong,
            RawValue::F32(_) => Ty::F32,
            RawValue::F64(_) => Ty::F64,
            RawValue::Pointer(_) => Ty::Pointer,
        }
    }
}

/// One call's return value, tagged with its declared type and ownership.
///
/// Every result is read exactly once through one of the typed accessors. A
/// second read panics: with an owned pointer result it would otherwise hand
/// out memory that the first read already freed. Asking for a type other
/// than the declared one also panics.
///
/// Pointer results come in two flavours. The *retain* accessors read and
/// leave native memory alone; the *free* accessors read and then release the
/// allocation. The unsuffixed accessors pick the flavour from the
/// prototype's [`Ownership`].
#[derive(Debug)]
#[must_use = "a call result must be consumed through one of its accessors"]
pub struct CallResult {
    name: &'static str,
    raw: RawValue,
    ownership: Ownership,
    consumed: bool,
}

macro_rules! scalar_accessors {
    ($($(#[$meta:meta])* $method:ident -> $out:ty = $variant:ident;)+) => {
        $(
            $(#[$meta])*
            pub fn $method(&mut self) -> $out {
                match self.take(stringify!($method)) {
                    RawValue::$variant(v) => v,
                    other => self.mismatch(stringify!($method), other),
                }
            }
        )+
    };
}

impl CallResult {
    pub(crate) fn new(prototype: &Prototype, raw: RawValue) -> Self {
        debug_assert_eq!(raw.ty(), prototype.ret, "{}: return tag", prototype.name);
        CallResult {
            name: prototype.name,
            raw,
            ownership: prototype.ownership,
            consumed: false,
        }
    }

    pub fn ty(&self) -> Ty {
        self.raw.ty()
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    fn take(&mut self, accessor: &str) -> RawValue {
        assert!(
            !self.consumed,
            "{}: result consumed twice (second read through {accessor})",
            self.name
        );
        self.consumed = true;
        self.raw
    }

    fn mismatch(&self, accessor: &str, raw: RawValue) -> ! {
        panic!(
            "{}: {accessor} accessor used on a {:?} result",
            self.name,
            raw.ty()
        )
    }

    pub fn void(&mut self) {
        match self.take("void") {
            RawValue::Void => {}
            other => self.mismatch("void", other),
        }
    }

    /// A native BOOL: zero is false, anything else true.
    pub fn bool(&mut self) -> bool {
        match self.take("bool") {
            RawValue::I32(v) => from_native_bool(v),
            other => self.mismatch("bool", other),
        }
    }

    scalar_accessors! {
        i8 -> i8 = I8;
        u8 -> u8 = U8;
        i16 -> i16 = I16;
        u16 -> u16 = U16;
        i32 -> i32 = I32;
        u32 -> u32 = U32;
        i64 -> i64 = I64;
        u64 -> u64 = U64;
        long -> c_long = Long;
        ulong -> c_ulong = ULong;
        f32 -> f32 = F32;
        f64 -> f64 = F64;
        /// The raw address. Never frees: use this for handles, whose release
        /// is a native call of its own.
        pointer -> *mut c_void = Pointer;
    }

    fn take_pointer(&mut self, accessor: &str) -> *mut c_void {
        match self.take(accessor) {
            RawValue::Pointer(p) => p,
            other => self.mismatch(accessor, other),
        }
    }

    /// Reads a NUL-terminated string with the declared ownership flavour.
    /// A null result reads as `None`.
    pub fn string(&mut self) -> Option<String> {
        match self.ownership {
            Ownership::Borrowed => self.string_retain(),
            Ownership::Owned => self.string_free(),
        }
    }

    /// Reads a string the native library keeps ownership of.
    pub fn string_retain(&mut self) -> Option<String> {
        let p = self.take_pointer("string_retain");
        unsafe { read_c_string(p) }
    }

    /// Reads a string and frees the allocation it lived in.
    pub fn string_free(&mut self) -> Option<String> {
        let p = self.take_pointer("string_free");
        let value = unsafe { read_c_string(p) };
        unsafe { release(p) };
        value
    }

    /// Copies a `T` out of the pointed-to memory with the declared ownership
    /// flavour. A null result reads as `None`.
    ///
    /// # Safety
    ///
    /// The result must point to a properly aligned, initialized `T`.
    pub unsafe fn read<T: Copy>(&mut self) -> Option<T> {
        match self.ownership {
            Ownership::Borrowed => unsafe { self.read_retain() },
            Ownership::Owned => unsafe { self.read_free() },
        }
    }

    /// # Safety
    ///
    /// See [`CallResult::read`].
    pub unsafe fn read_retain<T: Copy>(&mut self) -> Option<T> {
        let p = self.take_pointer("read_retain") as *const T;
        (!p.is_null()).then(|| unsafe { p.read() })
    }

    /// # Safety
    ///
    /// See [`CallResult::read`]. The memory must also be a `malloc`
    /// allocation owned by the caller.
    pub unsafe fn read_free<T: Copy>(&mut self) -> Option<T> {
        let p = self.take_pointer("read_free");
        let value = (!p.is_null()).then(|| unsafe { (p as *const T).read() });
        unsafe { release(p) };
        value
    }
}

impl Drop for CallResult {
    fn drop(&mut self) {
        // An owned allocation nobody read would otherwise leak.
        if let (false, Ownership::Owned, RawValue::Pointer(p)) =
            (self.consumed, self.ownership, self.raw)
        {
            if !p.is_null() {
                tracing::trace!(symbol = self.name, "releasing unread owned result");
                unsafe { release(p) };
            }
        }
    }
}

unsafe fn read_c_string(p: *mut c_void) -> Option<String> {
    if p.is_null() {
        return None;
    }
    let value = unsafe { CStr::from_ptr(p as *const c_char) };
    Some(value.to_string_lossy().into_owned())
}

unsafe fn release(p: *mut c_void) {
    if !p.is_null() {
        unsafe { libc::free(p) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static GET_COUNT: Prototype = Prototype::new("get_count", &[], Ty::U32);
    static IS_READY: Prototype = Prototype::new("is_ready", &[], Ty::I32);
    static GET_NAME: Prototype = Prototype::new("get_name", &[], Ty::Pointer);
    static TAKE_NAME: Prototype = Prototype::owned("take_name", &[], Ty::Pointer);

    fn owned_c_string(s: &str) -> *mut c_void {
        let bytes = s.as_bytes();
        unsafe {
            let p = libc::malloc(bytes.len() + 1) as *mut u8;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), p, bytes.len());
            *p.add(bytes.len()) = 0;
            p as *mut c_void
        }
    }

    #[test]
    fn scalar_is_read_once() {
        let mut result = CallResult::new(&GET_COUNT, RawValue::U32(42));
        assert!(!result.is_consumed());
        assert_eq!(result.u32(), 42);
        assert!(result.is_consumed());
    }

    #[test]
    fn bool_decodes_nonzero_as_true() {
        assert!(CallResult::new(&IS_READY, RawValue::I32(2)).bool());
        assert!(!CallResult::new(&IS_READY, RawValue::I32(0)).bool());
    }

    #[test]
    #[should_panic(expected = "consumed twice")]
    fn second_read_is_rejected() {
        let mut result = CallResult::new(&GET_COUNT, RawValue::U32(1));
        let _ = result.u32();
        let _ = result.u32();
    }

    #[test]
    #[should_panic(expected = "consumed twice")]
    fn second_read_of_owned_string_is_rejected() {
        let mut result = CallResult::new(&TAKE_NAME, RawValue::Pointer(owned_c_string("x")));
        assert_eq!(result.string().as_deref(), Some("x"));
        let _ = result.string();
    }

    #[test]
    #[should_panic(expected = "accessor used on a U32 result")]
    fn wrong_accessor_is_rejected() {
        let mut result = CallResult::new(&GET_COUNT, RawValue::U32(1));
        let _ = result.i32();
    }

    #[test]
    fn borrowed_string_is_left_alone() {
        static NAME: &[u8] = b"library-owned\0";
        let mut result = CallResult::new(&GET_NAME, RawValue::Pointer(NAME.as_ptr() as *mut c_void));
        assert_eq!(result.ownership(), Ownership::Borrowed);
        assert_eq!(result.string().as_deref(), Some("library-owned"));
    }

    #[test]
    fn owned_string_is_freed_after_read() {
        let mut result = CallResult::new(&TAKE_NAME, RawValue::Pointer(owned_c_string("fresh")));
        assert_eq!(result.string().as_deref(), Some("fresh"));
    }

    #[test]
    fn unread_owned_result_is_released_on_drop() {
        let result = CallResult::new(&TAKE_NAME, RawValue::Pointer(owned_c_string("dropped")));
        drop(result);
    }

    #[test]
    fn null_string_reads_as_none() {
        let mut result = CallResult::new(&GET_NAME, RawValue::Pointer(std::ptr::null_mut()));
        assert_eq!(result.string(), None);
    }
}
