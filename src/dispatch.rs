use std::{
    cell::RefCell,
    collections::HashMap,
    ffi::{c_long, c_ulong, c_void},
};

use libffi::{
    middle::{Arg, Cif, CodePtr},
    raw::ffi_arg,
};

use crate::{CallResult, Error, Marshaled, NativeLibrary, Prototype, RawValue, Ty, Value};

thread_local! {
    static CIF_CACHE: RefCell<HashMap<Prototype, Cif>> = RefCell::new(HashMap::new());
}

fn with_cif<R>(prototype: &Prototype, use_cif: impl FnOnce(&Cif) -> R) -> R {
    CIF_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        let cif = cache.entry(*prototype).or_insert_with(|| {
            Cif::new(
                prototype.params.iter().map(|ty| ty.ffi_type()),
                prototype.ret.ffi_type(),
            )
        });
        use_cif(cif)
    })
}

/// A prototype bound to the address its symbol resolved to.
///
/// Resolving up front lets a caller dispatch later without a lookup that
/// could fail, which release paths (`Drop`) rely on.
#[derive(Debug, Clone, Copy)]
pub struct Resolved {
    prototype: &'static Prototype,
    address: usize,
}

impl Resolved {
    pub fn new(library: &NativeLibrary, prototype: &'static Prototype) -> Result<Self, Error> {
        let address = library.resolve(prototype)?;
        Ok(Resolved { prototype, address })
    }

    pub fn prototype(&self) -> &'static Prototype {
        self.prototype
    }

    /// Marshals `args`, performs exactly one foreign call and wraps the
    /// return value. Transient argument encodings are released before this
    /// returns.
    ///
    /// There is no retry, timeout or fault handling: a fault on the native
    /// side takes the process down.
    ///
    /// # Safety
    ///
    /// The prototype must match the native function's real signature, and
    /// every pointer argument must satisfy the function's contract (live
    /// handles, buffers large enough for what the callee writes).
    pub unsafe fn call(&self, args: Vec<Value<'_>>) -> CallResult {
        let marshaled = Marshaled::new(self.prototype, args);
        let ffi_args = marshaled.ffi_args();
        let code = CodePtr(self.address as *mut c_void);

        tracing::trace!(symbol = self.prototype.name, "native call");
        let raw = with_cif(self.prototype, |cif| unsafe {
            call_raw(cif, code, &ffi_args, self.prototype.ret)
        });

        drop(ffi_args);
        drop(marshaled);
        CallResult::new(self.prototype, raw)
    }
}

/// Resolves `prototype` in `library` and calls it once.
///
/// # Safety
///
/// See [`Resolved::call`].
pub unsafe fn invoke(
    library: &NativeLibrary,
    prototype: &'static Prototype,
    args: Vec<Value<'_>>,
) -> Result<CallResult, Error> {
    let resolved = Resolved::new(library, prototype)?;
    Ok(unsafe { resolved.call(args) })
}

unsafe fn call_raw(cif: &Cif, code: CodePtr, args: &[Arg], ret: Ty) -> RawValue {
    // Integer returns narrower than a register come back widened to
    // `ffi_arg`, so they are read at that width and truncated.
    unsafe {
        match ret {
            Ty::Void => {
                cif.call::<()>(code, args);
                RawValue::Void
            }
            Ty::I8 => RawValue::I8(cif.call::<ffi_arg>(code, args) as i8),
            Ty::U8 => RawValue::U8(cif.call::<ffi_arg>(code, args) as u8),
            Ty::I16 => RawValue::I16(cif.call::<ffi_arg>(code, args) as i16),
            Ty::U16 => RawValue::U16(cif.call::<ffi_arg>(code, args) as u16),
            Ty::I32 => RawValue::I32(cif.call::<ffi_arg>(code, args) as i32),
            Ty::U32 => RawValue::U32(cif.call::<ffi_arg>(code, args) as u32),
            Ty::Long => RawValue::Long(cif.call::<ffi_arg>(code, args) as c_long),
            Ty::ULong => RawValue::ULong(cif.call::<ffi_arg>(code, args) as c_ulong),
            Ty::I64 => RawValue::I64(cif.call::<i64>(code, args)),
            Ty::U64 => RawValue::U64(cif.call::<u64>(code, args)),
            Ty::F32 => RawValue::F32(cif.call::<f32>(code, args)),
            Ty::F64 => RawValue::F64(cif.call::<f64>(code, args)),
            Ty::Pointer => RawValue::Pointer(cif.call::<*mut c_void>(code, args)),
        }
    }
}
