use std::ffi::{CString, c_long, c_ulong, c_void};

use libffi::middle::Arg;

use crate::{Prototype, RgbQuad, Ty, types::to_native_bool};

macro_rules! buffer_views {
    ($($variant:ident($elem:ty),)+) => {
        /// A read-only typed view handed to the native side as the address of
        /// its first element.
        ///
        /// The view does not know the bitmap or stream it will be used with;
        /// matching its element width and length to what the callee expects
        /// is the caller's responsibility.
        #[derive(Debug, Clone, Copy)]
        pub enum Buffer<'a> {
            $($variant(&'a [$elem]),)+
        }

        /// A writable typed view, for calls that fill caller memory.
        #[derive(Debug)]
        pub enum BufferMut<'a> {
            $($variant(&'a mut [$elem]),)+
        }

        impl Buffer<'_> {
            pub fn len(&self) -> usize {
                match self {
                    $(Buffer::$variant(s) => s.len(),)+
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            pub fn byte_len(&self) -> usize {
                match self {
                    $(Buffer::$variant(s) => std::mem::size_of_val(*s),)+
                }
            }

            fn address(&self) -> *mut c_void {
                match self {
                    $(Buffer::$variant(s) => s.as_ptr() as *mut c_void,)+
                }
            }
        }

        impl BufferMut<'_> {
            pub fn len(&self) -> usize {
                match self {
                    $(BufferMut::$variant(s) => s.len(),)+
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            pub fn byte_len(&self) -> usize {
                match self {
                    $(BufferMut::$variant(s) => std::mem::size_of_val(&**s),)+
                }
            }

            fn address(&mut self) -> *mut c_void {
                match self {
                    $(BufferMut::$variant(s) => s.as_mut_ptr() as *mut c_void,)+
                }
            }
        }

        $(
            impl<'a> From<&'a [$elem]> for Buffer<'a> {
                fn from(value: &'a [$elem]) -> Self {
                    Buffer::$variant(value)
                }
            }

            impl<'a> From<&'a $elem> for Buffer<'a> {
                fn from(value: &'a $elem) -> Self {
                    Buffer::$variant(std::slice::from_ref(value))
                }
            }

            impl<'a> From<&'a mut [$elem]> for BufferMut<'a> {
                fn from(value: &'a mut [$elem]) -> Self {
                    BufferMut::$variant(value)
                }
            }

            impl<'a> From<&'a mut $elem> for BufferMut<'a> {
                fn from(value: &'a mut $elem) -> Self {
                    BufferMut::$variant(std::slice::from_mut(value))
                }
            }
        )+
    };
}

buffer_views! {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
    F64(f64),
    Quad(RgbQuad),
}

/// One host-side argument, before marshaling.
#[derive(Debug)]
pub enum Value<'a> {
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
    /// A raw address, typically an opaque handle or an out-parameter.
    Pointer(*mut c_void),
    /// Encoded as a native BOOL (`I32`).
    Bool(bool),
    /// Encoded into a transient NUL-terminated copy.
    Str(&'a str),
    /// Like `Str`, but `None` is passed as a null pointer.
    OptStr(Option<&'a str>),
    Buffer(Buffer<'a>),
    BufferMut(BufferMut<'a>),
}

impl Value<'_> {
    pub fn null() -> Self {
        Value::Pointer(std::ptr::null_mut())
    }

    /// The address of a single out-parameter slot.
    pub fn out<T>(slot: &mut T) -> Self {
        Value::Pointer(slot as *mut T as *mut c_void)
    }
}

impl<'a> From<Buffer<'a>> for Value<'a> {
    fn from(value: Buffer<'a>) -> Self {
        Value::Buffer(value)
    }
}

impl<'a> From<BufferMut<'a>> for Value<'a> {
    fn from(value: BufferMut<'a>) -> Self {
        Value::BufferMut(value)
    }
}

#[derive(Debug, Clone, Copy)]
enum Scalar {
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

/// Arguments in native representation, plus the transient encodings they
/// point into.
///
/// The transient encodings are released when this value is dropped, which
/// the dispatcher does right after the call returns.
#[derive(Debug)]
pub struct Marshaled {
    scalars: Vec<Scalar>,
    transient: Vec<CString>,
}

impl Marshaled {
    /// Encodes `args` against the prototype's parameter list.
    ///
    /// # Panics
    ///
    /// On arity or type-tag mismatch, on a string containing an interior NUL
    /// and on an empty buffer. All of these are bugs in the calling binding.
    pub fn new(prototype: &Prototype, args: Vec<Value<'_>>) -> Self {
        assert_eq!(
            args.len(),
            prototype.arity(),
            "{}: expected {} arguments, got {}",
            prototype.name,
            prototype.arity(),
            args.len()
        );

        let mut transient = Vec::new();
        let scalars = args
            .into_iter()
            .zip(prototype.params)
            .enumerate()
            .map(|(index, (value, &ty))| encode(prototype.name, index, ty, value, &mut transient))
            .collect();

        Marshaled { scalars, transient }
    }

    /// Number of transient encodings held for the duration of the call.
    pub fn transient_count(&self) -> usize {
        self.transient.len()
    }

    pub(crate) fn ffi_args(&self) -> Vec<Arg> {
        self.scalars
            .iter()
            .map(|scalar| match scalar {
                Scalar::I8(v) => Arg::new(v),
                Scalar::U8(v) => Arg::new(v),
                Scalar::I16(v) => Arg::new(v),
                Scalar::U16(v) => Arg::new(v),
                Scalar::I32(v) => Arg::new(v),
                Scalar::U32(v) => Arg::new(v),
                Scalar::I64(v) => Arg::new(v),
                Scalar::U64(v) => Arg::new(v),
                Scalar::Long(v) => Arg::new(v),
                Scalar::ULong(v) => Arg::new(v),
                Scalar::F32(v) => Arg::new(v),
                Scalar::F64(v) => Arg::new(v),
                Scalar::Pointer(v) => Arg::new(v),
            })
            .collect()
    }
}

fn encode(
    name: &str,
    index: usize,
    ty: Ty,
    value: Value<'_>,
    transient: &mut Vec<CString>,
) -> Scalar {
    match (ty, value) {
        (Ty::I8, Value::I8(v)) => Scalar::I8(v),
        (Ty::U8, Value::U8(v)) => Scalar::U8(v),
        (Ty::I16, Value::I16(v)) => Scalar::I16(v),
        (Ty::U16, Value::U16(v)) => Scalar::U16(v),
        (Ty::I32, Value::I32(v)) => Scalar::I32(v),
        (Ty::I32, Value::Bool(v)) => Scalar::I32(to_native_bool(v)),
        (Ty::U32, Value::U32(v)) => Scalar::U32(v),
        (Ty::I64, Value::I64(v)) => Scalar::I64(v),
        (Ty::U64, Value::U64(v)) => Scalar::U64(v),
        (Ty::Long, Value::Long(v)) => Scalar::Long(v),
        (Ty::ULong, Value::ULong(v)) => Scalar::ULong(v),
        (Ty::F32, Value::F32(v)) => Scalar::F32(v),
        (Ty::F64, Value::F64(v)) => Scalar::F64(v),
        (Ty::Pointer, Value::Pointer(p)) => Scalar::Pointer(p),
        (Ty::Pointer, Value::Str(s)) => Scalar::Pointer(encode_str(name, index, s, transient)),
        (Ty::Pointer, Value::OptStr(Some(s))) => {
            Scalar::Pointer(encode_str(name, index, s, transient))
        }
        (Ty::Pointer, Value::OptStr(None)) => Scalar::Pointer(std::ptr::null_mut()),
        (Ty::Pointer, Value::Buffer(buffer)) => {
            assert!(!buffer.is_empty(), "{name}: argument {index} is an empty buffer");
            Scalar::Pointer(buffer.address())
        }
        (Ty::Pointer, Value::BufferMut(mut buffer)) => {
            assert!(!buffer.is_empty(), "{name}: argument {index} is an empty buffer");
            Scalar::Pointer(buffer.address())
        }
        (ty, value) => panic!("{name}: argument {index} is {value:?}, expected {ty:?}"),
    }
}

fn encode_str(name: &str, index: usize, s: &str, transient: &mut Vec<CString>) -> *mut c_void {
    let encoded = CString::new(s)
        .unwrap_or_else(|_| panic!("{name}: argument {index} contains an interior NUL"));
    // The heap buffer does not move when the CString is pushed.
    let address = encoded.as_ptr() as *mut c_void;
    transient.push(encoded);
    address
}
