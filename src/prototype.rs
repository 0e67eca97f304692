use libffi::middle::Type;

/// Native type tag of one parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ty {
    Void,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    /// C `long`: 64-bit on LP64 platforms, 32-bit on Windows.
    Long,
    /// C `unsigned long`.
    ULong,
    F32,
    F64,
    Pointer,
}

impl Ty {
    pub(crate) fn ffi_type(self) -> Type {
        match self {
            Ty::Void => Type::void(),
            Ty::I8 => Type::i8(),
            Ty::U8 => Type::u8(),
            Ty::I16 => Type::i16(),
            Ty::U16 => Type::u16(),
            Ty::I32 => Type::i32(),
            Ty::U32 => Type::u32(),
            Ty::I64 => Type::i64(),
            Ty::U64 => Type::u64(),
            Ty::Long => Type::c_long(),
            Ty::ULong => Type::c_ulong(),
            Ty::F32 => Type::f32(),
            Ty::F64 => Type::f64(),
            Ty::Pointer => Type::pointer(),
        }
    }
}

/// Who owns the memory a pointer result refers to.
///
/// This is a fixed fact of each native function's contract and cannot be
/// recovered from the return type alone, so it is declared with the
/// prototype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// The memory belongs to the native library (or to another handle); the
    /// caller reads it and leaves it alone.
    Borrowed,
    /// The caller receives a fresh `malloc` allocation and must free it after
    /// reading.
    Owned,
}

/// An immutable description of one native function: its symbol name, the
/// ordered parameter tags, the return tag and the ownership of a pointer
/// result.
///
/// Prototypes are declared once as `static`s and shared by every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prototype {
    pub name: &'static str,
    pub params: &'static [Ty],
    pub ret: Ty,
    pub ownership: Ownership,
}

impl Prototype {
    pub const fn new(name: &'static str, params: &'static [Ty], ret: Ty) -> Self {
        Self {
            name,
            params,
            ret,
            ownership: Ownership::Borrowed,
        }
    }

    /// A prototype whose pointer result is a fresh allocation handed to the
    /// caller.
    pub const fn owned(name: &'static str, params: &'static [Ty], ret: Ty) -> Self {
        Self {
            name,
            params,
            ret,
            ownership: Ownership::Owned,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}
