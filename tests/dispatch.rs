//! The dispatch core exercised against the C runtime, which every Linux
//! host has, so these run without the image library installed.
#![cfg(target_os = "linux")]

use std::ffi::{c_long, c_ulong, c_void};

use freeimage_rs::{
    Buffer, BufferMut, Error, LoadMode, Marshaled, NativeLibrary, Ownership, Prototype, Resolved,
    Ty, Value, invoke,
};

const LIBC: &str = "libc.so.6";

static STRLEN: Prototype = Prototype::new("strlen", &[Ty::Pointer], Ty::ULong);
static ABS: Prototype = Prototype::new("abs", &[Ty::I32], Ty::I32);
static LABS: Prototype = Prototype::new("labs", &[Ty::Long], Ty::Long);
static HTONS: Prototype = Prototype::new("htons", &[Ty::U16], Ty::U16);
static ISDIGIT: Prototype = Prototype::new("isdigit", &[Ty::I32], Ty::I32);
static STRTOD: Prototype = Prototype::new("strtod", &[Ty::Pointer, Ty::Pointer], Ty::F64);
static MEMCPY: Prototype =
    Prototype::new("memcpy", &[Ty::Pointer, Ty::Pointer, Ty::ULong], Ty::Pointer);
static GETENV: Prototype = Prototype::new("getenv", &[Ty::Pointer], Ty::Pointer);
static STRDUP: Prototype = Prototype::owned("strdup", &[Ty::Pointer], Ty::Pointer);
static MISSING: Prototype = Prototype::new("freeimage_rs_no_such_symbol", &[], Ty::Void);

fn libc() -> NativeLibrary {
    NativeLibrary::open(LIBC, LoadMode::Now).expect("Failed to load the C runtime")
}

#[test]
fn test_string_argument_and_ulong_return() {
    let libc = libc();
    let mut result = unsafe { invoke(&libc, &STRLEN, vec![Value::Str("hello")]) }.unwrap();
    assert_eq!(result.ty(), Ty::ULong);
    assert_eq!(result.ulong(), 5 as c_ulong);
}

#[test]
fn test_scalar_round_trips() {
    let libc = libc();
    unsafe {
        assert_eq!(invoke(&libc, &ABS, vec![Value::I32(-42)]).unwrap().i32(), 42);
        assert_eq!(invoke(&libc, &LABS, vec![Value::Long(-7)]).unwrap().long(), 7 as c_long);
        assert!(invoke(&libc, &ISDIGIT, vec![Value::I32(b'7' as i32)]).unwrap().bool());
        assert!(!invoke(&libc, &ISDIGIT, vec![Value::I32(b'x' as i32)]).unwrap().bool());
    }
}

#[test]
fn test_narrow_return_is_truncated_to_its_width() {
    let libc = libc();
    let swapped = unsafe { invoke(&libc, &HTONS, vec![Value::U16(0x1234)]) }.unwrap().u16();
    assert_eq!(swapped, 0x1234u16.to_be());
}

#[test]
fn test_float_return_with_null_argument() {
    let libc = libc();
    let value = unsafe { invoke(&libc, &STRTOD, vec![Value::Str("2.5"), Value::null()]) }
        .unwrap()
        .f64();
    assert_eq!(value, 2.5);
}

#[test]
fn test_buffers_pass_by_address() {
    let libc = libc();
    let source = [1u16, 2, 3, 4];
    let mut target = [0u16; 4];
    let target_address = target.as_mut_ptr() as *mut c_void;

    let returned = unsafe {
        invoke(
            &libc,
            &MEMCPY,
            vec![
                BufferMut::from(&mut target[..]).into(),
                Buffer::from(&source[..]).into(),
                Value::ULong(std::mem::size_of_val(&source) as c_ulong),
            ],
        )
    }
    .unwrap()
    .pointer();

    assert_eq!(returned, target_address);
    assert_eq!(target, source);
}

#[test]
fn test_borrowed_string_is_read_without_freeing() {
    let libc = libc();
    let mut result = unsafe { invoke(&libc, &GETENV, vec![Value::Str("PATH")]) }.unwrap();
    assert_eq!(result.ownership(), Ownership::Borrowed);
    let path = result.string();
    assert_eq!(path, std::env::var("PATH").ok());

    // The environment still holds the same string.
    let again = unsafe { invoke(&libc, &GETENV, vec![Value::Str("PATH")]) }.unwrap().string();
    assert_eq!(path, again);
}

#[test]
fn test_owned_string_is_freed_after_read() {
    let libc = libc();
    for _ in 0..1000 {
        let mut result = unsafe { invoke(&libc, &STRDUP, vec![Value::Str("fresh copy")]) }.unwrap();
        assert_eq!(result.ownership(), Ownership::Owned);
        assert_eq!(result.string().as_deref(), Some("fresh copy"));
        assert!(result.is_consumed());
    }
}

#[test]
fn test_unread_owned_result_is_released_on_drop() {
    let libc = libc();
    for _ in 0..1000 {
        let result = unsafe { invoke(&libc, &STRDUP, vec![Value::Str("never read")]) }.unwrap();
        assert!(!result.is_consumed());
    }
}

#[test]
#[should_panic(expected = "consumed twice")]
fn test_double_consumption_is_rejected() {
    let libc = libc();
    let mut result = unsafe { invoke(&libc, &STRDUP, vec![Value::Str("once")]) }.unwrap();
    let _ = result.string();
    let _ = result.string();
}

#[test]
fn test_repeated_string_calls_hold_no_transient_memory() {
    let libc = libc();
    let strlen = Resolved::new(&libc, &STRLEN).unwrap();
    for i in 0..10_000usize {
        let text = "x".repeat(i % 64);
        let len = unsafe { strlen.call(vec![Value::Str(&text)]) }.ulong();
        assert_eq!(len as usize, text.len());
    }

    // Encodings live only as long as the marshaled arguments.
    let marshaled = Marshaled::new(&STRLEN, vec![Value::Str("transient")]);
    assert_eq!(marshaled.transient_count(), 1);
    drop(marshaled);
}

#[test]
fn test_missing_symbol_is_reported() {
    let libc = libc();
    match unsafe { invoke(&libc, &MISSING, vec![]) } {
        Err(Error::SymbolNotFound(name)) => assert_eq!(name, MISSING.name),
        other => panic!("expected SymbolNotFound, got {:?}", other),
    }
}

#[test]
fn test_resolution_is_cached() {
    let libc = libc();
    let first = libc.resolve(&ABS).unwrap();
    let second = libc.resolve(&ABS).unwrap();
    assert_eq!(first, second);
    assert_eq!(Resolved::new(&libc, &ABS).unwrap().prototype(), &ABS);
}

#[test]
fn test_load_failure_is_an_error_for_explicit_opens() {
    match NativeLibrary::open("/nonexistent/libnothing.so", LoadMode::Lazy) {
        Err(Error::LoadFailed { path, .. }) => {
            assert_eq!(path, std::path::Path::new("/nonexistent/libnothing.so"))
        }
        other => panic!("expected LoadFailed, got {:?}", other),
    }
}

#[test]
fn test_every_load_mode_opens() {
    for mode in [LoadMode::Lazy, LoadMode::Now, LoadMode::Global] {
        let libc = NativeLibrary::open(LIBC, mode).unwrap();
        assert_eq!(libc.mode(), mode);
        assert_eq!(libc.path(), std::path::Path::new(LIBC));
    }
}
