//! # freeimage-rs
//!
//! Rust bindings for the FreeImage library, loaded at runtime.
//!
//! Nothing is linked at build time: the shared library is opened on first
//! use and every native function is described by a [`Prototype`] (symbol
//! name, parameter types, return type, ownership of a pointer result) and
//! called through `libffi`.
//!
//! ## Features
//!
//! - One process-wide [`NativeLibrary`], loaded once, with a resolved-symbol
//!   cache.
//! - Argument marshaling with transient C strings released right after each
//!   call, and typed buffer views for pixel and table arguments.
//! - [`CallResult`]s that are read exactly once, with *retain* and *free*
//!   flavours for pointer results.
//! - Owning wrappers for every native handle ([`Bitmap`], [`MultiBitmap`],
//!   [`MemoryStream`], [`MemoryReader`], [`OwnedTag`], [`MetadataIter`],
//!   [`LockedPage`]) that release it exactly once.
//!
//! ## Getting Started
//!
//! The library is looked up as `libfreeimage.so.3` (`libfreeimage.3.dylib`
//! on macOS, `FreeImage.dll` on Windows). Set `FREEIMAGE_LIBRARY` to load it
//! from elsewhere, or call [`init`] before anything else.
//!
//! ## Examples
//!
//! ### Loading, converting and saving
//!
//! ```no_run
//! use freeimage_rs::{plugin, Bitmap, Error, ImageFormat};
//!
//! fn main() -> Result<(), Error> {
//!     let format = plugin::detect("input.tif")?;
//!     let Some(bitmap) = Bitmap::load(format, "input.tif", 0)? else {
//!         panic!("could not decode input.tif");
//!     };
//!     println!("{}x{} at {} bpp", bitmap.width()?, bitmap.height()?, bitmap.bpp()?);
//!
//!     if let Some(grey) = bitmap.convert_to_greyscale()? {
//!         grey.save(ImageFormat::PNG, "grey.png", 0)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Encoding into memory
//!
//! ```no_run
//! use freeimage_rs::{Bitmap, ColorMasks, Error, ImageFormat, MemoryStream, RgbQuad};
//!
//! fn main() -> Result<(), Error> {
//!     let mut bitmap = Bitmap::allocate(4, 4, 24, ColorMasks::NONE)?.expect("allocation");
//!     bitmap.set_pixel_color(1, 1, RgbQuad::new(255, 0, 0, 0))?;
//!
//!     let mut stream = MemoryStream::new()?.expect("stream");
//!     assert!(stream.save(&bitmap, ImageFormat::PNG, 0)?);
//!     let png = stream.to_vec()?.unwrap_or_default();
//!     println!("{} bytes of PNG", png.len());
//!     Ok(())
//! }
//! ```
//!
//! ### Walking metadata
//!
//! ```no_run
//! use freeimage_rs::{Bitmap, Error, ImageFormat, MetadataModel};
//!
//! fn main() -> Result<(), Error> {
//!     let bitmap = Bitmap::load(ImageFormat::JPEG, "photo.jpg", 0)?.expect("decode");
//!     for tag in bitmap.metadata_iter(MetadataModel::ExifMain)? {
//!         println!("{:?} = {:?}", tag.key()?, tag.display(MetadataModel::ExifMain, None)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Calling a function directly
//!
//! ```no_run
//! use freeimage_rs::{invoke, library, Prototype, Ty};
//!
//! static GET_VERSION: Prototype = Prototype::new("FreeImage_GetVersion", &[], Ty::Pointer);
//!
//! let mut result = unsafe { invoke(library(), &GET_VERSION, vec![]) }.unwrap();
//! println!("{:?}", result.string());
//! ```

mod types;
pub use types::*;

mod prototype;
pub use prototype::*;

mod config;
pub use config::*;

mod library;
pub use library::*;

mod marshal;
pub use marshal::*;

mod dispatch;
pub use dispatch::*;

mod result;
pub use result::*;

mod bindings;
pub use bindings::ALL as PROTOTYPES;

mod bitmap;
pub use bitmap::*;

mod memory;
pub use memory::*;

mod multipage;
pub use multipage::*;

mod metadata;
pub use metadata::*;

mod interop;

pub mod jpeg;
pub mod library_info;
pub mod plugin;
pub mod zlib;
