use std::{ffi::c_void, path::PathBuf};

/// Represents errors that can occur while loading the native library or
/// dispatching a call into it.
///
/// Native failures that the library reports through its own sentinels
/// (`FALSE`, null handles) are not errors here: they surface unchanged as
/// `bool` or `Option` values inside `Ok`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The shared library could not be opened.
    #[error("Failed to load native library {path}: {reason}")]
    LoadFailed { path: PathBuf, reason: String },
    /// The loaded library does not export the requested symbol.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),
    /// A configuration value could not be interpreted.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Native BOOL: a 32-bit integer, 0 is false and anything else is true.
pub(crate) fn from_native_bool(value: i32) -> bool {
    value != 0
}

pub(crate) fn to_native_bool(value: bool) -> i32 {
    i32::from(value)
}

/// A bitmap file format identifier (`FREE_IMAGE_FORMAT`).
///
/// The set is open: plugins registered at runtime receive identifiers past
/// the built-in ones, so this is a newtype rather than a closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ImageFormat(pub i32);

impl ImageFormat {
    pub const UNKNOWN: Self = Self(-1);
    pub const BMP: Self = Self(0);
    pub const ICO: Self = Self(1);
    pub const JPEG: Self = Self(2);
    pub const JNG: Self = Self(3);
    pub const KOALA: Self = Self(4);
    pub const LBM: Self = Self(5);
    pub const IFF: Self = Self::LBM;
    pub const MNG: Self = Self(6);
    pub const PBM: Self = Self(7);
    pub const PBMRAW: Self = Self(8);
    pub const PCD: Self = Self(9);
    pub const PCX: Self = Self(10);
    pub const PGM: Self = Self(11);
    pub const PGMRAW: Self = Self(12);
    pub const PNG: Self = Self(13);
    pub const PPM: Self = Self(14);
    pub const PPMRAW: Self = Self(15);
    pub const RAS: Self = Self(16);
    pub const TARGA: Self = Self(17);
    pub const TIFF: Self = Self(18);
    pub const WBMP: Self = Self(19);
    pub const PSD: Self = Self(20);
    pub const CUT: Self = Self(21);
    pub const XBM: Self = Self(22);
    pub const XPM: Self = Self(23);
    pub const DDS: Self = Self(24);
    pub const GIF: Self = Self(25);
    pub const HDR: Self = Self(26);
    pub const FAXG3: Self = Self(27);
    pub const SGI: Self = Self(28);
    pub const EXR: Self = Self(29);
    pub const J2K: Self = Self(30);
    pub const JP2: Self = Self(31);
    pub const PFM: Self = Self(32);
    pub const PICT: Self = Self(33);
    pub const RAW: Self = Self(34);
    pub const WEBP: Self = Self(35);
    pub const JXR: Self = Self(36);

    pub fn is_known(self) -> bool {
        self != Self::UNKNOWN
    }
}

macro_rules! native_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident = $value:literal,)+ }
        fallback = $fallback:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)+
        }

        impl $name {
            /// The numeric constant the native library uses for this value.
            pub fn raw(self) -> i32 {
                self as i32
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                match value {
                    $($value => $name::$variant,)+
                    _ => $name::$fallback,
                }
            }
        }
    };
}

native_enum! {
    /// Pixel storage type of a bitmap (`FREE_IMAGE_TYPE`).
    pub enum ImageType {
        Unknown = 0,
        /// Standard image: 1-, 4-, 8-, 16-, 24-, 32-bit.
        Bitmap = 1,
        Uint16 = 2,
        Int16 = 3,
        Uint32 = 4,
        Int32 = 5,
        Float = 6,
        Double = 7,
        /// 2 x 64-bit IEEE floating point.
        Complex = 8,
        /// 3 x 16-bit.
        Rgb16 = 9,
        /// 4 x 16-bit.
        Rgba16 = 10,
        /// 3 x 32-bit IEEE floating point.
        Rgbf = 11,
        /// 4 x 32-bit IEEE floating point.
        Rgbaf = 12,
    }
    fallback = Unknown;
}

native_enum! {
    /// Colour model of a bitmap (`FREE_IMAGE_COLOR_TYPE`).
    pub enum ColorType {
        MinIsWhite = 0,
        MinIsBlack = 1,
        Rgb = 2,
        Palette = 3,
        RgbAlpha = 4,
        Cmyk = 5,
    }
    fallback = Rgb;
}

native_enum! {
    /// Colour quantization algorithm (`FREE_IMAGE_QUANTIZE`).
    pub enum Quantize {
        /// Xiaolin Wu.
        WuQuant = 0,
        /// NeuQuant neural-net.
        NnQuant = 1,
        /// Lossless fast pseudo-quantization.
        LfpQuant = 2,
    }
    fallback = WuQuant;
}

native_enum! {
    /// Dithering algorithm (`FREE_IMAGE_DITHER`).
    pub enum Dither {
        FloydSteinberg = 0,
        Bayer4x4 = 1,
        Bayer8x8 = 2,
        Cluster6x6 = 3,
        Cluster8x8 = 4,
        Cluster16x16 = 5,
        Bayer16x16 = 6,
    }
    fallback = FloydSteinberg;
}

native_enum! {
    /// Tone mapping operator (`FREE_IMAGE_TMO`).
    pub enum ToneMap {
        Drago03 = 0,
        Reinhard05 = 1,
        Fattal02 = 2,
    }
    fallback = Drago03;
}

native_enum! {
    /// Lossless JPEG transformation (`FREE_IMAGE_JPEG_OPERATION`).
    pub enum JpegOperation {
        None = 0,
        FlipH = 1,
        FlipV = 2,
        Transpose = 3,
        Transverse = 4,
        Rotate90 = 5,
        Rotate180 = 6,
        Rotate270 = 7,
    }
    fallback = None;
}

native_enum! {
    /// Upsampling / downsampling filter (`FREE_IMAGE_FILTER`).
    pub enum Filter {
        Box = 0,
        Bicubic = 1,
        Bilinear = 2,
        BSpline = 3,
        CatmullRom = 4,
        Lanczos3 = 5,
    }
    fallback = Box;
}

native_enum! {
    /// Colour channel selector (`FREE_IMAGE_COLOR_CHANNEL`).
    pub enum ColorChannel {
        Rgb = 0,
        Red = 1,
        Green = 2,
        Blue = 3,
        Alpha = 4,
        Black = 5,
        /// Complex images: real part.
        Real = 6,
        /// Complex images: imaginary part.
        Imag = 7,
        /// Complex images: magnitude.
        Mag = 8,
        /// Complex images: phase.
        Phase = 9,
    }
    fallback = Rgb;
}

native_enum! {
    /// Metadata value type (`FREE_IMAGE_MDTYPE`).
    pub enum MetadataType {
        NoType = 0,
        Byte = 1,
        Ascii = 2,
        Short = 3,
        Long = 4,
        Rational = 5,
        SByte = 6,
        Undefined = 7,
        SShort = 8,
        SLong = 9,
        SRational = 10,
        Float = 11,
        Double = 12,
        Ifd = 13,
        Palette = 14,
        Long8 = 16,
        SLong8 = 17,
        Ifd8 = 18,
    }
    fallback = NoType;
}

native_enum! {
    /// Metadata model (`FREE_IMAGE_MDMODEL`).
    pub enum MetadataModel {
        NoData = -1,
        Comments = 0,
        ExifMain = 1,
        ExifExif = 2,
        ExifGps = 3,
        ExifMakerNote = 4,
        ExifInterop = 5,
        Iptc = 6,
        Xmp = 7,
        GeoTiff = 8,
        Animation = 9,
        Custom = 10,
        ExifRaw = 11,
    }
    fallback = NoData;
}

native_enum! {
    /// Origin for [`Stream::seek`](crate::Stream::seek).
    pub enum SeekOrigin {
        Set = 0,
        Current = 1,
        End = 2,
    }
    fallback = Set;
}

/// Flag values shared by the load and save routines.
pub mod flags {
    pub const DEFAULT: i32 = 0;
    /// Load the header only, without pixels.
    pub const LOAD_NOPIXELS: i32 = 0x8000;

    pub const BMP_SAVE_RLE: i32 = 1;
    pub const GIF_LOAD256: i32 = 1;
    pub const GIF_PLAYBACK: i32 = 2;
    pub const ICO_MAKEALPHA: i32 = 1;
    pub const JPEG_FAST: i32 = 0x0001;
    pub const JPEG_ACCURATE: i32 = 0x0002;
    pub const JPEG_CMYK: i32 = 0x0004;
    pub const JPEG_EXIFROTATE: i32 = 0x0008;
    pub const JPEG_GREYSCALE: i32 = 0x0010;
    pub const JPEG_QUALITYSUPERB: i32 = 0x80;
    pub const JPEG_QUALITYGOOD: i32 = 0x0100;
    pub const JPEG_QUALITYNORMAL: i32 = 0x0200;
    pub const JPEG_QUALITYAVERAGE: i32 = 0x0400;
    pub const JPEG_QUALITYBAD: i32 = 0x0800;
    pub const JPEG_PROGRESSIVE: i32 = 0x2000;
    pub const JPEG_OPTIMIZE: i32 = 0x20000;
    pub const JPEG_BASELINE: i32 = 0x40000;
    pub const PNG_IGNOREGAMMA: i32 = 1;
    pub const PNG_Z_BEST_SPEED: i32 = 0x0001;
    pub const PNG_Z_DEFAULT_COMPRESSION: i32 = 0x0006;
    pub const PNG_Z_BEST_COMPRESSION: i32 = 0x0009;
    pub const PNG_Z_NO_COMPRESSION: i32 = 0x0100;
    pub const PNG_INTERLACED: i32 = 0x0200;
    pub const TIFF_CMYK: i32 = 0x0001;
    pub const TIFF_PACKBITS: i32 = 0x0100;
    pub const TIFF_DEFLATE: i32 = 0x0200;
    pub const TIFF_ADOBE_DEFLATE: i32 = 0x0400;
    pub const TIFF_NONE: i32 = 0x0800;
    pub const TIFF_LZW: i32 = 0x4000;

    /// `FreeImage_FillBackground` / `EnlargeCanvas` / `AllocateEx` options.
    pub const COLOR_IS_RGB_COLOR: i32 = 0x00;
    pub const COLOR_IS_RGBA_COLOR: i32 = 0x01;
    pub const COLOR_FIND_EQUAL_COLOR: i32 = 0x02;
    pub const COLOR_ALPHA_IS_INDEX: i32 = 0x04;
    pub const COLOR_PALETTE_SEARCH_MASK: i32 =
        COLOR_FIND_EQUAL_COLOR | COLOR_ALPHA_IS_INDEX;

    /// `FreeImage_RescaleRect` flags.
    pub const RESCALE_DEFAULT: u32 = 0x00;
    pub const RESCALE_TRUE_COLOR: u32 = 0x01;
    pub const RESCALE_OMIT_METADATA: u32 = 0x02;
}

/// A palette entry / colour value (`RGBQUAD`).
///
/// The byte order follows the native library's colour order, which is tied
/// to endianness: blue-green-red-reserved on little-endian hosts and
/// red-green-blue-reserved on big-endian ones. Use the accessors rather than
/// indexing the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct RgbQuad(pub [u8; 4]);

#[cfg(target_endian = "little")]
const RED: usize = 2;
#[cfg(target_endian = "little")]
const BLUE: usize = 0;
#[cfg(target_endian = "big")]
const RED: usize = 0;
#[cfg(target_endian = "big")]
const BLUE: usize = 2;
const GREEN: usize = 1;
const RESERVED: usize = 3;

impl RgbQuad {
    pub fn new(red: u8, green: u8, blue: u8, reserved: u8) -> Self {
        let mut bytes = [0u8; 4];
        bytes[RED] = red;
        bytes[GREEN] = green;
        bytes[BLUE] = blue;
        bytes[RESERVED] = reserved;
        RgbQuad(bytes)
    }

    pub fn red(&self) -> u8 {
        self.0[RED]
    }

    pub fn green(&self) -> u8 {
        self.0[GREEN]
    }

    pub fn blue(&self) -> u8 {
        self.0[BLUE]
    }

    /// The fourth byte: alpha for 32-bit images, palette index for some
    /// background colour calls, unused otherwise.
    pub fn reserved(&self) -> u8 {
        self.0[RESERVED]
    }
}

/// `BITMAPINFOHEADER`, byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct BitmapInfoHeader {
    pub size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub size_image: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub clr_used: u32,
    pub clr_important: u32,
}

/// `BITMAPINFO`: the header followed inline by the first palette entry.
/// Further entries continue in memory past the end of this struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct BitmapInfo {
    pub header: BitmapInfoHeader,
    pub colors: [RgbQuad; 1],
}

/// `FIICCPROFILE`. The profile bytes are owned by the bitmap.
#[derive(Debug)]
#[repr(C)]
pub struct IccProfile {
    pub flags: u16,
    pub size: u32,
    pub data: *mut c_void,
}

impl IccProfile {
    /// Set when the profile describes CMYK data.
    pub const FLAG_IS_CMYK: u16 = 0x01;

    /// The profile bytes, or an empty slice when no profile is attached.
    pub fn bytes(&self) -> &[u8] {
        if self.data.is_null() || self.size == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.data as *const u8, self.size as usize) }
    }

    pub fn is_cmyk(&self) -> bool {
        self.flags & Self::FLAG_IS_CMYK != 0
    }
}
