//! The table of bound native functions.
//!
//! Every pointer result in this table is either a handle (released by its own
//! native call) or memory owned by the library or by a handle, so all
//! prototypes use [`Ownership::Borrowed`](crate::Ownership::Borrowed).

use crate::{CallResult, Error, Prototype, Ty, Value, invoke, library};

macro_rules! prototypes {
    ($($ident:ident = $name:literal ($($param:ident),*) -> $ret:ident;)+) => {
        $(
            pub(crate) static $ident: Prototype =
                Prototype::new($name, &[$(Ty::$param),*], Ty::$ret);
        )+

        /// Every prototype in the table, in declaration order.
        pub static ALL: &[&Prototype] = &[$(&$ident),+];
    };
}

/// Calls `prototype` through the process-wide library.
///
/// # Safety
///
/// See [`Resolved::call`](crate::Resolved::call).
pub(crate) unsafe fn call(
    prototype: &'static Prototype,
    args: Vec<Value<'_>>,
) -> Result<CallResult, Error> {
    unsafe { invoke(library(), prototype, args) }
}

prototypes! {
    // Init / version
    INITIALISE = "FreeImage_Initialise"(I32) -> Void;
    DEINITIALISE = "FreeImage_DeInitialise"() -> Void;
    GET_VERSION = "FreeImage_GetVersion"() -> Pointer;
    GET_COPYRIGHT_MESSAGE = "FreeImage_GetCopyrightMessage"() -> Pointer;
    SET_OUTPUT_MESSAGE = "FreeImage_SetOutputMessage"(Pointer) -> Void;
    IS_LITTLE_ENDIAN = "FreeImage_IsLittleEndian"() -> I32;
    LOOKUP_X11_COLOR = "FreeImage_LookupX11Color"(Pointer, Pointer, Pointer, Pointer) -> I32;
    LOOKUP_SVG_COLOR = "FreeImage_LookupSVGColor"(Pointer, Pointer, Pointer, Pointer) -> I32;

    // Allocate / clone / unload
    ALLOCATE = "FreeImage_Allocate"(I32, I32, I32, U32, U32, U32) -> Pointer;
    ALLOCATE_T = "FreeImage_AllocateT"(I32, I32, I32, I32, U32, U32, U32) -> Pointer;
    ALLOCATE_EX = "FreeImage_AllocateEx"(I32, I32, I32, Pointer, I32, Pointer, U32, U32, U32) -> Pointer;
    ALLOCATE_EX_T = "FreeImage_AllocateExT"(I32, I32, I32, I32, Pointer, I32, Pointer, U32, U32, U32) -> Pointer;
    CLONE = "FreeImage_Clone"(Pointer) -> Pointer;
    UNLOAD = "FreeImage_Unload"(Pointer) -> Void;
    HAS_PIXELS = "FreeImage_HasPixels"(Pointer) -> I32;

    // File I/O
    LOAD = "FreeImage_Load"(I32, Pointer, I32) -> Pointer;
    SAVE = "FreeImage_Save"(I32, Pointer, Pointer, I32) -> I32;
    GET_FILE_TYPE = "FreeImage_GetFileType"(Pointer, I32) -> I32;
    VALIDATE = "FreeImage_Validate"(I32, Pointer) -> I32;

    // Memory streams
    OPEN_MEMORY = "FreeImage_OpenMemory"(Pointer, U32) -> Pointer;
    CLOSE_MEMORY = "FreeImage_CloseMemory"(Pointer) -> Void;
    LOAD_FROM_MEMORY = "FreeImage_LoadFromMemory"(I32, Pointer, I32) -> Pointer;
    SAVE_TO_MEMORY = "FreeImage_SaveToMemory"(I32, Pointer, Pointer, I32) -> I32;
    TELL_MEMORY = "FreeImage_TellMemory"(Pointer) -> Long;
    SEEK_MEMORY = "FreeImage_SeekMemory"(Pointer, Long, I32) -> I32;
    ACQUIRE_MEMORY = "FreeImage_AcquireMemory"(Pointer, Pointer, Pointer) -> I32;
    READ_MEMORY = "FreeImage_ReadMemory"(Pointer, U32, U32, Pointer) -> U32;
    WRITE_MEMORY = "FreeImage_WriteMemory"(Pointer, U32, U32, Pointer) -> U32;
    GET_FILE_TYPE_FROM_MEMORY = "FreeImage_GetFileTypeFromMemory"(Pointer, I32) -> I32;
    VALIDATE_FROM_MEMORY = "FreeImage_ValidateFromMemory"(I32, Pointer) -> I32;
    LOAD_MULTI_BITMAP_FROM_MEMORY = "FreeImage_LoadMultiBitmapFromMemory"(I32, Pointer, I32) -> Pointer;
    SAVE_MULTI_BITMAP_TO_MEMORY = "FreeImage_SaveMultiBitmapToMemory"(I32, Pointer, Pointer, I32) -> I32;

    // Plugins
    GET_FIF_COUNT = "FreeImage_GetFIFCount"() -> I32;
    SET_PLUGIN_ENABLED = "FreeImage_SetPluginEnabled"(I32, I32) -> I32;
    IS_PLUGIN_ENABLED = "FreeImage_IsPluginEnabled"(I32) -> I32;
    GET_FIF_FROM_FORMAT = "FreeImage_GetFIFFromFormat"(Pointer) -> I32;
    GET_FIF_FROM_MIME = "FreeImage_GetFIFFromMime"(Pointer) -> I32;
    GET_FORMAT_FROM_FIF = "FreeImage_GetFormatFromFIF"(I32) -> Pointer;
    GET_FIF_EXTENSION_LIST = "FreeImage_GetFIFExtensionList"(I32) -> Pointer;
    GET_FIF_DESCRIPTION = "FreeImage_GetFIFDescription"(I32) -> Pointer;
    GET_FIF_MIME_TYPE = "FreeImage_GetFIFMimeType"(I32) -> Pointer;
    GET_FIF_FROM_FILENAME = "FreeImage_GetFIFFromFilename"(Pointer) -> I32;
    FIF_SUPPORTS_READING = "FreeImage_FIFSupportsReading"(I32) -> I32;
    FIF_SUPPORTS_WRITING = "FreeImage_FIFSupportsWriting"(I32) -> I32;
    FIF_SUPPORTS_EXPORT_BPP = "FreeImage_FIFSupportsExportBPP"(I32, I32) -> I32;
    FIF_SUPPORTS_EXPORT_TYPE = "FreeImage_FIFSupportsExportType"(I32, I32) -> I32;
    FIF_SUPPORTS_ICC_PROFILES = "FreeImage_FIFSupportsICCProfiles"(I32) -> I32;
    FIF_SUPPORTS_NO_PIXELS = "FreeImage_FIFSupportsNoPixels"(I32) -> I32;

    // Multipage
    OPEN_MULTI_BITMAP = "FreeImage_OpenMultiBitmap"(I32, Pointer, I32, I32, I32, I32) -> Pointer;
    CLOSE_MULTI_BITMAP = "FreeImage_CloseMultiBitmap"(Pointer, I32) -> I32;
    GET_PAGE_COUNT = "FreeImage_GetPageCount"(Pointer) -> I32;
    APPEND_PAGE = "FreeImage_AppendPage"(Pointer, Pointer) -> Void;
    INSERT_PAGE = "FreeImage_InsertPage"(Pointer, I32, Pointer) -> Void;
    DELETE_PAGE = "FreeImage_DeletePage"(Pointer, I32) -> Void;
    LOCK_PAGE = "FreeImage_LockPage"(Pointer, I32) -> Pointer;
    UNLOCK_PAGE = "FreeImage_UnlockPage"(Pointer, Pointer, I32) -> Void;
    MOVE_PAGE = "FreeImage_MovePage"(Pointer, I32, I32) -> I32;
    GET_LOCKED_PAGE_NUMBERS = "FreeImage_GetLockedPageNumbers"(Pointer, Pointer, Pointer) -> I32;

    // Bitmap information
    GET_IMAGE_TYPE = "FreeImage_GetImageType"(Pointer) -> I32;
    GET_BITS = "FreeImage_GetBits"(Pointer) -> Pointer;
    GET_SCAN_LINE = "FreeImage_GetScanLine"(Pointer, I32) -> Pointer;
    GET_PIXEL_INDEX = "FreeImage_GetPixelIndex"(Pointer, U32, U32, Pointer) -> I32;
    GET_PIXEL_COLOR = "FreeImage_GetPixelColor"(Pointer, U32, U32, Pointer) -> I32;
    SET_PIXEL_INDEX = "FreeImage_SetPixelIndex"(Pointer, U32, U32, Pointer) -> I32;
    SET_PIXEL_COLOR = "FreeImage_SetPixelColor"(Pointer, U32, U32, Pointer) -> I32;
    GET_COLORS_USED = "FreeImage_GetColorsUsed"(Pointer) -> U32;
    GET_BPP = "FreeImage_GetBPP"(Pointer) -> U32;
    GET_WIDTH = "FreeImage_GetWidth"(Pointer) -> U32;
    GET_HEIGHT = "FreeImage_GetHeight"(Pointer) -> U32;
    GET_LINE = "FreeImage_GetLine"(Pointer) -> U32;
    GET_PITCH = "FreeImage_GetPitch"(Pointer) -> U32;
    GET_DIB_SIZE = "FreeImage_GetDIBSize"(Pointer) -> U32;
    GET_MEMORY_SIZE = "FreeImage_GetMemorySize"(Pointer) -> U32;
    GET_PALETTE = "FreeImage_GetPalette"(Pointer) -> Pointer;
    GET_DOTS_PER_METER_X = "FreeImage_GetDotsPerMeterX"(Pointer) -> U32;
    GET_DOTS_PER_METER_Y = "FreeImage_GetDotsPerMeterY"(Pointer) -> U32;
    SET_DOTS_PER_METER_X = "FreeImage_SetDotsPerMeterX"(Pointer, U32) -> Void;
    SET_DOTS_PER_METER_Y = "FreeImage_SetDotsPerMeterY"(Pointer, U32) -> Void;
    GET_INFO_HEADER = "FreeImage_GetInfoHeader"(Pointer) -> Pointer;
    GET_INFO = "FreeImage_GetInfo"(Pointer) -> Pointer;
    GET_COLOR_TYPE = "FreeImage_GetColorType"(Pointer) -> I32;
    GET_RED_MASK = "FreeImage_GetRedMask"(Pointer) -> U32;
    GET_GREEN_MASK = "FreeImage_GetGreenMask"(Pointer) -> U32;
    GET_BLUE_MASK = "FreeImage_GetBlueMask"(Pointer) -> U32;
    GET_TRANSPARENCY_COUNT = "FreeImage_GetTransparencyCount"(Pointer) -> U32;
    GET_TRANSPARENCY_TABLE = "FreeImage_GetTransparencyTable"(Pointer) -> Pointer;
    SET_TRANSPARENT = "FreeImage_SetTransparent"(Pointer, I32) -> Void;
    SET_TRANSPARENCY_TABLE = "FreeImage_SetTransparencyTable"(Pointer, Pointer, I32) -> Void;
    IS_TRANSPARENT = "FreeImage_IsTransparent"(Pointer) -> I32;
    SET_TRANSPARENT_INDEX = "FreeImage_SetTransparentIndex"(Pointer, I32) -> Void;
    GET_TRANSPARENT_INDEX = "FreeImage_GetTransparentIndex"(Pointer) -> I32;
    HAS_BACKGROUND_COLOR = "FreeImage_HasBackgroundColor"(Pointer) -> I32;
    GET_BACKGROUND_COLOR = "FreeImage_GetBackgroundColor"(Pointer, Pointer) -> I32;
    SET_BACKGROUND_COLOR = "FreeImage_SetBackgroundColor"(Pointer, Pointer) -> I32;
    GET_THUMBNAIL = "FreeImage_GetThumbnail"(Pointer) -> Pointer;
    SET_THUMBNAIL = "FreeImage_SetThumbnail"(Pointer, Pointer) -> I32;
    GET_ICC_PROFILE = "FreeImage_GetICCProfile"(Pointer) -> Pointer;
    CREATE_ICC_PROFILE = "FreeImage_CreateICCProfile"(Pointer, Pointer, Long) -> Pointer;
    DESTROY_ICC_PROFILE = "FreeImage_DestroyICCProfile"(Pointer) -> Void;

    // Conversion
    CONVERT_TO_4_BITS = "FreeImage_ConvertTo4Bits"(Pointer) -> Pointer;
    CONVERT_TO_8_BITS = "FreeImage_ConvertTo8Bits"(Pointer) -> Pointer;
    CONVERT_TO_GREYSCALE = "FreeImage_ConvertToGreyscale"(Pointer) -> Pointer;
    CONVERT_TO_16_BITS_555 = "FreeImage_ConvertTo16Bits555"(Pointer) -> Pointer;
    CONVERT_TO_16_BITS_565 = "FreeImage_ConvertTo16Bits565"(Pointer) -> Pointer;
    CONVERT_TO_24_BITS = "FreeImage_ConvertTo24Bits"(Pointer) -> Pointer;
    CONVERT_TO_32_BITS = "FreeImage_ConvertTo32Bits"(Pointer) -> Pointer;
    COLOR_QUANTIZE = "FreeImage_ColorQuantize"(Pointer, I32) -> Pointer;
    COLOR_QUANTIZE_EX = "FreeImage_ColorQuantizeEx"(Pointer, I32, I32, I32, Pointer) -> Pointer;
    THRESHOLD = "FreeImage_Threshold"(Pointer, U8) -> Pointer;
    DITHER = "FreeImage_Dither"(Pointer, I32) -> Pointer;
    CONVERT_FROM_RAW_BITS = "FreeImage_ConvertFromRawBits"(Pointer, I32, I32, I32, U32, U32, U32, U32, I32) -> Pointer;
    CONVERT_FROM_RAW_BITS_EX = "FreeImage_ConvertFromRawBitsEx"(I32, Pointer, I32, I32, I32, I32, U32, U32, U32, U32, I32) -> Pointer;
    CONVERT_TO_RAW_BITS = "FreeImage_ConvertToRawBits"(Pointer, Pointer, I32, U32, U32, U32, U32, I32) -> Void;
    CONVERT_TO_FLOAT = "FreeImage_ConvertToFloat"(Pointer) -> Pointer;
    CONVERT_TO_RGBF = "FreeImage_ConvertToRGBF"(Pointer) -> Pointer;
    CONVERT_TO_RGBAF = "FreeImage_ConvertToRGBAF"(Pointer) -> Pointer;
    CONVERT_TO_UINT16 = "FreeImage_ConvertToUINT16"(Pointer) -> Pointer;
    CONVERT_TO_RGB16 = "FreeImage_ConvertToRGB16"(Pointer) -> Pointer;
    CONVERT_TO_RGBA16 = "FreeImage_ConvertToRGBA16"(Pointer) -> Pointer;
    CONVERT_TO_STANDARD_TYPE = "FreeImage_ConvertToStandardType"(Pointer, I32) -> Pointer;
    CONVERT_TO_TYPE = "FreeImage_ConvertToType"(Pointer, I32, I32) -> Pointer;

    // Tone mapping
    TONE_MAPPING = "FreeImage_ToneMapping"(Pointer, I32, F64, F64) -> Pointer;
    TMO_DRAGO03 = "FreeImage_TmoDrago03"(Pointer, F64, F64) -> Pointer;
    TMO_REINHARD05 = "FreeImage_TmoReinhard05"(Pointer, F64, F64) -> Pointer;
    TMO_REINHARD05_EX = "FreeImage_TmoReinhard05Ex"(Pointer, F64, F64, F64, F64) -> Pointer;
    TMO_FATTAL02 = "FreeImage_TmoFattal02"(Pointer, F64, F64) -> Pointer;

    // Compression
    ZLIB_COMPRESS = "FreeImage_ZLibCompress"(Pointer, U32, Pointer, U32) -> U32;
    ZLIB_UNCOMPRESS = "FreeImage_ZLibUncompress"(Pointer, U32, Pointer, U32) -> U32;
    ZLIB_GZIP = "FreeImage_ZLibGZip"(Pointer, U32, Pointer, U32) -> U32;
    ZLIB_GUNZIP = "FreeImage_ZLibGUnzip"(Pointer, U32, Pointer, U32) -> U32;
    ZLIB_CRC32 = "FreeImage_ZLibCRC32"(U32, Pointer, U32) -> U32;

    // Tags
    CREATE_TAG = "FreeImage_CreateTag"() -> Pointer;
    DELETE_TAG = "FreeImage_DeleteTag"(Pointer) -> Void;
    CLONE_TAG = "FreeImage_CloneTag"(Pointer) -> Pointer;
    GET_TAG_KEY = "FreeImage_GetTagKey"(Pointer) -> Pointer;
    GET_TAG_DESCRIPTION = "FreeImage_GetTagDescription"(Pointer) -> Pointer;
    GET_TAG_ID = "FreeImage_GetTagID"(Pointer) -> U16;
    GET_TAG_TYPE = "FreeImage_GetTagType"(Pointer) -> I32;
    GET_TAG_COUNT = "FreeImage_GetTagCount"(Pointer) -> U32;
    GET_TAG_LENGTH = "FreeImage_GetTagLength"(Pointer) -> U32;
    GET_TAG_VALUE = "FreeImage_GetTagValue"(Pointer) -> Pointer;
    SET_TAG_KEY = "FreeImage_SetTagKey"(Pointer, Pointer) -> I32;
    SET_TAG_DESCRIPTION = "FreeImage_SetTagDescription"(Pointer, Pointer) -> I32;
    SET_TAG_ID = "FreeImage_SetTagID"(Pointer, U16) -> I32;
    SET_TAG_TYPE = "FreeImage_SetTagType"(Pointer, I32) -> I32;
    SET_TAG_COUNT = "FreeImage_SetTagCount"(Pointer, U32) -> I32;
    SET_TAG_LENGTH = "FreeImage_SetTagLength"(Pointer, U32) -> I32;
    SET_TAG_VALUE = "FreeImage_SetTagValue"(Pointer, Pointer) -> I32;

    // Metadata
    FIND_FIRST_METADATA = "FreeImage_FindFirstMetadata"(I32, Pointer, Pointer) -> Pointer;
    FIND_NEXT_METADATA = "FreeImage_FindNextMetadata"(Pointer, Pointer) -> I32;
    FIND_CLOSE_METADATA = "FreeImage_FindCloseMetadata"(Pointer) -> Void;
    SET_METADATA = "FreeImage_SetMetadata"(I32, Pointer, Pointer, Pointer) -> I32;
    GET_METADATA = "FreeImage_GetMetadata"(I32, Pointer, Pointer, Pointer) -> I32;
    SET_METADATA_KEY_VALUE = "FreeImage_SetMetadataKeyValue"(I32, Pointer, Pointer, Pointer) -> I32;
    GET_METADATA_COUNT = "FreeImage_GetMetadataCount"(I32, Pointer) -> U32;
    CLONE_METADATA = "FreeImage_CloneMetadata"(Pointer, Pointer) -> I32;
    TAG_TO_STRING = "FreeImage_TagToString"(I32, Pointer, Pointer) -> Pointer;

    // JPEG lossless transformations
    JPEG_TRANSFORM = "FreeImage_JPEGTransform"(Pointer, Pointer, I32, I32) -> I32;
    JPEG_CROP = "FreeImage_JPEGCrop"(Pointer, Pointer, I32, I32, I32, I32) -> I32;
    JPEG_TRANSFORM_COMBINED = "FreeImage_JPEGTransformCombined"(Pointer, Pointer, I32, Pointer, Pointer, Pointer, Pointer, I32) -> I32;
    JPEG_TRANSFORM_COMBINED_FROM_MEMORY = "FreeImage_JPEGTransformCombinedFromMemory"(Pointer, Pointer, I32, Pointer, Pointer, Pointer, Pointer, I32) -> I32;

    // Rotation, flipping and rescaling
    ROTATE = "FreeImage_Rotate"(Pointer, F64, Pointer) -> Pointer;
    ROTATE_EX = "FreeImage_RotateEx"(Pointer, F64, F64, F64, F64, F64, I32) -> Pointer;
    FLIP_HORIZONTAL = "FreeImage_FlipHorizontal"(Pointer) -> I32;
    FLIP_VERTICAL = "FreeImage_FlipVertical"(Pointer) -> I32;
    RESCALE = "FreeImage_Rescale"(Pointer, I32, I32, I32) -> Pointer;
    MAKE_THUMBNAIL = "FreeImage_MakeThumbnail"(Pointer, I32, I32) -> Pointer;
    RESCALE_RECT = "FreeImage_RescaleRect"(Pointer, I32, I32, I32, I32, I32, I32, I32, U32) -> Pointer;

    // Colour manipulation
    ADJUST_CURVE = "FreeImage_AdjustCurve"(Pointer, Pointer, I32) -> I32;
    ADJUST_GAMMA = "FreeImage_AdjustGamma"(Pointer, F64) -> I32;
    ADJUST_BRIGHTNESS = "FreeImage_AdjustBrightness"(Pointer, F64) -> I32;
    ADJUST_CONTRAST = "FreeImage_AdjustContrast"(Pointer, F64) -> I32;
    INVERT = "FreeImage_Invert"(Pointer) -> I32;
    GET_HISTOGRAM = "FreeImage_GetHistogram"(Pointer, Pointer, I32) -> I32;
    GET_ADJUST_COLORS_LOOKUP_TABLE = "FreeImage_GetAdjustColorsLookupTable"(Pointer, F64, F64, F64, I32) -> I32;
    ADJUST_COLORS = "FreeImage_AdjustColors"(Pointer, F64, F64, F64, I32) -> I32;
    APPLY_COLOR_MAPPING = "FreeImage_ApplyColorMapping"(Pointer, Pointer, Pointer, U32, I32, I32) -> U32;
    SWAP_COLORS = "FreeImage_SwapColors"(Pointer, Pointer, Pointer, I32) -> U32;
    APPLY_PALETTE_INDEX_MAPPING = "FreeImage_ApplyPaletteIndexMapping"(Pointer, Pointer, Pointer, U32, I32) -> U32;
    SWAP_PALETTE_INDICES = "FreeImage_SwapPaletteIndices"(Pointer, Pointer, Pointer) -> U32;

    // Channels
    GET_CHANNEL = "FreeImage_GetChannel"(Pointer, I32) -> Pointer;
    SET_CHANNEL = "FreeImage_SetChannel"(Pointer, Pointer, I32) -> I32;
    GET_COMPLEX_CHANNEL = "FreeImage_GetComplexChannel"(Pointer, I32) -> Pointer;
    SET_COMPLEX_CHANNEL = "FreeImage_SetComplexChannel"(Pointer, Pointer, I32) -> I32;

    // Copy / paste / composite
    COPY = "FreeImage_Copy"(Pointer, I32, I32, I32, I32) -> Pointer;
    PASTE = "FreeImage_Paste"(Pointer, Pointer, I32, I32, I32) -> I32;
    CREATE_VIEW = "FreeImage_CreateView"(Pointer, U32, U32, U32, U32) -> Pointer;
    COMPOSITE = "FreeImage_Composite"(Pointer, I32, Pointer, Pointer) -> Pointer;
    PRE_MULTIPLY_WITH_ALPHA = "FreeImage_PreMultiplyWithAlpha"(Pointer) -> I32;

    // Background filling
    FILL_BACKGROUND = "FreeImage_FillBackground"(Pointer, Pointer, I32) -> I32;
    ENLARGE_CANVAS = "FreeImage_EnlargeCanvas"(Pointer, I32, I32, I32, I32, Pointer, I32) -> Pointer;

    // Miscellaneous algorithms
    MULTIGRID_POISSON_SOLVER = "FreeImage_MultigridPoissonSolver"(Pointer, I32) -> Pointer;
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_symbol_is_bound_once() {
        let mut seen = HashSet::new();
        for prototype in ALL {
            assert!(prototype.name.starts_with("FreeImage_"), "{}", prototype.name);
            assert!(seen.insert(prototype.name), "{} bound twice", prototype.name);
        }
    }

    #[test]
    fn corrected_signatures() {
        assert_eq!(INVERT.params, &[Ty::Pointer]);
        assert_eq!(ADJUST_CURVE.params, &[Ty::Pointer, Ty::Pointer, Ty::I32]);
        assert_eq!(COMPOSITE.arity(), 4);
        assert_eq!(JPEG_TRANSFORM_COMBINED.params[2], Ty::I32);
        assert_eq!(TELL_MEMORY.ret, Ty::Long);
        assert_eq!(GET_PALETTE.ret, Ty::Pointer);
        assert_eq!(CONVERT_FROM_RAW_BITS_EX.arity(), 11);
    }
}
