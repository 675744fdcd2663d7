//! Source format detection by file extension
//!
//! The enumerator decides eligibility from the extension alone; content
//! sniffing happens later, at decode time.

use crate::constants::{ALLOWED_EXTENSIONS, DENIED_EXTENSIONS};
use image::ImageFormat;
use std::fmt;
use std::path::Path;

/// Raster formats accepted as resize input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Tiff,
    WebP,
    Heic,
}

impl SourceFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(SourceFormat::Jpeg),
            "png" => Some(SourceFormat::Png),
            "gif" => Some(SourceFormat::Gif),
            "bmp" => Some(SourceFormat::Bmp),
            "tif" | "tiff" => Some(SourceFormat::Tiff),
            "webp" => Some(SourceFormat::WebP),
            "heic" | "heif" => Some(SourceFormat::Heic),
            _ => None,
        }
    }

    /// Decoder hint for the `image` crate. HEIC has no decoder there.
    pub fn image_format(&self) -> Option<ImageFormat> {
        match self {
            SourceFormat::Jpeg => Some(ImageFormat::Jpeg),
            SourceFormat::Png => Some(ImageFormat::Png),
            SourceFormat::Gif => Some(ImageFormat::Gif),
            SourceFormat::Bmp => Some(ImageFormat::Bmp),
            SourceFormat::Tiff => Some(ImageFormat::Tiff),
            SourceFormat::WebP => Some(ImageFormat::WebP),
            SourceFormat::Heic => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceFormat::Jpeg => "JPEG",
            SourceFormat::Png => "PNG",
            SourceFormat::Gif => "GIF",
            SourceFormat::Bmp => "BMP",
            SourceFormat::Tiff => "TIFF",
            SourceFormat::WebP => "WebP",
            SourceFormat::Heic => "HEIC",
        };
        write!(f, "{}", name)
    }
}

/// How the enumerator treats a path, decided by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionClass {
    Allowed(SourceFormat),
    /// Explicitly skipped and logged (PDF documents)
    Denied,
    /// Neither allowed nor denied; dropped without a trace
    Ignored,
}

pub fn classify_path(path: &Path) -> ExtensionClass {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return ExtensionClass::Ignored;
    };
    let ext_lower = ext.to_lowercase();

    if DENIED_EXTENSIONS.contains(&ext_lower.as_str()) {
        return ExtensionClass::Denied;
    }

    if ALLOWED_EXTENSIONS.contains(&ext_lower.as_str()) {
        if let Some(format) = SourceFormat::from_extension(&ext_lower) {
            return ExtensionClass::Allowed(format);
        }
    }

    ExtensionClass::Ignored
}
