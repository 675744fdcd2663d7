use crate::constants::{MAX_QUALITY, MIN_QUALITY};
use crate::error::{ResizeError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::error::{
    ImageFormatHint, LimitError, LimitErrorKind, UnsupportedError, UnsupportedErrorKind,
};
use image::{
    ColorType, DynamicImage, ImageBuffer, ImageDecoder, ImageError, ImageFormat, ImageReader,
};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

/// Largest pixel buffer a tolerant decode will allocate.
const MAX_DECODE_BYTES: u64 = 512 * 1024 * 1024;

/// How strictly pixel data must decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Any decoder error fails the file.
    Strict,
    /// Once the header parses, a pixel-data error keeps the rows decoded so
    /// far and leaves the remainder zero-filled.
    #[default]
    Tolerant,
}

/// Reads and decodes an image file.
///
/// Content sniffing wins over `format_hint`; the hint only matters when the
/// magic bytes are unrecognisable.
///
/// # Errors
/// * `ResizeError::Io` if the file cannot be read
/// * `ResizeError::Decode` if no usable image can be produced
pub fn decode(path: &Path, format_hint: Option<ImageFormat>, mode: DecodeMode) -> Result<DynamicImage> {
    let bytes = fs::read(path)?;
    decode_bytes(path, &bytes, format_hint, mode).map_err(|e| ResizeError::decode(path, e))
}

fn decode_bytes(
    path: &Path,
    bytes: &[u8],
    format_hint: Option<ImageFormat>,
    mode: DecodeMode,
) -> std::result::Result<DynamicImage, ImageError> {
    let mut reader = ImageReader::new(Cursor::new(bytes));
    if let Some(format) = format_hint {
        reader.set_format(format);
    }
    let reader = reader.with_guessed_format()?;

    match mode {
        DecodeMode::Strict => reader.decode(),
        DecodeMode::Tolerant => decode_tolerant(path, reader),
    }
}

fn decode_tolerant(
    path: &Path,
    reader: ImageReader<Cursor<&[u8]>>,
) -> std::result::Result<DynamicImage, ImageError> {
    let decoder = reader.into_decoder()?;
    let (width, height) = decoder.dimensions();
    let color = decoder.color_type();

    let too_large = || ImageError::Limits(LimitError::from_kind(LimitErrorKind::InsufficientMemory));
    let total_bytes = decoder.total_bytes();
    if total_bytes > MAX_DECODE_BYTES {
        return Err(too_large());
    }
    let len = usize::try_from(total_bytes).map_err(|_| too_large())?;

    let mut buf = vec![0u8; len];
    if let Err(e) = decoder.read_image(&mut buf) {
        warn!(path = %path.display(), "Keeping partial decode: {}", e);
    }

    image_from_raw(width, height, color, buf).ok_or_else(|| {
        ImageError::Unsupported(UnsupportedError::from_format_and_kind(
            ImageFormatHint::Unknown,
            UnsupportedErrorKind::Color(color.into()),
        ))
    })
}

fn image_from_raw(width: u32, height: u32, color: ColorType, buf: Vec<u8>) -> Option<DynamicImage> {
    match color {
        ColorType::L8 => ImageBuffer::from_raw(width, height, buf).map(DynamicImage::ImageLuma8),
        ColorType::La8 => ImageBuffer::from_raw(width, height, buf).map(DynamicImage::ImageLumaA8),
        ColorType::Rgb8 => ImageBuffer::from_raw(width, height, buf).map(DynamicImage::ImageRgb8),
        ColorType::Rgba8 => ImageBuffer::from_raw(width, height, buf).map(DynamicImage::ImageRgba8),
        ColorType::L16 => {
            ImageBuffer::from_raw(width, height, ne_u16(&buf)).map(DynamicImage::ImageLuma16)
        }
        ColorType::La16 => {
            ImageBuffer::from_raw(width, height, ne_u16(&buf)).map(DynamicImage::ImageLumaA16)
        }
        ColorType::Rgb16 => {
            ImageBuffer::from_raw(width, height, ne_u16(&buf)).map(DynamicImage::ImageRgb16)
        }
        ColorType::Rgba16 => {
            ImageBuffer::from_raw(width, height, ne_u16(&buf)).map(DynamicImage::ImageRgba16)
        }
        ColorType::Rgb32F => {
            ImageBuffer::from_raw(width, height, ne_f32(&buf)).map(DynamicImage::ImageRgb32F)
        }
        ColorType::Rgba32F => {
            ImageBuffer::from_raw(width, height, ne_f32(&buf)).map(DynamicImage::ImageRgba32F)
        }
        _ => None,
    }
}

// Decoders write wide samples in native byte order.
fn ne_u16(buf: &[u8]) -> Vec<u16> {
    buf.chunks_exact(2)
        .map(|c| u16::from_ne_bytes([c[0], c[1]]))
        .collect()
}

fn ne_f32(buf: &[u8]) -> Vec<f32> {
    buf.chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Converts any representation to 8-bit RGB or 8-bit grayscale.
///
/// Only plain 8-bit RGB and 8-bit grayscale pass through. Everything else,
/// 16-bit grayscale included, becomes RGB; alpha is dropped.
pub fn normalize_color_mode(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => image,
        other => {
            debug!("Converting {:?} to RGB", other.color());
            DynamicImage::ImageRgb8(other.to_rgb8())
        }
    }
}

/// JPEG-encodes a normalized image at `quality`.
pub fn encode(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        return Err(ResizeError::InvalidQuality(quality, MIN_QUALITY, MAX_QUALITY));
    }

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    image.write_with_encoder(encoder)?;
    Ok(buf)
}
