//! Format-aware image decoding.
//!
//! JPEG goes through zune-jpeg first, with the image crate as fallback.
//! Camera raw files are not demosaiced: their embedded EXIF preview JPEG is
//! decoded instead, which is plenty for a small comparison thumbnail.

use super::bytes::{read_file_bytes, validate_image_header};
use crate::core::scanner::ImageFormat;
use crate::error::ImageError;
use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decode a file into pixels using the fastest decoder for its format.
pub fn decode_path(path: &Path) -> Result<DynamicImage, ImageError> {
    let bytes = read_file_bytes(path)?;
    if !validate_image_header(&bytes) {
        return Err(ImageError::Decode {
            path: path.to_path_buf(),
            reason: "not a recognised image header".to_string(),
        });
    }

    match ImageFormat::from_path(path) {
        ImageFormat::Jpeg => decode_jpeg(path, &bytes).or_else(|e| {
            debug!("zune-jpeg failed, falling back: {}", e);
            decode_generic(path, &bytes)
        }),
        ImageFormat::Raw => decode_raw_preview(path, &bytes),
        _ => decode_generic(path, &bytes),
    }
}

/// JPEG decoding through zune-jpeg
fn decode_jpeg(path: &Path, bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);

    let pixels = decoder.decode().map_err(|e| ImageError::Decode {
        path: path.to_path_buf(),
        reason: format!("zune-jpeg decode failed: {:?}", e),
    })?;

    let info = decoder.info().ok_or_else(|| ImageError::Decode {
        path: path.to_path_buf(),
        reason: "missing JPEG frame info".to_string(),
    })?;
    let width = info.width as u32;
    let height = info.height as u32;
    let bad_buffer = || ImageError::Decode {
        path: path.to_path_buf(),
        reason: "decoded buffer does not match dimensions".to_string(),
    };

    match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
        ColorSpace::RGB => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(bad_buffer),
        ColorSpace::RGBA => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(bad_buffer),
        ColorSpace::Luma => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(bad_buffer),
        other => Err(ImageError::Decode {
            path: path.to_path_buf(),
            reason: format!("unsupported JPEG colorspace {:?}", other),
        }),
    }
}

/// Everything the image crate understands, format sniffed from content
fn decode_generic(path: &Path, bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes).map_err(|e| ImageError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Decode the preview JPEG a raw file carries in its EXIF thumbnail IFD.
fn decode_raw_preview(path: &Path, bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    let preview = embedded_preview(bytes).ok_or_else(|| ImageError::Decode {
        path: path.to_path_buf(),
        reason: "raw file has no embedded preview".to_string(),
    })?;

    decode_jpeg(path, preview).or_else(|_| decode_generic(path, preview))
}

fn embedded_preview(bytes: &[u8]) -> Option<&[u8]> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;

    let offset = exif
        .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    let length = exif
        .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;

    // Offsets are relative to the TIFF header, which starts the file for
    // every TIFF-based raw container.
    let end = offset.checked_add(length)?;
    bytes.get(offset..end).filter(|preview| !preview.is_empty())
}
