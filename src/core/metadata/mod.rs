//! # Metadata Module
//!
//! Reads the capture timestamp from a photo's EXIF data without decoding
//! any pixels.
//!
//! ## Lookup order
//! 1. `DateTimeOriginal` (when the shutter fired)
//! 2. `DateTime` (last modification, written by most cameras as well)
//!
//! EXIF stores timestamps as `YYYY:MM:DD HH:MM:SS`; output uses
//! `YYYY-MM-DD HH:MM:SS`.

use crate::core::scanner::ImageFormat;
use crate::error::ImageError;
use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const EXIF_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Read the raw capture timestamp string.
///
/// Returns `Ok(None)` when the format has no room for EXIF (BMP, GIF),
/// when the file has no EXIF data, or when neither tag is present. A file
/// that cannot be opened or whose container is corrupt is an error.
pub fn read_capture_timestamp(path: &Path) -> Result<Option<String>, ImageError> {
    if !ImageFormat::from_path(path).carries_exif() {
        return Ok(None);
    }

    let file = File::open(path).map_err(|e| ImageError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(None),
        Err(e) => {
            return Err(ImageError::Metadata {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    let timestamp = [Tag::DateTimeOriginal, Tag::DateTime]
        .into_iter()
        .find_map(|tag| exif.get_field(tag, In::PRIMARY).and_then(|f| ascii_value(&f.value)));

    Ok(timestamp)
}

/// Convert an EXIF timestamp to `YYYY-MM-DD HH:MM:SS`.
///
/// Returns `None` if the value is not a valid EXIF date (including the
/// all-zero or blank placeholders some cameras write).
pub fn canonical_timestamp(raw: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(raw.trim(), EXIF_FORMAT)
        .ok()
        .map(|dt| dt.format(OUTPUT_FORMAT).to_string())
}

fn ascii_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        let bytes = vec.first()?;
        let text = std::str::from_utf8(bytes).ok()?;
        let trimmed = text.trim_end_matches('\0').trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    None
}
