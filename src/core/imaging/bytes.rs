//! Memory-mapped file reads and cheap header checks.
//!
//! Large files are mapped instead of copied into a heap buffer; small files
//! are read normally since mapping has a fixed setup cost.

use crate::error::ImageError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Files at or above this size are memory-mapped (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Read a file, mapping it when it is large.
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, ImageError> {
    let io_error = |source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(io_error)?;
    if metadata.len() < MMAP_THRESHOLD {
        return std::fs::read(path).map(FileBytes::Vec).map_err(io_error);
    }

    let file = File::open(path).map_err(io_error)?;
    // SAFETY: the mapping is read-only and the file handle outlives it
    // inside `Mmap`. A concurrent truncation by another process is the
    // usual mmap caveat and surfaces as a decode failure at worst.
    let mmap = unsafe { Mmap::map(&file) }.map_err(io_error)?;
    Ok(FileBytes::Mmap(mmap))
}

/// File contents, either owned or memory-mapped
pub enum FileBytes {
    Vec(Vec<u8>),
    Mmap(Mmap),
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}

/// Magic-byte check that rejects non-images before a full decode.
///
/// Camera raw files (CR2, NEF, ARW, DNG) are TIFF containers and pass the
/// TIFF check.
pub fn validate_image_header(bytes: &[u8]) -> bool {
    if bytes.len() < 8 {
        return false;
    }

    const SIGNATURES: &[&[u8]] = &[
        &[0xFF, 0xD8, 0xFF],                                     // JPEG
        &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],       // PNG
        b"GIF8",                                                 // GIF
        b"BM",                                                   // BMP
        &[0x49, 0x49, 0x2A, 0x00],                               // TIFF, little endian
        &[0x4D, 0x4D, 0x00, 0x2A],                               // TIFF, big endian
    ];

    if SIGNATURES.iter().any(|sig| bytes.starts_with(sig)) {
        return true;
    }

    bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP"
}
