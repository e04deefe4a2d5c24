//! # Imaging Module
//!
//! Decoding, resizing and comparing images.
//!
//! The pipeline only talks to the [`ImageEngine`] trait; [`PixelEngine`] is
//! the production implementation. Tests swap in engines with fixed scores.
//!
//! ## Fast paths
//! - Files of 1MB and more are memory-mapped
//! - Non-images are rejected from their magic bytes before decoding
//! - JPEG uses zune-jpeg, falling back to the image crate
//! - Camera raw files use their embedded preview JPEG
//! - Resizing uses SIMD kernels from fast_image_resize

mod bytes;
mod decode;
mod engine;
mod metric;
mod resize;
mod traits;

pub use bytes::{read_file_bytes, validate_image_header, FileBytes};
pub use decode::decode_path;
pub use engine::PixelEngine;
pub use metric::{fuzzy_distortion, MAX_RGB_DISTANCE};
pub use resize::FastResizer;
pub use traits::ImageEngine;
