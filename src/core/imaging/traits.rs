//! The image collaborator seam.

use crate::core::config::Geometry;
use crate::error::ImageError;
use image::{DynamicImage, RgbImage};
use std::path::Path;

/// Everything the pipeline needs from an image library.
///
/// Implementations are shared by every worker, so they must be `Send + Sync`
/// and take `&self`.
pub trait ImageEngine: Send + Sync {
    /// Read and decode a file into pixels
    fn decode(&self, path: &Path) -> Result<DynamicImage, ImageError>;

    /// Stretch to exactly `geometry`, ignoring aspect ratio
    fn resize(&self, image: &DynamicImage, geometry: Geometry) -> Result<DynamicImage, ImageError>;

    /// Convert to 8-bit RGB, dropping any alpha channel
    fn normalize(&self, image: DynamicImage) -> RgbImage;

    /// Fraction of pixels (0.0 - 1.0) that differ beyond `fuzz`
    fn distortion(&self, a: &RgbImage, b: &RgbImage, fuzz: f64) -> f64;

    /// Raw EXIF capture timestamp, if the file has one
    fn capture_timestamp(&self, path: &Path) -> Result<Option<String>, ImageError>;

    /// Write an uncompressed 8-bit fingerprint file
    fn write_fingerprint(&self, image: &RgbImage, path: &Path) -> Result<(), ImageError>;

    /// Decode, resize and normalize in one step
    fn fingerprint(&self, path: &Path, geometry: Geometry) -> Result<RgbImage, ImageError> {
        let decoded = self.decode(path)?;
        let resized = self.resize(&decoded, geometry)?;
        Ok(self.normalize(resized))
    }
}
