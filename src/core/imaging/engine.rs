//! Default [`ImageEngine`] built on image, zune-jpeg and fast_image_resize.

use super::decode::decode_path;
use super::metric::fuzzy_distortion;
use super::resize::FastResizer;
use super::traits::ImageEngine;
use crate::core::config::Geometry;
use crate::core::metadata;
use crate::error::ImageError;
use image::{DynamicImage, ImageFormat as Codec, RgbImage};
use std::path::Path;

/// Pixel-level image engine
#[derive(Debug, Default, Clone, Copy)]
pub struct PixelEngine;

impl PixelEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ImageEngine for PixelEngine {
    fn decode(&self, path: &Path) -> Result<DynamicImage, ImageError> {
        decode_path(path)
    }

    fn resize(&self, image: &DynamicImage, geometry: Geometry) -> Result<DynamicImage, ImageError> {
        FastResizer::new()
            .resize_rgb(image, geometry)
            .map(DynamicImage::ImageRgb8)
    }

    fn normalize(&self, image: DynamicImage) -> RgbImage {
        image.into_rgb8()
    }

    fn distortion(&self, a: &RgbImage, b: &RgbImage, fuzz: f64) -> f64 {
        fuzzy_distortion(a, b, fuzz)
    }

    fn capture_timestamp(&self, path: &Path) -> Result<Option<String>, ImageError> {
        metadata::read_capture_timestamp(path)
    }

    fn write_fingerprint(&self, image: &RgbImage, path: &Path) -> Result<(), ImageError> {
        // The image crate's TIFF encoder writes uncompressed strips.
        image
            .save_with_format(path, Codec::Tiff)
            .map_err(|e| ImageError::Encode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn fingerprint_has_fixed_geometry_and_rgb_pixels() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("wide.png");
        RgbaImage::from_pixel(320, 120, Rgba([200, 10, 10, 128]))
            .save(&path)
            .unwrap();

        let engine = PixelEngine::new();
        let fingerprint = engine.fingerprint(&path, Geometry::new(50, 50)).unwrap();

        assert_eq!(fingerprint.dimensions(), (50, 50));
    }

    #[test]
    fn written_fingerprint_reloads_with_same_pixels() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ref.tif");
        let image = RgbImage::from_fn(20, 20, |x, y| Rgb([x as u8 * 10, y as u8 * 10, 77]));

        let engine = PixelEngine::new();
        engine.write_fingerprint(&image, &path).unwrap();
        let reloaded = engine.normalize(engine.decode(&path).unwrap());

        assert_eq!(engine.distortion(&image, &reloaded, 0.0), 0.0);
    }

    #[test]
    fn png_without_exif_has_no_timestamp() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("plain.png");
        RgbImage::new(4, 4).save(&path).unwrap();

        assert_eq!(PixelEngine::new().capture_timestamp(&path).unwrap(), None);
    }
}
