//! SIMD-accelerated resizing to the comparison geometry.
//!
//! Uses fast_image_resize, which picks AVX2/NEON kernels when available.
//! Output is always 8-bit RGB and aspect ratio is not preserved.

use crate::core::config::Geometry;
use crate::error::ImageError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, RgbImage};

/// Reusable resizer; keeps its scratch buffers between calls
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Stretch `image` to exactly `geometry`, converting to RGB first.
    pub fn resize_rgb(
        &mut self,
        image: &DynamicImage,
        geometry: Geometry,
    ) -> Result<RgbImage, ImageError> {
        if geometry.width == 0 || geometry.height == 0 {
            return Err(ImageError::Resize {
                reason: format!("invalid destination geometry {}", geometry),
            });
        }

        let rgb = image.to_rgb8();
        let (src_width, src_height) = rgb.dimensions();
        if src_width == 0 || src_height == 0 {
            return Err(ImageError::Resize {
                reason: "source image is empty".to_string(),
            });
        }
        if (src_width, src_height) == (geometry.width, geometry.height) {
            return Ok(rgb);
        }

        let src = Image::from_vec_u8(src_width, src_height, rgb.into_raw(), PixelType::U8x3)
            .map_err(|e| ImageError::Resize {
                reason: format!("invalid source buffer: {}", e),
            })?;
        let mut dst = Image::new(geometry.width, geometry.height, PixelType::U8x3);

        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
        self.resizer
            .resize(&src, &mut dst, &options)
            .map_err(|e| ImageError::Resize {
                reason: e.to_string(),
            })?;

        RgbImage::from_raw(geometry.width, geometry.height, dst.into_vec()).ok_or_else(|| {
            ImageError::Resize {
                reason: "resized buffer does not match geometry".to_string(),
            }
        })
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}
