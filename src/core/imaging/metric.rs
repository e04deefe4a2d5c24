//! Fuzzy pixel-difference metric.
//!
//! The score is the fraction of pixel positions whose RGB colour distance
//! exceeds the fuzz tolerance, so `0.0` means "every pixel within tolerance"
//! and `1.0` means "every pixel differs".

use image::RgbImage;

/// Largest possible Euclidean distance between two 8-bit RGB colours
pub const MAX_RGB_DISTANCE: f64 = 441.672_955_930_063_7; // sqrt(3) * 255

/// Score two images of the same geometry.
///
/// `fuzz` is a fraction of [`MAX_RGB_DISTANCE`]; pixels closer than that
/// count as equal. Images with different dimensions score `1.0`.
pub fn fuzzy_distortion(a: &RgbImage, b: &RgbImage, fuzz: f64) -> f64 {
    if a.dimensions() != b.dimensions() {
        return 1.0;
    }
    let total = a.width() as u64 * a.height() as u64;
    if total == 0 {
        return 0.0;
    }

    let tolerance = fuzz.clamp(0.0, 1.0) * MAX_RGB_DISTANCE;
    let tolerance_sq = tolerance * tolerance;

    let differing = a
        .pixels()
        .zip(b.pixels())
        .filter(|(p, q)| {
            let distance_sq: f64 = p
                .0
                .iter()
                .zip(q.0.iter())
                .map(|(x, y)| {
                    let d = f64::from(*x) - f64::from(*y);
                    d * d
                })
                .sum();
            distance_sq > tolerance_sq
        })
        .count() as u64;

    differing as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn flat(colour: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(10, 10, Rgb(colour))
    }

    #[test]
    fn identical_images_score_zero() {
        let image = flat([12, 34, 56]);
        assert_eq!(fuzzy_distortion(&image, &image.clone(), 0.0), 0.0);
    }

    #[test]
    fn opposite_images_score_one() {
        assert_eq!(fuzzy_distortion(&flat([0, 0, 0]), &flat([255, 255, 255]), 0.15), 1.0);
    }

    #[test]
    fn fuzz_absorbs_small_differences() {
        let a = flat([100, 100, 100]);
        let b = flat([105, 100, 100]);
        assert_eq!(fuzzy_distortion(&a, &b, 0.0), 1.0);
        assert_eq!(fuzzy_distortion(&a, &b, 0.15), 0.0);
    }

    #[test]
    fn score_is_fraction_of_differing_pixels() {
        let a = flat([0, 0, 0]);
        let mut b = a.clone();
        for x in 0..10 {
            b.put_pixel(x, 0, Rgb([255, 0, 0]));
        }
        let score = fuzzy_distortion(&a, &b, 0.15);
        assert!((score - 0.10).abs() < 1e-9);
    }

    #[test]
    fn mismatched_geometry_scores_one() {
        let a = RgbImage::new(10, 10);
        let b = RgbImage::new(10, 11);
        assert_eq!(fuzzy_distortion(&a, &b, 0.5), 1.0);
    }
}
