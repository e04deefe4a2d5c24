//! Comparison settings shared by the fingerprint store and the task bodies.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Fixed comparison geometry. Aspect ratio is ignored when resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(100, 100)
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Configuration for fingerprint generation and matching.
///
/// Distortion scores are the fraction of pixels (0.0 - 1.0) whose colour
/// distance exceeds the fuzz tolerance; fuzz is a fraction of the largest
/// possible RGB distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Size every fingerprint and candidate is resized to
    pub geometry: Geometry,
    /// Scores below this are "identical"
    pub identical_below: f64,
    /// Scores below this (and not identical) are "similar"
    pub similar_below: f64,
    /// Default colour tolerance for matching
    pub fuzz: f64,
    /// Extension of written fingerprint files
    pub output_extension: String,
}

impl FingerprintConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            geometry: Geometry::default(),
            identical_below: 0.01,
            similar_below: 0.10,
            // Roughly 10000 on a 16-bit quantum scale.
            fuzz: 0.15,
            output_extension: "tif".to_string(),
        }
    }

    pub fn geometry(mut self, width: u32, height: u32) -> Self {
        self.geometry = Geometry::new(width, height);
        self
    }

    pub fn thresholds(mut self, identical_below: f64, similar_below: f64) -> Self {
        self.identical_below = identical_below;
        self.similar_below = similar_below;
        self
    }

    pub fn fuzz(mut self, fuzz: f64) -> Self {
        self.fuzz = fuzz;
        self
    }

    /// Reject geometry, thresholds or fuzz that cannot produce meaningful scores
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.geometry.width == 0 || self.geometry.height == 0 {
            return Err(ConfigError::InvalidGeometry {
                width: self.geometry.width,
                height: self.geometry.height,
            });
        }
        validate_fuzz(self.fuzz)?;
        crate::core::fingerprint::MatchPolicy::new(self.identical_below, self.similar_below)
            .map(|_| ())
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Fuzz must be a finite fraction
pub fn validate_fuzz(fuzz: f64) -> Result<(), ConfigError> {
    if fuzz.is_finite() && (0.0..=1.0).contains(&fuzz) {
        Ok(())
    } else {
        Err(ConfigError::InvalidFuzz { value: fuzz })
    }
}
