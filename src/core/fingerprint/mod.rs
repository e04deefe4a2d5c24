//! # Fingerprint Module
//!
//! Reference fingerprints and matching against them.
//!
//! A fingerprint is a small, fixed-geometry RGB rendition of a photo. The
//! [`FingerprintStore`] holds the loaded references; candidates are scored
//! against every one of them and classified by a [`MatchPolicy`].

mod policy;
mod store;

pub use policy::MatchPolicy;
pub use store::{FingerprintStore, StoreMatch};

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A loaded reference image
#[derive(Debug, Clone)]
pub struct Fingerprint {
    /// Normalized pixels
    pub image: RgbImage,
    /// File stem of the fingerprint file
    pub label: String,
    /// Where the fingerprint was loaded from
    pub path: PathBuf,
}

impl Fingerprint {
    pub fn new(image: RgbImage, label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            image,
            label: label.into(),
            path: path.into(),
        }
    }
}

/// How close a candidate is to a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Identical,
    Similar,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::Identical => write!(f, "identical"),
            MatchKind::Similar => write!(f, "similar"),
        }
    }
}

/// One candidate/reference pair reported by duplicate matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    /// The searched file
    pub candidate: PathBuf,
    /// The fingerprint file it matched
    pub reference: PathBuf,
    /// Label of the fingerprint
    pub reference_label: String,
    pub kind: MatchKind,
    /// Fraction of differing pixels
    pub distortion: f64,
}

impl DuplicateMatch {
    /// The line printed for this match
    pub fn describe(&self) -> String {
        format!(
            "{} is {} to {}",
            self.candidate.display(),
            self.kind,
            self.reference_label
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_uses_candidate_path_and_label() {
        let found = DuplicateMatch {
            candidate: PathBuf::from("/photos/IMG_1.jpg"),
            reference: PathBuf::from("/refs/beach.tif"),
            reference_label: "beach".to_string(),
            kind: MatchKind::Similar,
            distortion: 0.04,
        };
        assert_eq!(found.describe(), "/photos/IMG_1.jpg is similar to beach");
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&MatchKind::Identical).unwrap();
        assert_eq!(json, "\"identical\"");
    }
}
