//! Extension allow-list applied by every consumer.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const DEFAULT_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tif", "tiff", "bmp", "gif", "webp", "cr2", "nef", "arw", "dng",
];

/// Decides whether a path is an image the pipeline should process.
///
/// The decision is a pure function of the extension, compared
/// case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFilter {
    extensions: HashSet<String>,
}

impl ImageFilter {
    /// Create a filter with the default raster and raw extensions
    pub fn new() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Override the list of extensions to accept
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Check if a file should be processed
    pub fn is_supported(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.extensions.contains(&ext.to_lowercase()),
            None => false,
        }
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}
