//! # Scanner Module
//!
//! Discovers files and hands them to the worker pool.
//!
//! - [`DirectoryWalker`] enumerates a tree on its own thread
//! - [`PathQueue`] carries paths from the walker to the workers
//! - [`ImageFilter`] decides which paths the workers actually process
//!
//! The walker never filters: every non-directory entry is queued, and each
//! consumer applies the extension allow-list.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg)
//! - PNG (.png)
//! - TIFF (.tif, .tiff)
//! - BMP, GIF, WebP
//! - Camera raw (.cr2, .nef, .arw, .dng) via the embedded preview
//!
//! ## Example
//! ```rust,ignore
//! let queue = Arc::new(PathQueue::new());
//! let mut walker = DirectoryWalker::new("/photos", WalkConfig::default(), Arc::clone(&queue));
//! walker.start()?;
//! loop {
//!     match queue.pop_timeout(backoff) {
//!         PopResult::Item(path) => println!("{}", path.display()),
//!         PopResult::Empty => continue,
//!         PopResult::Drained => break,
//!     }
//! }
//! walker.join()?;
//! ```

mod filter;
mod queue;
mod walker;

pub use filter::ImageFilter;
pub use queue::{PathQueue, PopResult};
pub use walker::{DirectoryWalker, WalkConfig, WalkState, WalkStats};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats the decoder distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Tiff,
    Bmp,
    Gif,
    WebP,
    /// Camera raw container with an embedded JPEG preview
    Raw,
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "png" => ImageFormat::Png,
            "tif" | "tiff" => ImageFormat::Tiff,
            "bmp" => ImageFormat::Bmp,
            "gif" => ImageFormat::Gif,
            "webp" => ImageFormat::WebP,
            "cr2" | "nef" | "arw" | "dng" => ImageFormat::Raw,
            _ => ImageFormat::Unknown,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(ImageFormat::Unknown)
    }

    /// Whether the container can hold an EXIF block at all.
    ///
    /// BMP and GIF have nowhere to put one, so their capture time is
    /// simply absent.
    pub fn carries_exif(&self) -> bool {
        !matches!(self, ImageFormat::Bmp | ImageFormat::Gif | ImageFormat::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension_ignores_case() {
        assert_eq!(ImageFormat::from_extension("JPG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("jpeg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("TiFf"), ImageFormat::Tiff);
        assert_eq!(ImageFormat::from_extension("CR2"), ImageFormat::Raw);
    }

    #[test]
    fn format_from_path_without_extension_is_unknown() {
        assert_eq!(
            ImageFormat::from_path(Path::new("/photos/README")),
            ImageFormat::Unknown
        );
    }

    #[test]
    fn only_exif_capable_containers_carry_exif() {
        assert!(ImageFormat::Jpeg.carries_exif());
        assert!(ImageFormat::Tiff.carries_exif());
        assert!(ImageFormat::Raw.carries_exif());
        assert!(!ImageFormat::Bmp.carries_exif());
        assert!(!ImageFormat::Gif.carries_exif());
        assert!(!ImageFormat::Unknown.carries_exif());
    }
}
