//! # Core Module
//!
//! The UI-agnostic fingerprinting engine.
//!
//! ## Modules
//! - `scanner` - Walks directories into a shared path queue
//! - `imaging` - Decodes, resizes and compares images
//! - `metadata` - Reads EXIF capture timestamps
//! - `fingerprint` - Reference store and match policy
//! - `pipeline` - Walker plus worker pool running one task per file
//! - `reporter` - Exports duplicate pairs for review
//! - `output` - Line sinks for task results
//! - `config` - Comparison settings

pub mod config;
pub mod fingerprint;
pub mod imaging;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod reporter;
pub mod scanner;

// Re-export commonly used types
pub use config::{FingerprintConfig, Geometry};
pub use fingerprint::{DuplicateMatch, Fingerprint, FingerprintStore, MatchKind, MatchPolicy};
pub use imaging::{ImageEngine, PixelEngine};
pub use output::{LineSink, MemorySink, StdoutSink};
pub use pipeline::{CancellationToken, Pipeline, PipelineResult, WorkerTask};
pub use scanner::{DirectoryWalker, ImageFilter, PathQueue, PopResult, WalkConfig};
