//! # Error Module
//!
//! Error types for the fingerprint pipeline.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, values, what went wrong
//! - **Fatal vs. per-item** - configuration errors stop a run before it starts,
//!   image errors are recovered one file at a time

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Invalid settings, detected before any pipeline starts
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{path} is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("Invalid thread count: {value} (must be at least 1)")]
    InvalidConcurrency { value: usize },

    #[error("Invalid thresholds: identical below {low}, similar below {high} (need 0 <= low <= high)")]
    InvalidThresholds { low: f64, high: f64 },

    #[error("Invalid fuzz factor: {value} (must be between 0 and 1)")]
    InvalidFuzz { value: f64 },

    #[error("Invalid fingerprint geometry: {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },
}

/// Errors raised while enumerating a directory tree
#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Walker for {root} was already started")]
    AlreadyStarted { root: PathBuf },

    #[error("Failed to spawn walker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Walker thread for {root} panicked")]
    Panicked { root: PathBuf },
}

/// Errors from the image collaborator, recovered per file
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Failed to open image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Resize failed: {reason}")]
    Resize { reason: String },

    #[error("Failed to write fingerprint {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("Failed to read metadata from {path}: {reason}")]
    Metadata { path: PathBuf, reason: String },

    #[error("Worker panicked while processing {path}")]
    Panicked { path: PathBuf },
}

/// Errors from the worker pool itself
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
}

/// Errors while writing the review pair list
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize pairs: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, FingerprintError>;
