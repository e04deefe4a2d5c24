//! # Photo Fingerprint
//!
//! Finds near-duplicate photos in large directory trees by comparing them
//! against a set of small reference "fingerprint" images.
//!
//! ## Workflow
//! 1. `generate` - write a fixed-size fingerprint for every reference photo
//! 2. `find-duplicates` - compare every photo in a tree against those
//!    fingerprints and report identical or similar ones
//! 3. `extract-metadata` - list capture timestamps
//!
//! Nothing is ever moved or deleted; matches are reported for review.
//!
//! ## Architecture
//! - `core` - Walker, worker pool, fingerprint store and image engine
//! - `events` - Progress events over a channel, for any UI
//! - `error` - Error types with paths and causes

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{FingerprintError, Result};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects `debug` and the
/// default is `warn`. Calling this more than once is harmless.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
