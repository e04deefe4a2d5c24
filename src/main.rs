//! # photo-fingerprint CLI
//!
//! Command-line interface for the near-duplicate photo finder.
//!
//! ## Usage
//! ```bash
//! photo-fingerprint generate -s ~/Pictures/keepers -d ~/fingerprints
//! photo-fingerprint find-duplicates -s ~/fingerprints -d /mnt/archive --pairs pairs.json
//! photo-fingerprint extract-metadata -s ~/Pictures
//! ```

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
