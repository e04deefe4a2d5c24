//! # Reporter Module
//!
//! Hands duplicate pairs to whatever reviews them next.
//!
//! Duplicate matching only reports candidates; a person decides what to do
//! with them. The pair list is exported in a format a review tool can load:
//! - **JSON**: array of `{candidate, reference, label, kind, distortion}`
//! - **CSV**: one row per pair with a header line

mod export;

pub use export::{
    export_pairs_csv, export_pairs_json, export_pairs_to_file, ExportFormat, ReviewPair,
};
