//! Export of candidate duplicate pairs for an external review tool.
//!
//! Supports a JSON array and CSV.

use crate::core::fingerprint::{DuplicateMatch, MatchKind};
use crate::error::ExportError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

/// One row of the review list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPair {
    pub candidate: PathBuf,
    pub reference: PathBuf,
    pub label: String,
    pub kind: MatchKind,
    pub distortion: f64,
}

impl From<&DuplicateMatch> for ReviewPair {
    fn from(found: &DuplicateMatch) -> Self {
        Self {
            candidate: found.candidate.clone(),
            reference: found.reference.clone(),
            label: found.reference_label.clone(),
            kind: found.kind,
            distortion: found.distortion,
        }
    }
}

/// Write pairs as a pretty-printed JSON array
pub fn export_pairs_json<W: Write>(
    matches: &[DuplicateMatch],
    writer: W,
) -> Result<(), ExportError> {
    let pairs: Vec<ReviewPair> = matches.iter().map(ReviewPair::from).collect();
    serde_json::to_writer_pretty(writer, &pairs)?;
    Ok(())
}

/// Write pairs as CSV
///
/// Columns: Candidate, Reference, Label, Kind, Distortion
pub fn export_pairs_csv<W: Write>(
    matches: &[DuplicateMatch],
    mut writer: W,
) -> std::io::Result<()> {
    writeln!(writer, "Candidate,Reference,Label,Kind,Distortion")?;

    for found in matches {
        writeln!(
            writer,
            "{},{},{},{},{:.6}",
            csv_field(&found.candidate.display().to_string()),
            csv_field(&found.reference.display().to_string()),
            csv_field(&found.reference_label),
            found.kind,
            found.distortion
        )?;
    }

    Ok(())
}

/// Write the pair list to a file in the chosen format
pub fn export_pairs_to_file(
    matches: &[DuplicateMatch],
    path: &Path,
    format: ExportFormat,
) -> Result<(), ExportError> {
    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    match format {
        ExportFormat::Json => export_pairs_json(matches, &mut writer)?,
        ExportFormat::Csv => export_pairs_csv(matches, &mut writer).map_err(io_error)?,
    }
    writer.flush().map_err(io_error)
}

/// Quote a field if it contains a delimiter, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
