//! Per-file task bodies run by the worker pool.

use super::pool::ItemOutcome;
use crate::core::config::FingerprintConfig;
use crate::core::fingerprint::{DuplicateMatch, Fingerprint, FingerprintStore};
use crate::core::imaging::ImageEngine;
use crate::core::metadata::canonical_timestamp;
use crate::core::output::LineSink;
use crate::error::ImageError;
use crate::events::{Event, EventSender, MatchEvent, PipelinePhase};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// What a pipeline run does with each supported file.
///
/// Built once per run and shared read-only by every worker.
#[derive(Debug, Clone)]
pub enum WorkerTask {
    /// Write a fingerprint for every image into `destination`
    Generate { destination: PathBuf },
    /// Print each image's capture timestamp
    ExtractMetadata,
    /// Compare every image against the loaded references
    FindDuplicates {
        store: Arc<FingerprintStore>,
        fuzz: f64,
    },
}

impl WorkerTask {
    pub fn kind(&self) -> TaskKind {
        match self {
            WorkerTask::Generate { .. } => TaskKind::Generate,
            WorkerTask::ExtractMetadata => TaskKind::ExtractMetadata,
            WorkerTask::FindDuplicates { .. } => TaskKind::FindDuplicates,
        }
    }
}

/// Task discriminant, reported in results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    Load,
    Generate,
    ExtractMetadata,
    FindDuplicates,
}

impl TaskKind {
    pub fn phase(&self) -> PipelinePhase {
        match self {
            TaskKind::Load => PipelinePhase::Loading,
            TaskKind::Generate => PipelinePhase::Generating,
            TaskKind::ExtractMetadata => PipelinePhase::ExtractingMetadata,
            TaskKind::FindDuplicates => PipelinePhase::Matching,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Load => write!(f, "load"),
            TaskKind::Generate => write!(f, "generate"),
            TaskKind::ExtractMetadata => write!(f, "extract-metadata"),
            TaskKind::FindDuplicates => write!(f, "find-duplicates"),
        }
    }
}

/// Shared collaborators every task body needs
pub(crate) struct TaskContext<'a> {
    pub engine: &'a dyn ImageEngine,
    pub config: &'a FingerprintConfig,
    pub sink: &'a dyn LineSink,
    pub events: &'a EventSender,
}

impl TaskContext<'_> {
    /// Decode, resize to the comparison geometry, write `<stem>.<ext>`.
    pub fn generate(&self, destination: &Path, path: &Path) -> Result<ItemOutcome, ImageError> {
        let stem = path.file_stem().ok_or_else(|| ImageError::Encode {
            path: path.to_path_buf(),
            reason: "file has no name".to_string(),
        })?;
        // Built by hand: `with_extension` would eat a dotted stem like `a.v2`.
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(&self.config.output_extension);
        let output = destination.join(name);

        let fingerprint = self.engine.fingerprint(path, self.config.geometry)?;
        self.engine.write_fingerprint(&fingerprint, &output)?;

        debug!(source = %path.display(), output = %output.display(), "fingerprint written");
        self.sink.write_line(&path.display().to_string());
        Ok(ItemOutcome::Processed)
    }

    /// Emit `path<TAB>timestamp` when the file carries a capture time.
    ///
    /// The image must decode; an unreadable file is a failure even when its
    /// EXIF block survived.
    pub fn extract_metadata(&self, path: &Path) -> Result<ItemOutcome, ImageError> {
        self.engine.decode(path)?;
        let Some(raw) = self.engine.capture_timestamp(path)? else {
            return Ok(ItemOutcome::NoData);
        };

        match canonical_timestamp(&raw) {
            Some(timestamp) => {
                self.sink
                    .write_line(&format!("{}\t{}", path.display(), timestamp));
                Ok(ItemOutcome::Processed)
            }
            None => {
                debug!(path = %path.display(), raw = %raw, "unparseable capture timestamp");
                Ok(ItemOutcome::NoData)
            }
        }
    }

    /// Compare one candidate against every reference.
    pub fn find_duplicates(
        &self,
        store: &FingerprintStore,
        fuzz: f64,
        path: &Path,
        found: &Mutex<Vec<DuplicateMatch>>,
    ) -> Result<ItemOutcome, ImageError> {
        let candidate = self.engine.fingerprint(path, self.config.geometry)?;
        let label = path.display().to_string();

        let matches: Vec<DuplicateMatch> = store
            .find_matches(&candidate, &label, fuzz, self.sink)
            .into_iter()
            .map(|m| DuplicateMatch {
                candidate: path.to_path_buf(),
                reference: m.fingerprint.path.clone(),
                reference_label: m.fingerprint.label.clone(),
                kind: m.kind,
                distortion: m.distortion,
            })
            .collect();

        for found_match in &matches {
            self.events
                .send(Event::Match(MatchEvent::Found(found_match.clone())));
        }
        found
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(matches);

        Ok(ItemOutcome::Processed)
    }

    /// Decode a reference fingerprint as-is (no resize) and keep it.
    pub fn load(
        &self,
        path: &Path,
        loaded: &Mutex<Vec<Fingerprint>>,
    ) -> Result<ItemOutcome, ImageError> {
        let image = self.engine.normalize(self.engine.decode(path)?);
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!(path = %path.display(), label = %label, "fingerprint loaded");
        loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Fingerprint::new(image, label, path));
        Ok(ItemOutcome::Processed)
    }
}
