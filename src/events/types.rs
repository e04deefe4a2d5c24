//! Event type definitions for progress reporting.

use crate::core::fingerprint::DuplicateMatch;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted while a pipeline runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Directory walker events
    Walk(WalkEvent),
    /// Per-item worker events
    Worker(WorkerEvent),
    /// Fingerprint match events
    Match(MatchEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events from the directory walker thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WalkEvent {
    /// Traversal has started
    Started { root: PathBuf },
    /// A directory has been fully enumerated
    Progress(WalkProgress),
    /// An entry could not be read; traversal continues
    Error { path: PathBuf, message: String },
    /// Traversal finished and the producer has been marked done
    Completed {
        files_queued: usize,
        directories_visited: usize,
    },
}

/// Walker progress after each directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkProgress {
    /// Directories enumerated so far
    pub directories_visited: usize,
    /// Paths pushed onto the queue so far
    pub files_queued: usize,
    /// Directory that was just enumerated
    pub current_dir: PathBuf,
}

/// Events from pool workers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkerEvent {
    /// A supported file went through the task body
    Processed(WorkProgress),
    /// A supported file failed and was skipped
    Failed { path: PathBuf, message: String },
}

/// Progress information after one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkProgress {
    /// Worker that handled the item
    pub worker: usize,
    /// Items completed by the whole pool so far (processed or failed)
    pub completed: usize,
    /// The item's path
    pub path: PathBuf,
}

/// Events from duplicate matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchEvent {
    /// A candidate matched a reference fingerprint
    Found(DuplicateMatch),
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// A run has started
    Started { phase: PipelinePhase },
    /// A run finished (possibly after cancellation)
    Completed { summary: PipelineSummary },
    /// Cancellation was observed
    Cancelled,
}

/// What a pipeline run is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Loading,
    Generating,
    ExtractingMetadata,
    Matching,
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Paths the walker pushed
    pub files_queued: usize,
    /// Items the task body completed
    pub processed: usize,
    /// Items that failed and were skipped
    pub failed: usize,
    /// Paths rejected by the extension filter
    pub unsupported: usize,
    /// Duplicate pairs reported
    pub matches: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Loading => write!(f, "Loading fingerprints"),
            PipelinePhase::Generating => write!(f, "Generating fingerprints"),
            PipelinePhase::ExtractingMetadata => write!(f, "Extracting metadata"),
            PipelinePhase::Matching => write!(f, "Comparing images"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_progress_round_trips_through_json() {
        let event = Event::Walk(WalkEvent::Progress(WalkProgress {
            directories_visited: 3,
            files_queued: 42,
            current_dir: PathBuf::from("/photos/2019"),
        }));

        let json = serde_json::to_string(&event).unwrap();
        let decoded: Event = serde_json::from_str(&json).unwrap();

        match decoded {
            Event::Walk(WalkEvent::Progress(p)) => {
                assert_eq!(p.files_queued, 42);
                assert_eq!(p.current_dir, PathBuf::from("/photos/2019"));
            }
            other => panic!("Wrong event type: {:?}", other),
        }
    }

    #[test]
    fn phase_display_is_human_readable() {
        assert_eq!(PipelinePhase::Matching.to_string(), "Comparing images");
        assert_eq!(PipelinePhase::Loading.to_string(), "Loading fingerprints");
    }
}
