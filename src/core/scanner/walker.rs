//! Breadth-first directory walker running on its own thread.

use super::queue::PathQueue;
use crate::core::pipeline::CancellationToken;
use crate::error::WalkError;
use crate::events::{null_sender, Event, EventSender, WalkEvent, WalkProgress};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Configuration for the directory walker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Treat symlinked directories as directories (each visited once)
    pub follow_symlinks: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
        }
    }
}

/// Lifecycle of a walker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WalkState {
    NotStarted = 0,
    Traversing = 1,
    Completed = 2,
}

impl WalkState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WalkState::NotStarted,
            1 => WalkState::Traversing,
            _ => WalkState::Completed,
        }
    }
}

/// Counters reported when the walker thread finishes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Directories enumerated, root included
    pub directories_visited: usize,
    /// Paths pushed onto the queue
    pub files_queued: usize,
    /// Entries skipped because they could not be read
    pub errors: usize,
}

/// Enumerates a directory tree into a [`PathQueue`].
///
/// Every non-directory entry is pushed; directories are only descended when
/// [`WalkConfig::recursive`] is set and are never pushed themselves. The
/// root is not validated here.
pub struct DirectoryWalker {
    root: PathBuf,
    config: WalkConfig,
    queue: Arc<PathQueue>,
    state: Arc<AtomicU8>,
    events: EventSender,
    cancel: CancellationToken,
    handle: Option<JoinHandle<WalkStats>>,
}

impl DirectoryWalker {
    pub fn new(root: impl Into<PathBuf>, config: WalkConfig, queue: Arc<PathQueue>) -> Self {
        Self {
            root: root.into(),
            config,
            queue,
            state: Arc::new(AtomicU8::new(WalkState::NotStarted as u8)),
            events: null_sender(),
            cancel: CancellationToken::new(),
            handle: None,
        }
    }

    /// Report progress through an event channel
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Stop early when the token is cancelled
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> WalkState {
        WalkState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Spawn the traversal thread and return immediately.
    pub fn start(&mut self) -> Result<(), WalkError> {
        if self
            .state
            .compare_exchange(
                WalkState::NotStarted as u8,
                WalkState::Traversing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(WalkError::AlreadyStarted {
                root: self.root.clone(),
            });
        }

        let traversal = Traversal {
            root: self.root.clone(),
            config: self.config.clone(),
            events: self.events.clone(),
            cancel: self.cancel.clone(),
            finish: FinishGuard {
                queue: Arc::clone(&self.queue),
                state: Arc::clone(&self.state),
            },
        };

        let handle = thread::Builder::new()
            .name("directory-walker".to_string())
            .spawn(move || traversal.run())
            // The closure (and its guard) is dropped on spawn failure, which
            // still marks the queue done so consumers cannot hang.
            .map_err(WalkError::Spawn)?;

        self.handle = Some(handle);
        Ok(())
    }

    /// Block until the traversal thread has fully unwound.
    ///
    /// Joining a walker that was never started returns empty stats.
    pub fn join(&mut self) -> Result<WalkStats, WalkError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WalkError::Panicked {
                root: self.root.clone(),
            }),
            None => Ok(WalkStats::default()),
        }
    }
}

/// Marks the walk finished however the thread exits.
struct FinishGuard {
    queue: Arc<PathQueue>,
    state: Arc<AtomicU8>,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.state.store(WalkState::Completed as u8, Ordering::Release);
        self.queue.mark_producer_done();
    }
}

struct Traversal {
    root: PathBuf,
    config: WalkConfig,
    events: EventSender,
    cancel: CancellationToken,
    finish: FinishGuard,
}

impl Traversal {
    fn run(self) -> WalkStats {
        info!(root = %self.root.display(), recursive = self.config.recursive, "walk started");
        self.events.send(Event::Walk(WalkEvent::Started {
            root: self.root.clone(),
        }));

        let mut stats = WalkStats::default();
        let mut pending = VecDeque::from([self.root.clone()]);
        let mut visited = HashSet::new();
        if self.config.follow_symlinks {
            if let Ok(canonical) = self.root.canonicalize() {
                visited.insert(canonical);
            }
        }

        'dirs: while let Some(dir) = pending.pop_front() {
            if self.cancel.is_cancelled() {
                info!("walk cancelled");
                break;
            }
            stats.directories_visited += 1;
            debug!(dir = %dir.display(), "enumerating");

            let entries = WalkDir::new(&dir)
                .min_depth(1)
                .max_depth(1)
                .follow_links(self.config.follow_symlinks);

            for entry in entries {
                if self.cancel.is_cancelled() {
                    info!("walk cancelled");
                    break 'dirs;
                }

                match entry {
                    Ok(entry) if entry.file_type().is_dir() => {
                        if !self.config.recursive {
                            continue;
                        }
                        if self.config.follow_symlinks
                            && !self.first_visit(&mut visited, entry.path())
                        {
                            debug!(dir = %entry.path().display(), "already visited, skipping");
                            continue;
                        }
                        pending.push_back(entry.into_path());
                    }
                    Ok(entry) => {
                        if self.finish.queue.push(entry.into_path()) {
                            stats.files_queued += 1;
                        }
                    }
                    Err(e) => {
                        stats.errors += 1;
                        let path = e
                            .path()
                            .map(Path::to_path_buf)
                            .unwrap_or_else(|| dir.clone());
                        let error = classify_walk_error(&path, e);
                        warn!("skipping entry: {}", error);
                        self.events.send(Event::Walk(WalkEvent::Error {
                            path,
                            message: error.to_string(),
                        }));
                    }
                }
            }

            self.events.send(Event::Walk(WalkEvent::Progress(WalkProgress {
                directories_visited: stats.directories_visited,
                files_queued: stats.files_queued,
                current_dir: dir,
            })));
        }

        info!(
            files = stats.files_queued,
            directories = stats.directories_visited,
            errors = stats.errors,
            "walk completed"
        );
        self.events.send(Event::Walk(WalkEvent::Completed {
            files_queued: stats.files_queued,
            directories_visited: stats.directories_visited,
        }));

        // Dropping `self` runs the finish guard: Completed, then producer done.
        stats
    }

    fn first_visit(&self, visited: &mut HashSet<PathBuf>, dir: &Path) -> bool {
        match dir.canonicalize() {
            Ok(canonical) => visited.insert(canonical),
            Err(_) => true,
        }
    }
}

fn classify_walk_error(path: &Path, error: walkdir::Error) -> WalkError {
    let kind = error.io_error().map(|e| e.kind());
    if kind == Some(std::io::ErrorKind::PermissionDenied) {
        WalkError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else if kind == Some(std::io::ErrorKind::NotFound) {
        WalkError::DirectoryNotFound {
            path: path.to_path_buf(),
        }
    } else {
        WalkError::ReadDirectory {
            path: path.to_path_buf(),
            source: std::io::Error::other(error.to_string()),
        }
    }
}
