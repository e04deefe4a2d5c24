//! Pipeline orchestration: walker, queue and worker pool wired together.

use super::cancel::CancellationToken;
use super::pool::{ItemOutcome, PoolStats, WorkerPool, DEFAULT_BACKOFF};
use super::tasks::{TaskContext, TaskKind, WorkerTask};
use crate::core::config::{validate_fuzz, FingerprintConfig};
use crate::core::fingerprint::{DuplicateMatch, FingerprintStore, MatchPolicy};
use crate::core::imaging::{ImageEngine, PixelEngine};
use crate::core::output::{LineSink, StdoutSink};
use crate::core::scanner::{DirectoryWalker, ImageFilter, PathQueue, WalkConfig, WalkStats};
use crate::error::{ConfigError, FingerprintError, ImageError};
use crate::events::{null_sender, Event, EventSender, PipelineEvent, PipelineSummary};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::info;

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// Which task ran
    pub task: TaskKind,
    /// Paths the walker pushed
    pub files_queued: usize,
    pub directories_visited: usize,
    /// Directory entries the walker could not read
    pub walk_errors: usize,
    /// Items the task body completed with output
    pub processed: usize,
    /// Paths rejected by the extension filter
    pub unsupported: usize,
    /// Items that completed without anything to report
    pub no_data: usize,
    /// Items skipped after an error
    pub failed: usize,
    /// Duplicate pairs, for `FindDuplicates` runs
    pub matches: Vec<DuplicateMatch>,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// The run stopped early on cancellation
    pub cancelled: bool,
}

/// Configuration for the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory to walk
    pub source: PathBuf,
    /// Walker options
    pub walk: WalkConfig,
    /// Number of worker threads
    pub concurrency: usize,
    /// Idle wait per queue poll
    pub backoff: Duration,
    /// Geometry, thresholds and fuzz
    pub fingerprint: FingerprintConfig,
    /// Extensions the workers process
    pub filter: ImageFilter,
}

impl PipelineConfig {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            walk: WalkConfig::default(),
            concurrency: default_concurrency(),
            backoff: DEFAULT_BACKOFF,
            fingerprint: FingerprintConfig::default(),
            filter: ImageFilter::new(),
        }
    }

    /// Check everything that must hold before any thread starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.source.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.source.clone(),
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency { value: 0 });
        }
        self.fingerprint.validate()
    }
}

/// Number of hardware threads, falling back to 1
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    engine: Option<Arc<dyn ImageEngine>>,
    sink: Option<Arc<dyn LineSink>>,
    cancel: CancellationToken,
}

impl PipelineBuilder {
    /// Start from defaults for `source`
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            config: PipelineConfig::new(source),
            engine: None,
            sink: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the number of worker threads
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Descend into subdirectories (default: true)
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.walk.recursive = recursive;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.walk.follow_symlinks = follow;
        self
    }

    pub fn walk_config(mut self, walk: WalkConfig) -> Self {
        self.config.walk = walk;
        self
    }

    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.config.backoff = backoff;
        self
    }

    pub fn fingerprint_config(mut self, config: FingerprintConfig) -> Self {
        self.config.fingerprint = config;
        self
    }

    pub fn filter(mut self, filter: ImageFilter) -> Self {
        self.config.filter = filter;
        self
    }

    /// Image collaborator (default: [`PixelEngine`])
    pub fn engine(mut self, engine: Arc<dyn ImageEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Where result lines go (default: stdout)
    pub fn sink(mut self, sink: Arc<dyn LineSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Validate the configuration and build the pipeline
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        self.config.validate()?;
        Ok(Pipeline {
            config: self.config,
            engine: self.engine.unwrap_or_else(|| Arc::new(PixelEngine::new())),
            sink: self.sink.unwrap_or_else(|| Arc::new(StdoutSink)),
            cancel: self.cancel,
        })
    }
}

/// Walks one directory tree and runs a task over every supported file
pub struct Pipeline {
    config: PipelineConfig,
    engine: Arc<dyn ImageEngine>,
    sink: Arc<dyn LineSink>,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder(source: impl Into<PathBuf>) -> PipelineBuilder {
        PipelineBuilder::new(source)
    }

    /// Run a task without events
    pub fn run(&self, task: &WorkerTask) -> Result<PipelineResult, FingerprintError> {
        self.run_with_events(task, &null_sender())
    }

    /// Run a task, reporting progress on `events`.
    ///
    /// Returns once every worker and the walker thread have finished.
    pub fn run_with_events(
        &self,
        task: &WorkerTask,
        events: &EventSender,
    ) -> Result<PipelineResult, FingerprintError> {
        match task {
            WorkerTask::Generate { destination } if !destination.is_dir() => {
                return Err(ConfigError::NotADirectory {
                    path: destination.clone(),
                }
                .into());
            }
            WorkerTask::FindDuplicates { fuzz, .. } => validate_fuzz(*fuzz)?,
            _ => {}
        }

        let found = Mutex::new(Vec::new());
        let ctx = self.context(events);

        let mut result = self.execute(task.kind(), self.config.concurrency, events, |_, path| {
            match task {
                WorkerTask::Generate { destination } => ctx.generate(destination, path),
                WorkerTask::ExtractMetadata => ctx.extract_metadata(path),
                WorkerTask::FindDuplicates { store, fuzz } => {
                    ctx.find_duplicates(store, *fuzz, path, &found)
                }
            }
        })?;

        result.matches = found.into_inner().unwrap_or_else(PoisonError::into_inner);
        self.finish(&result, events);
        Ok(result)
    }

    /// Load every supported image under the source as a reference.
    ///
    /// Runs with a single worker so references keep walk order. The store
    /// is only returned once loading has finished.
    pub fn load_fingerprints(
        &self,
        events: &EventSender,
    ) -> Result<FingerprintStore, FingerprintError> {
        let loaded = Mutex::new(Vec::new());
        let ctx = self.context(events);

        let result = self.execute(TaskKind::Load, 1, events, |_, path| ctx.load(path, &loaded))?;
        self.finish(&result, events);

        let fingerprints = loaded.into_inner().unwrap_or_else(PoisonError::into_inner);
        info!(
            count = fingerprints.len(),
            failed = result.failed,
            "fingerprints loaded"
        );

        let comparison = &self.config.fingerprint;
        let policy = MatchPolicy::new(comparison.identical_below, comparison.similar_below)?;
        Ok(FingerprintStore::from_fingerprints(
            Arc::clone(&self.engine),
            policy,
            fingerprints,
        ))
    }

    fn context<'a>(&'a self, events: &'a EventSender) -> TaskContext<'a> {
        TaskContext {
            engine: self.engine.as_ref(),
            config: &self.config.fingerprint,
            sink: self.sink.as_ref(),
            events,
        }
    }

    /// Start the walker, drain the queue with `concurrency` workers, join.
    fn execute<F>(
        &self,
        kind: TaskKind,
        concurrency: usize,
        events: &EventSender,
        body: F,
    ) -> Result<PipelineResult, FingerprintError>
    where
        F: Fn(usize, &Path) -> Result<ItemOutcome, ImageError> + Sync,
    {
        let start = Instant::now();
        let pool = WorkerPool::new(concurrency)?
            .with_backoff(self.config.backoff)
            .with_cancellation(self.cancel.clone());

        info!(
            task = %kind,
            source = %self.config.source.display(),
            workers = concurrency,
            "pipeline started"
        );
        events.send(Event::Pipeline(PipelineEvent::Started { phase: kind.phase() }));

        let queue = Arc::new(PathQueue::new());
        let mut walker =
            DirectoryWalker::new(&self.config.source, self.config.walk.clone(), Arc::clone(&queue))
                .with_events(events.clone())
                .with_cancellation(self.cancel.clone());
        walker.start()?;

        // Join the walker even if the pool failed.
        let pool_result = pool.run(&queue, &self.config.filter, events, body);
        let walk = walker.join()?;
        let stats = pool_result?;

        Ok(self.summarize(kind, walk, stats, start))
    }

    fn summarize(
        &self,
        kind: TaskKind,
        walk: WalkStats,
        stats: PoolStats,
        start: Instant,
    ) -> PipelineResult {
        PipelineResult {
            task: kind,
            files_queued: walk.files_queued,
            directories_visited: walk.directories_visited,
            walk_errors: walk.errors,
            processed: stats.processed,
            unsupported: stats.unsupported,
            no_data: stats.no_data,
            failed: stats.failed,
            matches: Vec::new(),
            duration_ms: start.elapsed().as_millis() as u64,
            cancelled: self.cancel.is_cancelled(),
        }
    }

    fn finish(&self, result: &PipelineResult, events: &EventSender) {
        if result.cancelled {
            info!(task = %result.task, "pipeline cancelled");
            events.send(Event::Pipeline(PipelineEvent::Cancelled));
        }
        info!(
            task = %result.task,
            processed = result.processed,
            failed = result.failed,
            matches = result.matches.len(),
            duration_ms = result.duration_ms,
            "pipeline completed"
        );
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                files_queued: result.files_queued,
                processed: result.processed,
                failed: result.failed,
                unsupported: result.unsupported,
                matches: result.matches.len(),
                duration_ms: result.duration_ms,
            },
        }));
    }
}
