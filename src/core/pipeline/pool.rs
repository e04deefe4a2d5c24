//! Fixed-size worker pool draining a [`PathQueue`].

use super::cancel::CancellationToken;
use crate::core::scanner::{ImageFilter, PathQueue, PopResult};
use crate::error::{ConfigError, ImageError, PipelineError};
use crate::events::{Event, EventSender, WorkProgress, WorkerEvent};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default wait for a path before checking cancellation again
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(10);

/// What a task body did with one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Produced output
    Processed,
    /// Ran fine but had nothing to report (e.g. no capture timestamp)
    NoData,
}

/// Per-run worker counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub processed: usize,
    pub no_data: usize,
    pub unsupported: usize,
    pub failed: usize,
}

impl PoolStats {
    /// Every path a worker popped
    pub fn popped(&self) -> usize {
        self.processed + self.no_data + self.unsupported + self.failed
    }
}

#[derive(Default)]
struct Counters {
    processed: AtomicUsize,
    no_data: AtomicUsize,
    unsupported: AtomicUsize,
    failed: AtomicUsize,
    completed: AtomicUsize,
}

impl Counters {
    fn snapshot(&self) -> PoolStats {
        PoolStats {
            processed: self.processed.load(Ordering::Relaxed),
            no_data: self.no_data.load(Ordering::Relaxed),
            unsupported: self.unsupported.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// `concurrency` worker threads, each running the same task body.
///
/// Failures are isolated per item: an error or a panic in the body skips
/// that path and the worker moves on.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    concurrency: usize,
    backoff: Duration,
    cancel: CancellationToken,
}

impl WorkerPool {
    pub fn new(concurrency: usize) -> Result<Self, ConfigError> {
        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency { value: concurrency });
        }
        Ok(Self {
            concurrency,
            backoff: DEFAULT_BACKOFF,
            cancel: CancellationToken::new(),
        })
    }

    /// How long an idle worker waits for a path per attempt
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Drain `queue` until it reports drained (or the run is cancelled).
    ///
    /// Blocks until every worker thread has returned. `body` receives the
    /// worker index and a path that passed `filter`.
    pub fn run<F>(
        &self,
        queue: &PathQueue,
        filter: &ImageFilter,
        events: &EventSender,
        body: F,
    ) -> Result<PoolStats, PipelineError>
    where
        F: Fn(usize, &Path) -> Result<ItemOutcome, ImageError> + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| format!("fingerprint-worker-{}", i))
            .build()
            .map_err(|e| PipelineError::WorkerPool(e.to_string()))?;

        let counters = Counters::default();
        pool.scope(|scope| {
            for worker in 0..self.concurrency {
                let counters = &counters;
                let body = &body;
                scope.spawn(move |_| {
                    self.worker_loop(worker, queue, filter, events, body, counters)
                });
            }
        });

        Ok(counters.snapshot())
    }

    fn worker_loop<F>(
        &self,
        worker: usize,
        queue: &PathQueue,
        filter: &ImageFilter,
        events: &EventSender,
        body: &F,
        counters: &Counters,
    ) where
        F: Fn(usize, &Path) -> Result<ItemOutcome, ImageError> + Sync,
    {
        debug!(worker, "worker started");

        while !self.cancel.is_cancelled() {
            let path = match queue.pop_timeout(self.backoff) {
                PopResult::Item(path) => path,
                PopResult::Empty => continue,
                PopResult::Drained => break,
            };

            if !filter.is_supported(&path) {
                trace!(path = %path.display(), "unsupported, skipping");
                counters.unsupported.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(worker, &path)))
                .unwrap_or_else(|_| Err(ImageError::Panicked { path: path.clone() }));
            let completed = counters.completed.fetch_add(1, Ordering::Relaxed) + 1;

            match outcome {
                Ok(outcome) => {
                    let counter = match outcome {
                        ItemOutcome::Processed => &counters.processed,
                        ItemOutcome::NoData => &counters.no_data,
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                    events.send(Event::Worker(WorkerEvent::Processed(WorkProgress {
                        worker,
                        completed,
                        path,
                    })));
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    events.send(Event::Worker(WorkerEvent::Failed {
                        path,
                        message: e.to_string(),
                    }));
                }
            }
        }

        debug!(worker, "worker finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::null_sender;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::thread;

    fn filled_queue(names: &[String]) -> PathQueue {
        let queue = PathQueue::new();
        for name in names {
            queue.push(PathBuf::from(name));
        }
        queue.mark_producer_done();
        queue
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(ConfigError::InvalidConcurrency { value: 0 })
        ));
    }

    #[test]
    fn hundred_files_four_workers_none_lost() {
        let names: Vec<String> = (0..100).map(|i| format!("/photos/{:03}.jpg", i)).collect();
        let queue = filled_queue(&names);
        let seen = Mutex::new(Vec::new());

        let stats = WorkerPool::new(4)
            .unwrap()
            .run(&queue, &ImageFilter::new(), &null_sender(), |_, path| {
                seen.lock().unwrap().push(path.to_path_buf());
                Ok(ItemOutcome::Processed)
            })
            .unwrap();

        let seen = seen.into_inner().unwrap();
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(seen.len(), 100);
        assert_eq!(unique.len(), 100);
        assert_eq!(stats.processed, 100);
    }

    #[test]
    fn every_worker_index_is_used_once_per_thread() {
        let queue = Arc::new(PathQueue::new());
        let workers = Mutex::new(HashSet::new());

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..40 {
                    queue.push(PathBuf::from(format!("{}.png", i)));
                    thread::sleep(Duration::from_millis(1));
                }
                queue.mark_producer_done();
            })
        };

        WorkerPool::new(3)
            .unwrap()
            .with_backoff(Duration::from_millis(1))
            .run(&queue, &ImageFilter::new(), &null_sender(), |worker, _| {
                workers.lock().unwrap().insert(worker);
                thread::sleep(Duration::from_millis(2));
                Ok(ItemOutcome::Processed)
            })
            .unwrap();
        producer.join().unwrap();

        let workers = workers.into_inner().unwrap();
        assert!(!workers.is_empty());
        assert!(workers.iter().all(|w| *w < 3));
    }

    #[test]
    fn errors_and_panics_are_isolated_per_item() {
        let names: Vec<String> = ["ok.jpg", "bad.jpg", "boom.jpg", "notes.txt", "fine.png"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let queue = filled_queue(&names);

        let stats = WorkerPool::new(2)
            .unwrap()
            .run(&queue, &ImageFilter::new(), &null_sender(), |_, path| {
                match path.to_str() {
                    Some("bad.jpg") => Err(ImageError::Decode {
                        path: path.to_path_buf(),
                        reason: "corrupt".to_string(),
                    }),
                    Some("boom.jpg") => panic!("decoder exploded"),
                    _ => Ok(ItemOutcome::Processed),
                }
            })
            .unwrap();

        assert_eq!(
            stats,
            PoolStats {
                processed: 2,
                no_data: 0,
                unsupported: 1,
                failed: 2,
            }
        );
        assert_eq!(stats.popped(), 5);
    }

    #[test]
    fn cancelled_pool_returns_without_draining() {
        let queue = PathQueue::new();
        queue.push(PathBuf::from("a.jpg"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let stats = WorkerPool::new(2)
            .unwrap()
            .with_cancellation(cancel)
            .run(&queue, &ImageFilter::new(), &null_sender(), |_, _| Ok(ItemOutcome::Processed))
            .unwrap();

        assert_eq!(stats.popped(), 0);
        assert_eq!(queue.len(), 1);
    }
}
