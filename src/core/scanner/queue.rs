//! Path queue between the directory walker and the worker pool.
//!
//! Backed by an unbounded crossbeam channel. The queue owns the only
//! sender; marking the producer done drops it, so the receive side reports
//! "disconnected" exactly when every pushed path has been taken and no more
//! can arrive. Channel disconnection carries the happens-before edge from
//! the last push to every consumer that observes it.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::warn;

/// Outcome of a pop attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopResult {
    /// A path was taken off the queue
    Item(PathBuf),
    /// Nothing queued right now, but the producer may still push
    Empty,
    /// Producer is done and the queue is empty; nothing will ever arrive
    Drained,
}

/// Unbounded multi-consumer queue of discovered paths
pub struct PathQueue {
    sender: Mutex<Option<Sender<PathBuf>>>,
    receiver: Receiver<PathBuf>,
    producer_done: AtomicBool,
    pushed: AtomicU64,
    popped: AtomicU64,
}

impl PathQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
            producer_done: AtomicBool::new(false),
            pushed: AtomicU64::new(0),
            popped: AtomicU64::new(0),
        }
    }

    /// Append a path.
    ///
    /// Returns `false` if the producer was already marked done; the path is
    /// dropped in that case.
    pub fn push(&self, path: PathBuf) -> bool {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(tx) if tx.send(path).is_ok() => {
                self.pushed.fetch_add(1, Ordering::Relaxed);
                true
            }
            _ => {
                warn!("push after producer was marked done; path dropped");
                false
            }
        }
    }

    /// Take a path without blocking
    pub fn try_pop(&self) -> PopResult {
        match self.receiver.try_recv() {
            Ok(path) => self.taken(path),
            Err(TryRecvError::Empty) => PopResult::Empty,
            Err(TryRecvError::Disconnected) => PopResult::Drained,
        }
    }

    /// Take a path, waiting at most `timeout` for one to arrive.
    ///
    /// Returns early on a push or when the producer is marked done.
    pub fn pop_timeout(&self, timeout: Duration) -> PopResult {
        match self.receiver.recv_timeout(timeout) {
            Ok(path) => self.taken(path),
            Err(RecvTimeoutError::Timeout) => PopResult::Empty,
            Err(RecvTimeoutError::Disconnected) => PopResult::Drained,
        }
    }

    /// Signal that no further pushes will happen. Idempotent.
    pub fn mark_producer_done(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);
        self.producer_done.store(true, Ordering::Release);
    }

    /// Whether the producer has finished pushing
    pub fn is_producer_done(&self) -> bool {
        self.producer_done.load(Ordering::Acquire)
    }

    /// Paths currently waiting
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Total paths accepted by `push`
    pub fn pushed(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }

    /// Total paths handed to consumers
    pub fn popped(&self) -> u64 {
        self.popped.load(Ordering::Relaxed)
    }

    fn taken(&self, path: PathBuf) -> PopResult {
        self.popped.fetch_add(1, Ordering::Relaxed);
        PopResult::Item(path)
    }
}

impl Default for PathQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn empty_and_drained_are_distinct() {
        let queue = PathQueue::new();
        assert_eq!(queue.try_pop(), PopResult::Empty);
        assert!(!queue.is_producer_done());

        queue.mark_producer_done();
        assert!(queue.is_producer_done());
        assert_eq!(queue.try_pop(), PopResult::Drained);
    }

    #[test]
    fn items_pushed_before_done_are_still_delivered() {
        let queue = PathQueue::new();
        assert!(queue.push(PathBuf::from("/a.jpg")));
        assert!(queue.push(PathBuf::from("/b.jpg")));
        queue.mark_producer_done();

        assert_eq!(queue.try_pop(), PopResult::Item(PathBuf::from("/a.jpg")));
        assert_eq!(queue.try_pop(), PopResult::Item(PathBuf::from("/b.jpg")));
        assert_eq!(queue.try_pop(), PopResult::Drained);
        assert_eq!(queue.pushed(), 2);
        assert_eq!(queue.popped(), 2);
    }

    #[test]
    fn push_after_done_is_rejected() {
        let queue = PathQueue::new();
        queue.mark_producer_done();
        queue.mark_producer_done();

        assert!(!queue.push(PathBuf::from("/late.jpg")));
        assert_eq!(queue.pushed(), 0);
        assert_eq!(queue.try_pop(), PopResult::Drained);
    }

    #[test]
    fn pop_timeout_times_out_while_producer_runs() {
        let queue = PathQueue::new();
        assert_eq!(
            queue.pop_timeout(Duration::from_millis(5)),
            PopResult::Empty
        );
    }

    #[test]
    fn concurrent_consumers_take_each_item_once() {
        let queue = Arc::new(PathQueue::new());
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    loop {
                        match queue.pop_timeout(Duration::from_millis(1)) {
                            PopResult::Item(path) => seen.push(path),
                            PopResult::Empty => continue,
                            PopResult::Drained => break,
                        }
                    }
                    seen
                })
            })
            .collect();

        for i in 0..500 {
            queue.push(PathBuf::from(format!("/photos/{}.jpg", i)));
        }
        queue.mark_producer_done();

        let mut all = Vec::new();
        for consumer in consumers {
            all.extend(consumer.join().unwrap());
        }
        let unique: HashSet<_> = all.iter().cloned().collect();
        assert_eq!(all.len(), 500);
        assert_eq!(unique.len(), 500);
    }
}
