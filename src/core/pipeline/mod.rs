//! # Pipeline Module
//!
//! Runs one task over every supported file under a directory.
//!
//! ## Threads
//! 1. **Walker** - one thread enumerating the tree into a [`PathQueue`]
//! 2. **Workers** - `concurrency` threads (a rayon pool) draining the queue
//! 3. **Caller** - blocks until every worker and then the walker is joined
//!
//! ## Tasks
//! - [`WorkerTask::Generate`] writes fixed-size fingerprint files
//! - [`WorkerTask::ExtractMetadata`] prints capture timestamps
//! - [`WorkerTask::FindDuplicates`] compares against a [`FingerprintStore`]
//!
//! [`PathQueue`]: crate::core::scanner::PathQueue
//! [`FingerprintStore`]: crate::core::fingerprint::FingerprintStore

mod cancel;
mod executor;
mod pool;
mod tasks;

pub use cancel::CancellationToken;
pub use executor::{default_concurrency, Pipeline, PipelineBuilder, PipelineConfig, PipelineResult};
pub use pool::{ItemOutcome, PoolStats, WorkerPool, DEFAULT_BACKOFF};
pub use tasks::{TaskKind, WorkerTask};
