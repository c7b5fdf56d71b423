//! Worker pool with broadcast-once shared state
//!
//! One task per partition on a dedicated rayon pool. The shared context
//! is passed to every worker by reference and is read-only for the run;
//! workers produce purely local results, and all combination happens in
//! the orchestrator after every worker has returned. Any worker error or
//! a cancellation fails the whole run, so callers never observe a
//! partially merged result.

use crate::progress::Progress;
use rayon::prelude::*;
use riverine_core::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Worker sizing policy.
///
/// Built from a configuration integer: positive sets an explicit count,
/// zero uses all available hardware parallelism, negative uses all
/// available minus `|n|`, floored at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCount {
    /// Use all available hardware parallelism
    All,
    /// Explicit worker count
    Fixed(usize),
    /// All available minus n, floored at 1
    AllExcept(usize),
}

impl WorkerCount {
    pub fn from_config(n: i32) -> Self {
        match n {
            0 => WorkerCount::All,
            n if n > 0 => WorkerCount::Fixed(n as usize),
            n => WorkerCount::AllExcept(n.unsigned_abs() as usize),
        }
    }

    /// Resolve against the machine's available parallelism.
    pub fn resolve(&self) -> usize {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        match *self {
            WorkerCount::All => available,
            WorkerCount::Fixed(n) => n.max(1),
            WorkerCount::AllExcept(n) => available.saturating_sub(n).max(1),
        }
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        WorkerCount::All
    }
}

/// Shared cancellation flag. Workers poll it at loop boundaries through
/// [`CancelToken::checkpoint`]; once set, the run fails with
/// [`Error::Cancelled`] and no partial result is returned.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail fast if cancellation was requested.
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Per-worker view of a pool run: the broadcast shared state, the
/// worker's partition index, and the run's cancellation/progress handles.
pub struct WorkerCtx<'a, C: ?Sized> {
    pub shared: &'a C,
    pub worker_index: usize,
    cancel: &'a CancelToken,
    progress: &'a Progress,
}

impl<'a, C: ?Sized> WorkerCtx<'a, C> {
    /// Fail fast if the run was cancelled.
    pub fn checkpoint(&self) -> Result<()> {
        self.cancel.checkpoint()
    }

    pub fn progress(&self) -> &Progress {
        self.progress
    }
}

/// A pool of workers executing one task per partition.
///
/// Large read-only structures are broadcast once per run by reference
/// through the shared context, not serialized per task. Results are
/// collected in partition order regardless of completion order.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    workers: usize,
    cancel: CancelToken,
}

impl WorkerPool {
    pub fn new(count: WorkerCount) -> Result<Self> {
        let workers = count.resolve();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| Error::Worker(e.to_string()))?;
        Ok(Self {
            pool,
            workers,
            cancel: CancelToken::new(),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Token shared by every run of this pool.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Execute `worker` once per partition against a shared read-only
    /// context, returning the per-partition results in partition order.
    ///
    /// The first worker error aborts the run; a pending cancellation is
    /// reported as [`Error::Cancelled`] even if workers already finished.
    pub fn run_chunked<C, P, R, F>(&self, shared: &C, partitions: Vec<P>, worker: F) -> Result<Vec<R>>
    where
        C: Sync + ?Sized,
        P: Send,
        R: Send,
        F: Fn(&WorkerCtx<'_, C>, P) -> Result<R> + Sync,
    {
        let progress = Progress::new(partitions.len());
        let cancel = &self.cancel;

        let results: Result<Vec<R>> = self.pool.install(|| {
            partitions
                .into_par_iter()
                .enumerate()
                .map(|(worker_index, partition)| {
                    cancel.checkpoint()?;
                    let ctx = WorkerCtx {
                        shared,
                        worker_index,
                        cancel,
                        progress: &progress,
                    };
                    let out = worker(&ctx, partition)?;
                    progress.partition_done();
                    Ok(out)
                })
                .collect()
        });

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        results
    }
}
