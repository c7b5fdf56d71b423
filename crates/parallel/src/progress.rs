//! Coarse partition-level progress reporting
//!
//! A lock-free counter incremented by workers as partitions complete.
//! Purely observational; never gates correctness.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared progress counter for one pool run.
#[derive(Debug)]
pub struct Progress {
    total: usize,
    completed: AtomicUsize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
        }
    }

    /// Record one completed partition.
    pub fn partition_done(&self) {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if self.total > 0 {
            tracing::debug!(
                completed = done,
                total = self.total,
                percent = (done * 100 / self.total),
                "partition complete"
            );
        }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Completed fraction in [0, 1].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed() as f64 / self.total as f64
    }
}
