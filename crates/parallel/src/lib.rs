//! # Riverine Parallel
//!
//! Parallel work distribution for the connectivity engine.
//!
//! This crate provides:
//! - `WorkerPool`: one task per partition on a dedicated thread pool,
//!   with a broadcast-once shared context and clean cancellation
//! - Chunking policies: balanced splits, cost-dealt buckets, south-to-north
//!   extent bands
//! - Deterministic orchestrator-side merges (sum, concat, row stacking)

pub mod chunk;
pub mod merge;
pub mod pool;
pub mod progress;

pub use chunk::{deal_by_cost, split_balanced, Band};
pub use merge::{concat, stack_rows, sum_merge};
pub use pool::{CancelToken, WorkerCount, WorkerCtx, WorkerPool};
pub use progress::Progress;
