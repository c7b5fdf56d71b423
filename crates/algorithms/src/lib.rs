//! # Riverine Algorithms
//!
//! River-network connectivity, fragmentation and zonal-index
//! computation for riverine.
//!
//! ## Components
//!
//! - **network**: connected-component discovery and obstacle-bounded
//!   fragment splitting
//! - **rci**: per-zone connectivity index and its rasterization
//! - **spatial**: R-tree index wrappers over segments and points
//! - **pipeline**: the end-to-end run, chunked through a worker pool

pub mod geometry;
pub mod network;
pub mod pipeline;
pub mod rci;
pub mod spatial;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::network::{resolve_components, split_fragments, SnappedObstacle};
    pub use crate::pipeline::{river_connectivity, RiverConnectivity, RiverConnectivityParams};
    pub use crate::rci::{connectivity_index, fragment_zone_lengths, rasterize_index};
    pub use crate::spatial::{PointIndex, SegmentIndex};
    pub use riverine_core::prelude::*;
}
