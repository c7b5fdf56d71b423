//! River-network analysis
//!
//! - Connectivity: discover the connected components of the line network
//! - Fragments: split each component at its obstacles

mod connectivity;
mod fragments;

pub use connectivity::{dedup_components, discover, resolve_components};
pub use fragments::{
    split_component, split_fragments, FragmentIdAllocator, SnappedObstacle,
};
