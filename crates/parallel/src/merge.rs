//! Orchestrator-side result merges
//!
//! Deterministic, commutative/associative combination of per-partition
//! results: keyed sums, list concatenation, raster row-chunk stacking.
//! Merging never happens inside a worker, so correctness does not depend
//! on partition count or completion order.

use ndarray::{concatenate, Array2, Axis};
use riverine_core::{Error, RasterElement, Result};
use std::collections::HashMap;
use std::hash::Hash;

/// Sum-merge dictionaries keyed by id.
pub fn sum_merge<K, I>(parts: I) -> HashMap<K, f64>
where
    K: Eq + Hash,
    I: IntoIterator<Item = HashMap<K, f64>>,
{
    let mut merged: HashMap<K, f64> = HashMap::new();
    for part in parts {
        for (key, value) in part {
            *merged.entry(key).or_insert(0.0) += value;
        }
    }
    merged
}

/// Concatenate per-partition lists in partition order.
pub fn concat<T, I>(parts: I) -> Vec<T>
where
    I: IntoIterator<Item = Vec<T>>,
{
    let mut merged = Vec::new();
    for part in parts {
        merged.extend(part);
    }
    merged
}

/// Reassemble raster row-chunks in partition order.
///
/// With `reverse = true` the chunks are stacked last-to-first, which
/// turns south-to-north band results back into a north-up grid.
pub fn stack_rows<T: RasterElement>(mut parts: Vec<Array2<T>>, reverse: bool) -> Result<Array2<T>> {
    if parts.is_empty() {
        return Err(Error::Other("no row chunks to stack".into()));
    }
    if reverse {
        parts.reverse();
    }
    let views: Vec<_> = parts.iter().map(Array2::view).collect();
    concatenate(Axis(0), &views).map_err(|e| Error::Other(e.to_string()))
}
