//! Workload partitioning policies
//!
//! Balanced item splits, cost-dealt buckets for skewed geometry work,
//! and south-to-north extent bands for raster passes.

use riverine_core::{Extent, GeoTransform};
use std::ops::Range;

/// Split `items` into `chunk_count` near-equal partitions, the remainder
/// going to the first partitions. Never returns empty partitions unless
/// `items` is empty.
pub fn split_balanced<T>(items: Vec<T>, chunk_count: usize) -> Vec<Vec<T>> {
    let count = chunk_count.max(1);
    if items.is_empty() {
        return Vec::new();
    }
    let count = count.min(items.len());
    let base = items.len() / count;
    let remainder = items.len() % count;

    let mut chunks = Vec::with_capacity(count);
    let mut it = items.into_iter();
    for i in 0..count {
        let size = base + usize::from(i < remainder);
        chunks.push(it.by_ref().take(size).collect());
    }
    chunks
}

/// Deal `items` into `chunk_count` buckets balanced by a cost proxy.
///
/// Items are sorted ascending by cost and dealt round-robin, then each
/// bucket is reversed so its most expensive items are processed first.
/// This spreads the few very expensive geometries across different
/// workers instead of stacking them in one partition.
pub fn deal_by_cost<T, F>(mut items: Vec<T>, chunk_count: usize, cost: F) -> Vec<Vec<T>>
where
    F: Fn(&T) -> usize,
{
    let count = chunk_count.max(1);
    if items.is_empty() {
        return Vec::new();
    }
    let count = count.min(items.len());
    items.sort_by_key(|item| cost(item));

    let mut buckets: Vec<Vec<T>> = (0..count).map(|_| Vec::new()).collect();
    for (i, item) in items.into_iter().enumerate() {
        buckets[i % count].push(item);
    }
    for bucket in &mut buckets {
        bucket.reverse();
    }
    buckets
}

/// A horizontal band of a raster grid, used to chunk raster passes.
///
/// Bands are generated south to north; `row_start..row_end` indexes the
/// grid's rows (row 0 is the northernmost), so the first band holds the
/// highest row numbers. Reassembly therefore concatenates band
/// row-chunks in reverse band order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub band_index: usize,
    pub row_start: usize,
    pub row_end: usize,
    pub extent: Extent,
}

impl Band {
    /// Split a grid's rows into `count` bands ordered south to north,
    /// near-equal in height with the remainder going to the first
    /// (southernmost) bands.
    pub fn split(transform: &GeoTransform, rows: usize, cols: usize, count: usize) -> Vec<Band> {
        if rows == 0 {
            return Vec::new();
        }
        let count = count.max(1).min(rows);
        let base = rows / count;
        let remainder = rows % count;
        let full = transform.bounds(rows, cols);

        let mut bands = Vec::with_capacity(count);
        let mut row_end = rows;
        for band_index in 0..count {
            let height = base + usize::from(band_index < remainder);
            let row_start = row_end - height;
            let extent = Extent::new(
                full.min_x,
                transform.origin_y - row_end as f64 * transform.cell_height,
                full.max_x,
                transform.origin_y - row_start as f64 * transform.cell_height,
            );
            bands.push(Band {
                band_index,
                row_start,
                row_end,
                extent,
            });
            row_end = row_start;
        }
        bands
    }

    pub fn row_range(&self) -> Range<usize> {
        self.row_start..self.row_end
    }

    pub fn rows(&self) -> usize {
        self.row_end - self.row_start
    }
}
