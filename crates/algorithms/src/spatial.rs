//! Spatial index wrappers
//!
//! R-tree indexes over network features. Entries carry arena indexes
//! into the owning collections, so queries return handles and the
//! geometry itself stays in one place.
//!
//! Box queries on `SegmentIndex` are coarse (envelope intersection);
//! the exact geometric distance test is the caller's secondary check.

use riverine_core::vector::SegmentCollection;
use riverine_core::Extent;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

#[derive(Debug, Clone)]
struct SegmentEntry {
    idx: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over line envelopes, keyed by arena index.
pub struct SegmentIndex {
    tree: RTree<SegmentEntry>,
}

impl SegmentIndex {
    /// Bulk-load from a segment collection. Segments without an extent
    /// (degenerate geometry) are not indexed.
    pub fn build(segments: &SegmentCollection) -> Self {
        let entries: Vec<SegmentEntry> = segments
            .iter()
            .filter_map(|(idx, seg)| {
                seg.extent().map(|e| SegmentEntry {
                    idx,
                    envelope: to_aabb(&e),
                })
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Bulk-load from precomputed extents (used for component-local
    /// edge indexes during fragment splitting).
    pub fn from_extents<I>(extents: I) -> Self
    where
        I: IntoIterator<Item = (usize, Extent)>,
    {
        let entries: Vec<SegmentEntry> = extents
            .into_iter()
            .map(|(idx, e)| SegmentEntry {
                idx,
                envelope: to_aabb(&e),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Arena indexes of entries whose envelope intersects `extent`.
    pub fn intersecting_box(&self, extent: &Extent) -> Vec<usize> {
        self.tree
            .locate_in_envelope_intersecting(&to_aabb(extent))
            .map(|e| e.idx)
            .collect()
    }

    /// Candidate entries near a point: envelope query expanded by
    /// `tolerance`.
    pub fn near_point(&self, x: f64, y: f64, tolerance: f64) -> Vec<usize> {
        self.intersecting_box(&Extent::new(x, y, x, y).expand(tolerance))
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[derive(Debug, Clone)]
struct PointEntry {
    idx: usize,
    pos: [f64; 2],
}

impl RTreeObject for PointEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.pos)
    }
}

impl PointDistance for PointEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.pos[0] - point[0];
        let dy = self.pos[1] - point[1];
        dx * dx + dy * dy
    }
}

/// R-tree over point features, keyed by arena index.
#[derive(Default)]
pub struct PointIndex {
    tree: RTree<PointEntry>,
}

impl PointIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bulk_load<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (usize, f64, f64)>,
    {
        let entries: Vec<PointEntry> = points
            .into_iter()
            .map(|(idx, x, y)| PointEntry { idx, pos: [x, y] })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn insert(&mut self, idx: usize, x: f64, y: f64) {
        self.tree.insert(PointEntry { idx, pos: [x, y] });
    }

    /// Nearest point to (x, y): arena index and euclidean distance.
    pub fn nearest(&self, x: f64, y: f64) -> Option<(usize, f64)> {
        self.tree
            .nearest_neighbor_iter_with_distance_2(&[x, y])
            .next()
            .map(|(e, d2)| (e.idx, d2.sqrt()))
    }

    /// Arena indexes of points inside `extent`.
    pub fn within_box(&self, extent: &Extent) -> Vec<usize> {
        self.tree
            .locate_in_envelope(&to_aabb(extent))
            .map(|e| e.idx)
            .collect()
    }

    /// Whether any indexed point lies within `distance` of (x, y).
    pub fn has_within(&self, x: f64, y: f64, distance: f64) -> bool {
        match self.nearest(x, y) {
            Some((_, d)) => d <= distance,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

fn to_aabb(e: &Extent) -> AABB<[f64; 2]> {
    AABB::from_corners([e.min_x, e.min_y], [e.max_x, e.max_y])
}
