//! River-network vector data model
//!
//! Line segments, point obstacles, connected components and fragments.
//! Collections own their features; algorithms refer to features through
//! arena indexes, so traversal state (visited-sets) lives outside the
//! geometry and shared collections stay immutable during a parallel run.

use crate::extent::Extent;
use crate::geodesy::multiline_length_km;
use geo_types::{LineString, MultiLineString, Point};
use serde::{Deserialize, Serialize};

/// A single river line: an ordered vertex chain with a stable identifier.
#[derive(Debug, Clone)]
pub struct RiverSegment {
    /// Stable feature id from the source dataset
    pub id: i64,
    pub line: LineString<f64>,
}

impl RiverSegment {
    pub fn new(id: i64, line: LineString<f64>) -> Self {
        Self { id, line }
    }

    /// First and last vertices. Degenerate segments (< 2 vertices) have
    /// no endpoints.
    pub fn endpoints(&self) -> Option<(Point<f64>, Point<f64>)> {
        if self.line.0.len() < 2 {
            return None;
        }
        let first = self.line.0[0];
        let last = self.line.0[self.line.0.len() - 1];
        Some((Point::new(first.x, first.y), Point::new(last.x, last.y)))
    }

    pub fn vertex_count(&self) -> usize {
        self.line.0.len()
    }

    pub fn extent(&self) -> Option<Extent> {
        Extent::of_line(&self.line)
    }

    /// A segment is traversable when it has at least two finite vertices.
    pub fn is_well_formed(&self) -> bool {
        self.line.0.len() >= 2 && self.line.0.iter().all(|c| c.x.is_finite() && c.y.is_finite())
    }
}

/// Owning arena of river segments. The vector index is the handle used
/// by visited-sets and the spatial index.
#[derive(Debug, Clone, Default)]
pub struct SegmentCollection {
    segments: Vec<RiverSegment>,
}

impl SegmentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<RiverSegment>) -> Self {
        Self { segments }
    }

    pub fn push(&mut self, segment: RiverSegment) -> usize {
        self.segments.push(segment);
        self.segments.len() - 1
    }

    pub fn get(&self, idx: usize) -> Option<&RiverSegment> {
        self.segments.get(idx)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &RiverSegment)> {
        self.segments.iter().enumerate()
    }
}

/// A point obstacle (dam, weir) with a stable identifier.
///
/// `connected` is set once the obstacle has been snapped onto a river
/// line during fragment splitting; `location` is then the snapped point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: i64,
    pub location: Point<f64>,
    pub connected: bool,
}

impl Obstacle {
    pub fn new(id: i64, location: Point<f64>) -> Self {
        Self {
            id,
            location,
            connected: false,
        }
    }
}

/// Owning collection of obstacles.
#[derive(Debug, Clone, Default)]
pub struct ObstacleCollection {
    obstacles: Vec<Obstacle>,
}

impl ObstacleCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_obstacles(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    pub fn push(&mut self, obstacle: Obstacle) -> usize {
        self.obstacles.push(obstacle);
        self.obstacles.len() - 1
    }

    pub fn get(&self, idx: usize) -> Option<&Obstacle> {
        self.obstacles.get(idx)
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Obstacle)> {
        self.obstacles.iter().enumerate()
    }

    /// Mark an obstacle as snapped onto the network.
    pub fn mark_connected(&mut self, idx: usize, snapped: Point<f64>) {
        if let Some(o) = self.obstacles.get_mut(idx) {
            o.connected = true;
            o.location = snapped;
        }
    }
}

/// A maximal set of segments transitively reachable through shared
/// endpoints, merged into one multi-line.
#[derive(Debug, Clone)]
pub struct ConnectedComponent {
    /// Synthetic component id, assigned on acceptance after dedup
    pub id: u64,
    /// Arena indexes of the member segments
    pub segments: Vec<usize>,
    pub geometry: MultiLineString<f64>,
}

impl ConnectedComponent {
    pub fn extent(&self) -> Option<Extent> {
        Extent::of_multiline(&self.geometry)
    }

    /// Total geodetic line length, in km.
    pub fn length_km(&self) -> f64 {
        multiline_length_km(&self.geometry)
    }
}

/// A stop-bounded piece of a connected component: the chain of line
/// geometry between two obstacles, between an obstacle and a free end,
/// or a whole obstacle-free component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    /// Globally unique fragment id (allocated from per-worker ranges)
    pub id: u64,
    /// Id of the parent connected component
    pub component_id: u64,
    pub geometry: MultiLineString<f64>,
    /// Geodetic length in km
    pub length_km: f64,
}

impl Fragment {
    pub fn extent(&self) -> Option<Extent> {
        Extent::of_multiline(&self.geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(id: i64, coords: Vec<(f64, f64)>) -> RiverSegment {
        RiverSegment::new(id, LineString::from(coords))
    }

    #[test]
    fn test_segment_endpoints() {
        let s = seg(1, vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        let (a, b) = s.endpoints().unwrap();
        assert_eq!(a, Point::new(0.0, 0.0));
        assert_eq!(b, Point::new(2.0, 0.0));
    }

    #[test]
    fn test_degenerate_segment() {
        let s = seg(1, vec![(0.0, 0.0)]);
        assert!(s.endpoints().is_none());
        assert!(!s.is_well_formed());

        let nan = seg(2, vec![(0.0, 0.0), (f64::NAN, 1.0)]);
        assert!(!nan.is_well_formed());
    }

    #[test]
    fn test_collection_arena_indexes() {
        let mut coll = SegmentCollection::new();
        let a = coll.push(seg(10, vec![(0.0, 0.0), (1.0, 0.0)]));
        let b = coll.push(seg(20, vec![(1.0, 0.0), (2.0, 0.0)]));
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(coll.get(a).unwrap().id, 10);
        assert_eq!(coll.get(b).unwrap().id, 20);
        assert!(coll.get(2).is_none());
    }

    #[test]
    fn test_obstacle_mark_connected() {
        let mut coll = ObstacleCollection::new();
        let idx = coll.push(Obstacle::new(5, Point::new(0.1, 0.1)));
        assert!(!coll.get(idx).unwrap().connected);

        coll.mark_connected(idx, Point::new(0.0, 0.0));
        let o = coll.get(idx).unwrap();
        assert!(o.connected);
        assert_eq!(o.location, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_component_extent_and_length() {
        let comp = ConnectedComponent {
            id: 1,
            segments: vec![0, 1],
            geometry: MultiLineString::new(vec![
                LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]),
                LineString::from(vec![(1.0, 0.0), (1.0, 1.0)]),
            ]),
        };
        let e = comp.extent().unwrap();
        assert_eq!(e.max_x, 1.0);
        assert_eq!(e.max_y, 1.0);
        assert!(comp.length_km() > 0.0);
    }
}
