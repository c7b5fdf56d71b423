//! Fragment splitting at obstacle points
//!
//! Obstacles are snapped to the nearest point on their component within
//! tolerance; member lines are cut at interior snap points, and the cut
//! edges are traversed with the stopping rule that no walk continues
//! through a snapped point. Every maximal stop-bounded edge set becomes
//! one fragment with a geodetic length.
//!
//! Fragment ids come from per-worker disjoint ranges, so parallel
//! workers need no coordination to stay globally unique. Workers report
//! snapped obstacles back to the orchestrator instead of mutating the
//! shared collection.

use crate::geometry::{nearest_point_on_line, point_line_distance, PolylineSnap};
use crate::spatial::{PointIndex, SegmentIndex};
use geo_types::{Coord, LineString, MultiLineString, Point};
use riverine_core::geodesy::line_length_km;
use riverine_core::vector::{ConnectedComponent, Fragment, ObstacleCollection};
use riverine_core::{Error, Extent, Result};
use riverine_parallel::{deal_by_cost, WorkerPool};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Allocates fragment ids from a worker's disjoint range:
/// `worker_index * max_per_worker + counter`.
#[derive(Debug)]
pub struct FragmentIdAllocator {
    base: u64,
    counter: u64,
    max: u64,
}

impl FragmentIdAllocator {
    pub fn new(worker_index: usize, max_per_worker: u64) -> Self {
        Self {
            base: worker_index as u64 * max_per_worker,
            counter: 0,
            max: max_per_worker,
        }
    }

    pub fn next(&mut self) -> Result<u64> {
        if self.counter >= self.max {
            return Err(Error::Worker(format!(
                "fragment id range exhausted ({} ids per worker)",
                self.max
            )));
        }
        let id = self.base + self.counter;
        self.counter += 1;
        Ok(id)
    }
}

/// An obstacle that was snapped onto the network during splitting.
#[derive(Debug, Clone, Copy)]
pub struct SnappedObstacle {
    /// Arena index into the obstacle collection
    pub obstacle: usize,
    /// Snapped location on the line
    pub point: Coord<f64>,
}

struct Edge {
    line: LineString<f64>,
}

impl Edge {
    fn endpoints(&self) -> Option<(Coord<f64>, Coord<f64>)> {
        if self.line.0.len() < 2 {
            return None;
        }
        Some((self.line.0[0], self.line.0[self.line.0.len() - 1]))
    }
}

/// Split one component into stop-bounded fragments.
pub fn split_component(
    component: &ConnectedComponent,
    obstacles: &ObstacleCollection,
    obstacle_index: &PointIndex,
    tolerance: f64,
    ids: &mut FragmentIdAllocator,
) -> Result<(Vec<Fragment>, Vec<SnappedObstacle>)> {
    let Some(extent) = component.extent() else {
        return Ok((Vec::new(), Vec::new()));
    };
    let lines = &component.geometry.0;

    // Snap candidate obstacles onto the component
    let mut candidates = obstacle_index.within_box(&extent.expand(tolerance));
    candidates.sort_unstable();

    let mut snapped = Vec::new();
    let mut cuts: HashMap<usize, Vec<(usize, f64, Coord<f64>)>> = HashMap::new();
    let mut stop_index = PointIndex::new();
    let mut stop_count = 0;

    for obstacle_idx in candidates {
        let Some(obstacle) = obstacles.get(obstacle_idx) else {
            continue;
        };
        let Some((line_idx, snap)) = snap_to_component(obstacle.location, lines) else {
            continue;
        };
        if snap.distance > tolerance {
            continue;
        }

        snapped.push(SnappedObstacle {
            obstacle: obstacle_idx,
            point: snap.point,
        });
        stop_index.insert(stop_count, snap.point.x, snap.point.y);
        stop_count += 1;

        // Snaps at a line's own endpoints need no cut: the endpoint is
        // already an edge boundary, and the stop index halts traversal
        if let Some(line) = lines.get(line_idx) {
            if !is_near_line_end(snap.point, line, tolerance) {
                cuts.entry(line_idx)
                    .or_default()
                    .push((snap.chord, snap.t, snap.point));
            }
        }
    }

    // Cut member lines at interior snap points
    let mut edges: Vec<Edge> = Vec::new();
    for (line_idx, line) in lines.iter().enumerate() {
        let mut line_cuts = cuts.remove(&line_idx).unwrap_or_default();
        for part in cut_line(line, &mut line_cuts, tolerance) {
            edges.push(Edge { line: part });
        }
    }

    let edge_index = SegmentIndex::from_extents(
        edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| Extent::of_line(&e.line).map(|ext| (i, ext))),
    );

    // Stop-bounded traversal over the cut edges
    let mut visited = vec![false; edges.len()];
    let mut fragments = Vec::new();

    for start in 0..edges.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut members = vec![start];
        let mut stack: Vec<Coord<f64>> = Vec::new();
        push_free_endpoints(&edges[start], &stop_index, tolerance, &mut stack);

        while let Some(pt) = stack.pop() {
            for cand in edge_index.near_point(pt.x, pt.y, tolerance) {
                if visited[cand] {
                    continue;
                }
                if point_line_distance(Point::from(pt), &edges[cand].line) <= tolerance {
                    visited[cand] = true;
                    members.push(cand);
                    push_free_endpoints(&edges[cand], &stop_index, tolerance, &mut stack);
                }
            }
        }

        members.sort_unstable();
        let geometry =
            MultiLineString::new(members.iter().map(|&i| edges[i].line.clone()).collect());
        let length_km = geometry.0.iter().map(line_length_km).sum();
        fragments.push(Fragment {
            id: ids.next()?,
            component_id: component.id,
            geometry,
            length_km,
        });
    }

    Ok((fragments, snapped))
}

/// Nearest position on any member line: (line index, snap).
fn snap_to_component(
    location: Point<f64>,
    lines: &[LineString<f64>],
) -> Option<(usize, PolylineSnap)> {
    let mut best: Option<(usize, PolylineSnap)> = None;
    for (line_idx, line) in lines.iter().enumerate() {
        if let Some(snap) = nearest_point_on_line(location, line) {
            if best.map_or(true, |(_, b)| snap.distance < b.distance) {
                best = Some((line_idx, snap));
            }
        }
    }
    best
}

fn is_near_line_end(p: Coord<f64>, line: &LineString<f64>, tolerance: f64) -> bool {
    let n = line.0.len();
    if n == 0 {
        return false;
    }
    planar_distance(p, line.0[0]) <= tolerance || planar_distance(p, line.0[n - 1]) <= tolerance
}

/// Cut a polyline at the given (chord, t, point) positions, assumed
/// interior. Cuts closer than `tolerance` to a part boundary are merged
/// into it rather than producing sliver parts.
fn cut_line(
    line: &LineString<f64>,
    cuts: &mut Vec<(usize, f64, Coord<f64>)>,
    tolerance: f64,
) -> Vec<LineString<f64>> {
    if line.0.len() < 2 || cuts.is_empty() {
        return vec![line.clone()];
    }
    cuts.sort_by(|a, b| {
        (a.0, a.1)
            .partial_cmp(&(b.0, b.1))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut parts = Vec::new();
    let mut current: Vec<Coord<f64>> = vec![line.0[0]];
    let mut cut_iter = cuts.iter().peekable();

    for chord in 0..line.0.len() - 1 {
        while let Some(&&(c, _, point)) = cut_iter.peek() {
            if c != chord {
                break;
            }
            cut_iter.next();

            let last = *current.last().unwrap_or(&line.0[0]);
            if planar_distance(point, last) <= tolerance {
                // Cut coincides with the part's last vertex: split there
                if current.len() >= 2 {
                    parts.push(LineString::new(std::mem::take(&mut current)));
                    current = vec![last];
                }
                continue;
            }
            current.push(point);
            parts.push(LineString::new(std::mem::take(&mut current)));
            current = vec![point];
        }
        // A cut exactly at the next vertex leaves it as the part start;
        // do not duplicate it
        let next = line.0[chord + 1];
        if current.last() != Some(&next) {
            current.push(next);
        }
    }

    if current.len() >= 2 {
        parts.push(LineString::new(current));
    }
    parts
}

fn push_free_endpoints(
    edge: &Edge,
    stop_index: &PointIndex,
    tolerance: f64,
    stack: &mut Vec<Coord<f64>>,
) {
    if let Some((a, b)) = edge.endpoints() {
        if !stop_index.has_within(a.x, a.y, tolerance) {
            stack.push(a);
        }
        if !stop_index.has_within(b.x, b.y, tolerance) {
            stack.push(b);
        }
    }
}

fn planar_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

struct SplitCtx<'a> {
    components: &'a [ConnectedComponent],
    obstacles: &'a ObstacleCollection,
    obstacle_index: &'a PointIndex,
    tolerance: f64,
    max_fragments_per_worker: u64,
}

/// Split every component into fragments, partitioning components across
/// the pool. Returns the merged fragment list and the set of snapped
/// obstacles (unioned by obstacle id).
pub fn split_fragments(
    pool: &WorkerPool,
    components: &[ConnectedComponent],
    obstacles: &ObstacleCollection,
    obstacle_index: &PointIndex,
    tolerance: f64,
    max_fragments_per_worker: u64,
    chunk_count: usize,
) -> Result<(Vec<Fragment>, Vec<SnappedObstacle>)> {
    let work: Vec<usize> = (0..components.len()).collect();
    let chunks = deal_by_cost(work, chunk_count, |&i| {
        components[i].geometry.0.iter().map(|l| l.0.len()).sum()
    });

    let ctx = SplitCtx {
        components,
        obstacles,
        obstacle_index,
        tolerance,
        max_fragments_per_worker,
    };
    let batches = pool.run_chunked(&ctx, chunks, |wctx, chunk| {
        let shared = wctx.shared;
        let mut ids = FragmentIdAllocator::new(wctx.worker_index, shared.max_fragments_per_worker);
        let mut fragments = Vec::new();
        let mut snapped = Vec::new();
        for comp_idx in chunk {
            wctx.checkpoint()?;
            let (f, s) = split_component(
                &shared.components[comp_idx],
                shared.obstacles,
                shared.obstacle_index,
                shared.tolerance,
                &mut ids,
            )?;
            fragments.extend(f);
            snapped.extend(s);
        }
        Ok((fragments, snapped))
    })?;

    let mut fragments = Vec::new();
    let mut seen = HashSet::new();
    let mut snapped = Vec::new();
    for (f, s) in batches {
        fragments.extend(f);
        for snap in s {
            // Overlapping component boxes can snap the same obstacle in
            // two partitions; keep the first in partition order
            if seen.insert(snap.obstacle) {
                snapped.push(snap);
            }
        }
    }
    debug!(
        fragments = fragments.len(),
        snapped = snapped.len(),
        "fragments split"
    );
    Ok((fragments, snapped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use riverine_core::vector::Obstacle;
    use riverine_parallel::WorkerCount;

    const TOL: f64 = 1e-6;

    fn component(id: u64, lines: Vec<Vec<(f64, f64)>>) -> ConnectedComponent {
        ConnectedComponent {
            id,
            segments: (0..lines.len()).collect(),
            geometry: MultiLineString::new(lines.into_iter().map(LineString::from).collect()),
        }
    }

    fn obstacle_setup(points: Vec<(f64, f64)>) -> (ObstacleCollection, PointIndex) {
        let coll = ObstacleCollection::from_obstacles(
            points
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| Obstacle::new(i as i64 + 1, Point::new(x, y)))
                .collect(),
        );
        let index = PointIndex::bulk_load(coll.iter().map(|(i, o)| (i, o.location.x(), o.location.y())));
        (coll, index)
    }

    #[test]
    fn test_no_obstacles_single_fragment() {
        let comp = component(
            1,
            vec![
                vec![(0.0, 0.0), (0.1, 0.0)],
                vec![(0.1, 0.0), (0.2, 0.0)],
            ],
        );
        let (obstacles, index) = obstacle_setup(vec![]);
        let mut ids = FragmentIdAllocator::new(0, 1000);

        let (fragments, snapped) =
            split_component(&comp, &obstacles, &index, TOL, &mut ids).unwrap();

        assert_eq!(fragments.len(), 1);
        assert!(snapped.is_empty());
        assert_relative_eq!(fragments[0].length_km, comp.length_km(), epsilon = 1e-9);
        assert_eq!(fragments[0].component_id, 1);
    }

    #[test]
    fn test_mid_line_obstacle_two_fragments() {
        // One straight line, dam at its midpoint
        let comp = component(1, vec![vec![(0.0, 0.0), (0.2, 0.0)]]);
        let (obstacles, index) = obstacle_setup(vec![(0.1, 0.0)]);
        let mut ids = FragmentIdAllocator::new(0, 1000);

        let (fragments, snapped) =
            split_component(&comp, &obstacles, &index, TOL, &mut ids).unwrap();

        assert_eq!(fragments.len(), 2);
        assert_eq!(snapped.len(), 1);

        let total: f64 = fragments.iter().map(|f| f.length_km).sum();
        assert_relative_eq!(total, comp.length_km(), epsilon = 1e-9);
        assert_relative_eq!(fragments[0].length_km, fragments[1].length_km, epsilon = 1e-9);
    }

    #[test]
    fn test_junction_obstacle_splits_without_cutting() {
        // Dam exactly at the shared endpoint of two lines
        let comp = component(
            1,
            vec![
                vec![(0.0, 0.0), (0.1, 0.0)],
                vec![(0.1, 0.0), (0.2, 0.0)],
            ],
        );
        let (obstacles, index) = obstacle_setup(vec![(0.1, 0.0)]);
        let mut ids = FragmentIdAllocator::new(0, 1000);

        let (fragments, snapped) =
            split_component(&comp, &obstacles, &index, TOL, &mut ids).unwrap();

        assert_eq!(fragments.len(), 2);
        assert_eq!(snapped.len(), 1);
        for f in &fragments {
            // Each fragment is exactly one original line
            assert_eq!(f.geometry.0.len(), 1);
        }
    }

    #[test]
    fn test_obstacle_beyond_tolerance_not_snapped() {
        let comp = component(1, vec![vec![(0.0, 0.0), (0.2, 0.0)]]);
        let (obstacles, index) = obstacle_setup(vec![(0.1, 0.05)]);
        let mut ids = FragmentIdAllocator::new(0, 1000);

        let (fragments, snapped) =
            split_component(&comp, &obstacles, &index, 1e-4, &mut ids).unwrap();

        assert_eq!(fragments.len(), 1);
        assert!(snapped.is_empty());
    }

    #[test]
    fn test_snapped_obstacle_is_projected_onto_line() {
        // Obstacle slightly off the line, within tolerance
        let comp = component(1, vec![vec![(0.0, 0.0), (0.2, 0.0)]]);
        let (obstacles, index) = obstacle_setup(vec![(0.1, 0.0005)]);
        let mut ids = FragmentIdAllocator::new(0, 1000);

        let (fragments, snapped) =
            split_component(&comp, &obstacles, &index, 1e-3, &mut ids).unwrap();

        assert_eq!(fragments.len(), 2);
        assert_eq!(snapped.len(), 1);
        assert_relative_eq!(snapped[0].point.x, 0.1, epsilon = 1e-9);
        assert_relative_eq!(snapped[0].point.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_id_allocator_disjoint_ranges() {
        let mut w0 = FragmentIdAllocator::new(0, 100);
        let mut w1 = FragmentIdAllocator::new(1, 100);

        assert_eq!(w0.next().unwrap(), 0);
        assert_eq!(w0.next().unwrap(), 1);
        assert_eq!(w1.next().unwrap(), 100);
        assert_eq!(w1.next().unwrap(), 101);
    }

    #[test]
    fn test_id_allocator_exhaustion() {
        let mut ids = FragmentIdAllocator::new(0, 2);
        ids.next().unwrap();
        ids.next().unwrap();
        assert!(matches!(ids.next(), Err(Error::Worker(_))));
    }

    #[test]
    fn test_split_fragments_parallel() {
        let components = vec![
            component(1, vec![vec![(0.0, 0.0), (0.2, 0.0)]]),
            component(2, vec![vec![(0.0, 1.0), (0.2, 1.0)]]),
        ];
        let (obstacles, index) = obstacle_setup(vec![(0.1, 0.0)]);
        let pool = WorkerPool::new(WorkerCount::Fixed(2)).unwrap();

        let (fragments, snapped) =
            split_fragments(&pool, &components, &obstacles, &index, TOL, 1000, 2).unwrap();

        // First component split in two, second untouched
        assert_eq!(fragments.len(), 3);
        assert_eq!(snapped.len(), 1);

        // Ids are globally unique across workers
        let mut ids: Vec<u64> = fragments.iter().map(|f| f.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }
}
