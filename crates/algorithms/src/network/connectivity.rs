//! Connected-component discovery over the river network
//!
//! Iterative endpoint traversal: pop a point, ask the spatial index for
//! candidate lines, keep those whose true geometric distance is within
//! tolerance, push their endpoints. Traversal state is a visited-set of
//! arena indexes; shared geometry is never marked or mutated.
//!
//! Workers discover components independently from dealt seed chunks, so
//! the same component can surface more than once; the orchestrator
//! deduplicates against a running index of accepted components.

use crate::geometry::point_line_distance;
use crate::spatial::{PointIndex, SegmentIndex};
use geo_types::{MultiLineString, Point};
use riverine_core::vector::{ConnectedComponent, SegmentCollection};
use riverine_core::Result;
use riverine_parallel::{deal_by_cost, WorkerPool};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Discover the component containing `seed`, marking every member in
/// `visited`. Returns `None` when the seed was already visited or does
/// not exist; malformed seeds come back as singleton components.
pub fn discover(
    segments: &SegmentCollection,
    index: &SegmentIndex,
    seed: usize,
    tolerance: f64,
    visited: &mut HashSet<usize>,
) -> Option<Vec<usize>> {
    if visited.contains(&seed) {
        return None;
    }
    let seg = segments.get(seed)?;
    visited.insert(seed);

    if !seg.is_well_formed() {
        warn!(segment_id = seg.id, "untraversable geometry, emitting singleton component");
        return Some(vec![seed]);
    }

    let mut members = vec![seed];
    let mut stack: Vec<Point<f64>> = Vec::new();
    if let Some((a, b)) = seg.endpoints() {
        stack.push(a);
        stack.push(b);
    }

    while let Some(pt) = stack.pop() {
        for cand in index.near_point(pt.x(), pt.y(), tolerance) {
            if visited.contains(&cand) {
                continue;
            }
            let Some(cs) = segments.get(cand) else {
                continue;
            };
            if !cs.is_well_formed() {
                continue;
            }
            // Secondary check: the index match is only an envelope hit
            if point_line_distance(pt, &cs.line) <= tolerance {
                visited.insert(cand);
                members.push(cand);
                if let Some((a, b)) = cs.endpoints() {
                    stack.push(a);
                    stack.push(b);
                }
            }
        }
    }
    Some(members)
}

/// The member used to recognize a component across workers: the segment
/// with the minimum stable id, which is identical no matter which seed
/// started the discovery.
fn representative(
    segments: &SegmentCollection,
    members: &[usize],
) -> Option<(Point<f64>, Point<f64>)> {
    members
        .iter()
        .filter_map(|&idx| segments.get(idx))
        .filter(|seg| seg.endpoints().is_some())
        .min_by_key(|seg| seg.id)
        .and_then(|seg| seg.endpoints())
}

/// Merge per-worker member lists, dropping components that an already
/// accepted component covers within `tolerance`. Accepted components get
/// sequential ids and deterministic member order (by stable segment id).
pub fn dedup_components(
    segments: &SegmentCollection,
    batches: Vec<Vec<Vec<usize>>>,
    tolerance: f64,
) -> Vec<ConnectedComponent> {
    let mut accepted: Vec<ConnectedComponent> = Vec::new();
    let mut reps: Vec<(Point<f64>, Point<f64>)> = Vec::new();
    let mut rep_index = PointIndex::new();

    for members in batches.into_iter().flatten() {
        let Some((start, end)) = representative(segments, &members) else {
            // Only degenerate members: accept as-is, nothing to compare
            accept(segments, members, &mut accepted);
            continue;
        };

        if let Some((idx, dist)) = rep_index.nearest(start.x(), start.y()) {
            if dist <= tolerance {
                let (astart, aend) = reps[idx];
                let start_close = planar_distance(start, astart) <= tolerance;
                let end_close = planar_distance(end, aend) <= tolerance;
                if start_close && end_close {
                    debug!("duplicate component discovery discarded");
                    continue;
                }
            }
        }

        let rep_idx = reps.len();
        reps.push((start, end));
        rep_index.insert(rep_idx, start.x(), start.y());
        accept(segments, members, &mut accepted);
    }
    accepted
}

fn accept(
    segments: &SegmentCollection,
    mut members: Vec<usize>,
    accepted: &mut Vec<ConnectedComponent>,
) {
    members.sort_by_key(|&idx| segments.get(idx).map(|s| s.id).unwrap_or(i64::MAX));
    let lines = members
        .iter()
        .filter_map(|&idx| segments.get(idx))
        .map(|seg| seg.line.clone())
        .collect();
    accepted.push(ConnectedComponent {
        id: accepted.len() as u64 + 1,
        segments: members,
        geometry: MultiLineString::new(lines),
    });
}

fn planar_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    let dx = a.x() - b.x();
    let dy = a.y() - b.y();
    (dx * dx + dy * dy).sqrt()
}

struct ResolveCtx<'a> {
    segments: &'a SegmentCollection,
    index: &'a SegmentIndex,
    tolerance: f64,
}

/// Resolve all connected components of the network, partitioning seed
/// lines across the pool and deduplicating the merged result.
pub fn resolve_components(
    pool: &WorkerPool,
    segments: &SegmentCollection,
    index: &SegmentIndex,
    tolerance: f64,
    chunk_count: usize,
) -> Result<Vec<ConnectedComponent>> {
    let seeds: Vec<usize> = (0..segments.len()).collect();
    let chunks = deal_by_cost(seeds, chunk_count, |&idx| {
        segments.get(idx).map_or(0, |s| s.vertex_count())
    });

    let ctx = ResolveCtx {
        segments,
        index,
        tolerance,
    };
    let batches = pool.run_chunked(&ctx, chunks, |wctx, seeds| {
        let shared = wctx.shared;
        let mut visited = HashSet::new();
        let mut components = Vec::new();
        for seed in seeds {
            wctx.checkpoint()?;
            if let Some(members) =
                discover(shared.segments, shared.index, seed, shared.tolerance, &mut visited)
            {
                components.push(members);
            }
        }
        Ok(components)
    })?;

    let components = dedup_components(segments, batches, tolerance);
    debug!(components = components.len(), "connectivity resolved");
    Ok(components)
}
