//! End-to-end connectivity run
//!
//! resolve components -> split fragments -> accumulate zone lengths ->
//! rasterize the index, every pass chunked through one worker pool with
//! a fresh read-only context. Preconditions are validated before any
//! parallel work starts; empty inputs produce an empty, all-nodata
//! result rather than an error.

use crate::network::{resolve_components, split_fragments};
use crate::rci::{connectivity_index, fragment_zone_lengths, rasterize_index};
use crate::spatial::{PointIndex, SegmentIndex};
use geo_types::Point;
use riverine_core::vector::{ConnectedComponent, Fragment, ObstacleCollection, SegmentCollection};
use riverine_core::{Error, Raster, Result};
use riverine_parallel::{WorkerCount, WorkerPool};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Parameters for a connectivity run.
#[derive(Debug, Clone)]
pub struct RiverConnectivityParams {
    /// Endpoint matching and snapping tolerance, in CRS units
    pub tolerance: f64,
    /// Worker count configuration: positive is explicit, zero uses all
    /// cores, negative leaves |n| cores free
    pub workers: i32,
    /// Partitions per geometry pass; defaults to the worker count
    pub chunk_count: Option<usize>,
    /// Bands per raster pass; defaults to the worker count
    pub band_count: Option<usize>,
    /// Size of each worker's disjoint fragment-id range
    pub max_fragments_per_worker: u64,
}

impl Default for RiverConnectivityParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            workers: 0,
            chunk_count: None,
            band_count: None,
            max_fragments_per_worker: 1_000_000,
        }
    }
}

/// Result of a connectivity run.
#[derive(Debug)]
pub struct RiverConnectivity {
    pub components: Vec<ConnectedComponent>,
    pub fragments: Vec<Fragment>,
    /// Input obstacles with `connected` set where snapping succeeded
    pub obstacles: ObstacleCollection,
    /// Zone id to connectivity index in [0, 100]
    pub index: HashMap<i32, f64>,
    /// Index painted at the zone raster's extent and cell size
    pub raster: Raster<f64>,
}

/// Compute connectivity, fragmentation and the zonal index over a river
/// network, its obstacles and a zone raster.
pub fn river_connectivity(
    segments: &SegmentCollection,
    obstacles: &ObstacleCollection,
    zones: &Raster<i32>,
    params: &RiverConnectivityParams,
) -> Result<RiverConnectivity> {
    validate(params, zones)?;

    let pool = WorkerPool::new(WorkerCount::from_config(params.workers))?;
    let chunk_count = params.chunk_count.unwrap_or_else(|| pool.workers());
    let band_count = params.band_count.unwrap_or_else(|| pool.workers());

    let out_obstacles = obstacles.clone();

    if segments.is_empty() {
        warn!("no river segments supplied, producing empty result");
        return Ok(empty_result(zones, out_obstacles));
    }
    if obstacles.is_empty() {
        debug!("no obstacles supplied, every component becomes one fragment");
    }

    let segment_index = SegmentIndex::build(segments);
    let obstacle_index = PointIndex::bulk_load(
        obstacles
            .iter()
            .map(|(idx, o)| (idx, o.location.x(), o.location.y())),
    );

    let components = resolve_components(&pool, segments, &segment_index, params.tolerance, chunk_count)?;

    let (fragments, snapped) = split_fragments(
        &pool,
        &components,
        obstacles,
        &obstacle_index,
        params.tolerance,
        params.max_fragments_per_worker,
        chunk_count,
    )?;

    let mut out_obstacles = out_obstacles;
    for snap in &snapped {
        out_obstacles.mark_connected(snap.obstacle, Point::new(snap.point.x, snap.point.y));
    }

    let (zone_totals, frag_zone) = fragment_zone_lengths(&pool, &fragments, zones, band_count)?;
    if zone_totals.is_empty() {
        warn!("no overlap between the network and the zone raster");
    }
    let index = connectivity_index(&zone_totals, &frag_zone);

    let raster = rasterize_index(
        &pool,
        &fragments,
        &index,
        zones,
        zones.extent(),
        zones.cell_size(),
        band_count,
    )?;

    debug!(
        components = components.len(),
        fragments = fragments.len(),
        zones = index.len(),
        "connectivity run complete"
    );
    Ok(RiverConnectivity {
        components,
        fragments,
        obstacles: out_obstacles,
        index,
        raster,
    })
}

fn validate(params: &RiverConnectivityParams, zones: &Raster<i32>) -> Result<()> {
    if !params.tolerance.is_finite() || params.tolerance <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "tolerance",
            value: params.tolerance.to_string(),
            reason: "must be a positive finite distance".into(),
        });
    }
    if params.max_fragments_per_worker == 0 {
        return Err(Error::InvalidParameter {
            name: "max_fragments_per_worker",
            value: "0".into(),
            reason: "id ranges need at least one slot".into(),
        });
    }
    if zones.is_empty() {
        return Err(Error::InvalidDimensions {
            width: zones.cols(),
            height: zones.rows(),
        });
    }
    if zones.cell_size() <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "zone cell size",
            value: zones.cell_size().to_string(),
            reason: "must be positive".into(),
        });
    }
    Ok(())
}

fn empty_result(zones: &Raster<i32>, obstacles: ObstacleCollection) -> RiverConnectivity {
    let mut raster = Raster::filled(zones.rows(), zones.cols(), f64::NAN);
    raster.set_transform(*zones.transform());
    raster.set_nodata(Some(f64::NAN));
    RiverConnectivity {
        components: Vec::new(),
        fragments: Vec::new(),
        obstacles,
        index: HashMap::new(),
        raster,
    }
}
