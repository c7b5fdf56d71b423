//! Fragment/zone length accounting and the connectivity index
//!
//! Pass one of the zonal rasterizer: walk each fragment's cell grid,
//! look up the zone under every intersecting cell and accumulate the
//! geodetic intersection length into two tables, total length per zone
//! and length per (fragment, zone) pair. The index per zone is
//!
//! `RCI(z) = 100 * sum over fragments of lengthInZone(f, z)^2 / total(z)^2`
//!
//! so a zone spanned by one unbroken fragment scores 100 and a zone cut
//! into many short fragments approaches 0.

use crate::rci::walk::{cell_intersection_km, cell_range, cell_rect};
use riverine_core::vector::Fragment;
use riverine_core::{Raster, Result};
use riverine_parallel::{sum_merge, Band, WorkerPool};
use std::collections::HashMap;
use std::ops::Range;
use tracing::debug;

/// Accumulate intersection lengths for the given rows of the zone grid.
/// Nodata zone cells are skipped.
pub fn accumulate_band(
    fragments: &[Fragment],
    zones: &Raster<i32>,
    band_rows: Range<usize>,
) -> (HashMap<i32, f64>, HashMap<(u64, i32), f64>) {
    let mut zone_totals: HashMap<i32, f64> = HashMap::new();
    let mut frag_zone: HashMap<(u64, i32), f64> = HashMap::new();
    let transform = zones.transform();

    for fragment in fragments {
        let Some(extent) = fragment.extent() else {
            continue;
        };
        let Some((rows, cols)) =
            cell_range(zones.rows(), zones.cols(), transform, &extent, &band_rows)
        else {
            continue;
        };

        for row in rows {
            for col in cols.clone() {
                let rect = cell_rect(transform, row, col);
                let Some(len) = cell_intersection_km(fragment, &rect) else {
                    continue;
                };
                if len <= 0.0 {
                    continue;
                }
                let Ok(zone) = zones.get(row, col) else {
                    continue;
                };
                if zones.is_nodata(zone) {
                    continue;
                }
                *zone_totals.entry(zone).or_insert(0.0) += len;
                *frag_zone.entry((fragment.id, zone)).or_insert(0.0) += len;
            }
        }
    }
    (zone_totals, frag_zone)
}

/// Connectivity index per zone from the two length tables. Values are
/// clamped to [0, 100]; zones with no accumulated length are omitted.
pub fn connectivity_index(
    zone_totals: &HashMap<i32, f64>,
    frag_zone: &HashMap<(u64, i32), f64>,
) -> HashMap<i32, f64> {
    let mut sum_sq: HashMap<i32, f64> = HashMap::new();
    for (&(_, zone), &len) in frag_zone {
        *sum_sq.entry(zone).or_insert(0.0) += len * len;
    }

    let mut index = HashMap::new();
    for (&zone, &total) in zone_totals {
        if total <= 0.0 {
            continue;
        }
        let s = sum_sq.get(&zone).copied().unwrap_or(0.0);
        index.insert(zone, (100.0 * s / (total * total)).clamp(0.0, 100.0));
    }
    index
}

struct LengthCtx<'a> {
    fragments: &'a [Fragment],
    zones: &'a Raster<i32>,
}

/// Run the length accounting pass over south-to-north bands and
/// sum-merge the per-band tables.
pub fn fragment_zone_lengths(
    pool: &WorkerPool,
    fragments: &[Fragment],
    zones: &Raster<i32>,
    band_count: usize,
) -> Result<(HashMap<i32, f64>, HashMap<(u64, i32), f64>)> {
    let bands = Band::split(zones.transform(), zones.rows(), zones.cols(), band_count);
    let ctx = LengthCtx { fragments, zones };

    let parts = pool.run_chunked(&ctx, bands, |wctx, band| {
        wctx.checkpoint()?;
        Ok(accumulate_band(
            wctx.shared.fragments,
            wctx.shared.zones,
            band.row_range(),
        ))
    })?;

    let (zone_parts, frag_parts): (Vec<_>, Vec<_>) = parts.into_iter().unzip();
    let zone_totals = sum_merge(zone_parts);
    let frag_zone = sum_merge(frag_parts);
    debug!(zones = zone_totals.len(), "zone lengths accumulated");
    Ok((zone_totals, frag_zone))
}
