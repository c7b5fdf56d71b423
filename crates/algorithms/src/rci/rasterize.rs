//! Painting the connectivity index back onto a raster
//!
//! Pass two of the zonal rasterizer: re-walk every fragment's cell grid
//! and paint each intersecting cell with the index of the zone under
//! it. Cells never touched by a fragment-zone intersection stay nodata.

use crate::rci::walk::{cell_intersection_km, cell_range, cell_rect};
use ndarray::Array2;
use riverine_core::vector::Fragment;
use riverine_core::{Error, Extent, Raster, Result};
use riverine_parallel::{stack_rows, Band, WorkerPool};
use std::collections::HashMap;
use std::ops::Range;

/// Paint the index values for the given rows of the output grid.
/// Returns the band's row-chunk; untouched cells are NaN.
pub fn paint_band(
    fragments: &[Fragment],
    index: &HashMap<i32, f64>,
    zones: &Raster<i32>,
    band_rows: Range<usize>,
) -> Array2<f64> {
    let mut out = Array2::from_elem((band_rows.len(), zones.cols()), f64::NAN);
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
                if cell_intersection_km(fragment, &rect).is_none() {
                    continue;
                }
                let Ok(zone) = zones.get(row, col) else {
                    continue;
                };
                if zones.is_nodata(zone) {
                    continue;
                }
                if let Some(&value) = index.get(&zone) {
                    out[(row - band_rows.start, col)] = value;
                }
            }
        }
    }
    out
}

struct PaintCtx<'a> {
    fragments: &'a [Fragment],
    index: &'a HashMap<i32, f64>,
    zones: &'a Raster<i32>,
}

/// Rasterize the index at the requested extent and cell size, chunked
/// by south-to-north bands and reassembled in reverse band order.
///
/// The requested grid must match the zone raster's lattice; a mismatch
/// is a precondition failure, caught before any parallel work starts.
pub fn rasterize_index(
    pool: &WorkerPool,
    fragments: &[Fragment],
    index: &HashMap<i32, f64>,
    zones: &Raster<i32>,
    extent: Extent,
    cell_size: f64,
    band_count: usize,
) -> Result<Raster<f64>> {
    let eps = zones.cell_size() * 1e-6;
    let zone_extent = zones.extent();
    let extent_matches = (extent.min_x - zone_extent.min_x).abs() <= eps
        && (extent.min_y - zone_extent.min_y).abs() <= eps
        && (extent.max_x - zone_extent.max_x).abs() <= eps
        && (extent.max_y - zone_extent.max_y).abs() <= eps;
    if !extent_matches || (cell_size - zones.cell_size()).abs() > eps {
        return Err(Error::GridMismatch(format!(
            "requested output grid (cell {}) does not align with the zone raster (cell {})",
            cell_size,
            zones.cell_size()
        )));
    }

    let bands = Band::split(zones.transform(), zones.rows(), zones.cols(), band_count);
    let ctx = PaintCtx {
        fragments,
        index,
        zones,
    };

    let chunks = pool.run_chunked(&ctx, bands, |wctx, band| {
        wctx.checkpoint()?;
        Ok(paint_band(
            wctx.shared.fragments,
            wctx.shared.index,
            wctx.shared.zones,
            band.row_range(),
        ))
    })?;

    let data = stack_rows(chunks, true)?;
    let mut out = Raster::from_array(data);
    out.set_transform(*zones.transform());
    out.set_nodata(Some(f64::NAN));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::{LineString, MultiLineString};
    use riverine_core::GeoTransform;
    use riverine_parallel::WorkerCount;

    fn fragment(id: u64, coords: Vec<(f64, f64)>) -> Fragment {
        Fragment {
            id,
            component_id: 1,
            geometry: MultiLineString::new(vec![LineString::from(coords)]),
            length_km: 1.0,
        }
    }

    fn single_zone(rows: usize, cols: usize) -> Raster<i32> {
        let mut zones = Raster::filled(rows, cols, 1);
        zones.set_transform(GeoTransform::new(0.0, rows as f64 * 0.1, 0.1, 0.1));
        zones.set_nodata(Some(0));
        zones
    }

    #[test]
    fn test_paint_band_touched_cells_only() {
        let zones = single_zone(2, 4);
        let index = HashMap::from([(1, 42.0)]);
        // Crosses the bottom row only
        let f = fragment(1, vec![(0.05, 0.05), (0.35, 0.05)]);

        let out = paint_band(&[f], &index, &zones, 0..2);
        assert_eq!(out.dim(), (2, 4));
        // Top row untouched
        for col in 0..4 {
            assert!(out[(0, col)].is_nan());
        }
        // Bottom row painted
        for col in 0..4 {
            assert_relative_eq!(out[(1, col)], 42.0);
        }
    }

    #[test]
    fn test_rasterize_band_invariance_is_bit_identical() {
        let zones = single_zone(6, 4);
        let index = HashMap::from([(1, 73.5)]);
        let fragments = vec![
            fragment(1, vec![(0.05, 0.05), (0.35, 0.05)]),
            fragment(2, vec![(0.05, 0.02), (0.05, 0.55)]),
        ];
        let pool = WorkerPool::new(WorkerCount::Fixed(3)).unwrap();

        let one = rasterize_index(
            &pool,
            &fragments,
            &index,
            &zones,
            zones.extent(),
            zones.cell_size(),
            1,
        )
        .unwrap();
        let three = rasterize_index(
            &pool,
            &fragments,
            &index,
            &zones,
            zones.extent(),
            zones.cell_size(),
            3,
        )
        .unwrap();

        assert_eq!(one.shape(), three.shape());
        for row in 0..one.rows() {
            for col in 0..one.cols() {
                let a = one.get(row, col).unwrap();
                let b = three.get(row, col).unwrap();
                assert!(
                    a == b || (a.is_nan() && b.is_nan()),
                    "cell ({}, {}) differs: {} vs {}",
                    row,
                    col,
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_rasterize_rejects_mismatched_grid() {
        let zones = single_zone(2, 4);
        let pool = WorkerPool::new(WorkerCount::Fixed(1)).unwrap();
        let index = HashMap::new();

        let wrong_cell = rasterize_index(
            &pool,
            &[],
            &index,
            &zones,
            zones.extent(),
            0.05,
            1,
        );
        assert!(matches!(wrong_cell, Err(Error::GridMismatch(_))));

        let wrong_extent = rasterize_index(
            &pool,
            &[],
            &index,
            &zones,
            Extent::new(0.0, 0.0, 1.0, 1.0),
            zones.cell_size(),
            1,
        );
        assert!(matches!(wrong_extent, Err(Error::GridMismatch(_))));
    }

    #[test]
    fn test_rasterize_preserves_metadata() {
        let zones = single_zone(2, 4);
        let pool = WorkerPool::new(WorkerCount::Fixed(1)).unwrap();
        let out = rasterize_index(
            &pool,
            &[],
            &HashMap::new(),
            &zones,
            zones.extent(),
            zones.cell_size(),
            2,
        )
        .unwrap();

        assert_eq!(out.shape(), zones.shape());
        assert_eq!(out.transform(), zones.transform());
        assert!(out.get(0, 0).unwrap().is_nan());
    }
}
