//! Cell-grid walking shared by the index and rasterization passes
//!
//! Each fragment is visited through a tight bounding-box grid of cells
//! at the zone raster's resolution; per-cell intersections are chord
//! clips against the cell rectangle.

use crate::geometry::clip_chord_to_rect;
use riverine_core::geodesy::chord_length_km;
use riverine_core::raster::GeoTransform;
use riverine_core::vector::Fragment;
use riverine_core::Extent;
use std::ops::Range;

/// Grid cells covered by `extent`, clipped to the grid and to a band's
/// row range. `None` when nothing overlaps.
pub(crate) fn cell_range(
    rows_total: usize,
    cols_total: usize,
    transform: &GeoTransform,
    extent: &Extent,
    band_rows: &Range<usize>,
) -> Option<(Range<usize>, Range<usize>)> {
    let (c0, r0) = transform.geo_to_pixel(extent.min_x, extent.max_y);
    let (c1, r1) = transform.geo_to_pixel(extent.max_x, extent.min_y);
    if c1 < 0.0 || r1 < 0.0 {
        return None;
    }

    let col_start = c0.floor().max(0.0) as usize;
    let row_start = r0.floor().max(0.0) as usize;
    let col_end = (c1.floor() as usize + 1).min(cols_total);
    let row_end = (r1.floor() as usize + 1).min(rows_total);
    if col_start >= col_end || row_start >= row_end {
        return None;
    }

    let row_start = row_start.max(band_rows.start);
    let row_end = row_end.min(band_rows.end);
    if row_start >= row_end {
        return None;
    }
    Some((row_start..row_end, col_start..col_end))
}

/// Rectangle of cell (row, col).
pub(crate) fn cell_rect(transform: &GeoTransform, row: usize, col: usize) -> Extent {
    let (x, y) = transform.pixel_to_geo_corner(col, row);
    Extent::new(x, y - transform.cell_height, x + transform.cell_width, y)
}

/// Geodetic length of the fragment's intersection with a cell
/// rectangle, or `None` if the geometry misses the cell entirely.
pub(crate) fn cell_intersection_km(fragment: &Fragment, rect: &Extent) -> Option<f64> {
    let mut touched = false;
    let mut total = 0.0;
    for line in &fragment.geometry.0 {
        for w in line.0.windows(2) {
            if let Some((a, b)) = clip_chord_to_rect(w[0], w[1], rect) {
                touched = true;
                total += chord_length_km(a.x, a.y, b.x, b.y);
            }
        }
    }
    touched.then_some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::{LineString, MultiLineString};

    fn fragment(coords: Vec<(f64, f64)>) -> Fragment {
        Fragment {
            id: 1,
            component_id: 1,
            geometry: MultiLineString::new(vec![LineString::from(coords)]),
            length_km: 0.0,
        }
    }

    #[test]
    fn test_cell_range_clips_to_grid_and_band() {
        let gt = GeoTransform::new(0.0, 10.0, 1.0, 1.0);
        let extent = Extent::new(2.5, 3.5, 4.5, 8.5);

        let (rows, cols) = cell_range(10, 10, &gt, &extent, &(0..10)).unwrap();
        assert_eq!(rows, 1..7);
        assert_eq!(cols, 2..5);

        // Restricting to a band narrows the rows
        let (rows, _) = cell_range(10, 10, &gt, &extent, &(5..10)).unwrap();
        assert_eq!(rows, 5..7);

        // A disjoint band yields nothing
        assert!(cell_range(10, 10, &gt, &extent, &(8..10)).is_none());
    }

    #[test]
    fn test_cell_range_outside_grid() {
        let gt = GeoTransform::new(0.0, 10.0, 1.0, 1.0);
        let extent = Extent::new(-5.0, -5.0, -1.0, -1.0);
        assert!(cell_range(10, 10, &gt, &extent, &(0..10)).is_none());
    }

    #[test]
    fn test_cell_rect() {
        let gt = GeoTransform::new(0.0, 10.0, 1.0, 1.0);
        let rect = cell_rect(&gt, 0, 0);
        assert_relative_eq!(rect.min_x, 0.0);
        assert_relative_eq!(rect.max_x, 1.0);
        assert_relative_eq!(rect.min_y, 9.0);
        assert_relative_eq!(rect.max_y, 10.0);
    }

    #[test]
    fn test_cell_intersection() {
        let f = fragment(vec![(0.0, 0.5), (2.0, 0.5)]);

        // Crosses the cell fully: one cell-width of length
        let rect = Extent::new(0.0, 0.0, 1.0, 1.0);
        let len = cell_intersection_km(&f, &rect).unwrap();
        assert!(len > 0.0);

        // Far away: no intersection
        let rect = Extent::new(10.0, 10.0, 11.0, 11.0);
        assert!(cell_intersection_km(&f, &rect).is_none());
    }
}
