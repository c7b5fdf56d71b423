//! Affine geotransformation for rasters
//!
//! North-up transforms only: zone and output grids in this engine are
//! regular north-up lattices, so the rotation terms of the general
//! affine form are omitted.

use crate::extent::Extent;
use serde::{Deserialize, Serialize};

/// North-up affine transform between pixel and geographic coordinates.
///
/// ```text
/// x = origin_x + col * cell_width
/// y = origin_y - row * cell_height
/// ```
///
/// `origin_x`/`origin_y` is the upper-left corner of the grid;
/// `cell_height` is stored positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell size in X direction
    pub cell_width: f64,
    /// Cell size in Y direction (positive)
    pub cell_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, cell_width: f64, cell_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            cell_width: cell_width.abs(),
            cell_height: cell_height.abs(),
        }
    }

    /// Build the transform of a grid covering `extent` at `cell_size`,
    /// together with its (rows, cols) dimensions. The extent is covered
    /// fully, rounding dimensions up to whole cells.
    pub fn from_extent(extent: Extent, cell_size: f64) -> (Self, usize, usize) {
        let cols = (extent.width() / cell_size).ceil().max(1.0) as usize;
        let rows = (extent.height() / cell_size).ceil().max(1.0) as usize;
        (
            Self::new(extent.min_x, extent.max_y, cell_size, cell_size),
            rows,
            cols,
        )
    }

    /// Geographic coordinates of the center of pixel (col, row).
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.cell_width,
            self.origin_y - (row as f64 + 0.5) * self.cell_height,
        )
    }

    /// Geographic coordinates of the top-left corner of pixel (col, row).
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + col as f64 * self.cell_width,
            self.origin_y - row as f64 * self.cell_height,
        )
    }

    /// Fractional pixel coordinates of a geographic point; use `.floor()`
    /// for integer indices.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.cell_width,
            (self.origin_y - y) / self.cell_height,
        )
    }

    /// Cell size (assumes square cells).
    pub fn cell_size(&self) -> f64 {
        self.cell_width
    }

    /// Geographic extent of a raster of the given dimensions.
    pub fn bounds(&self, rows: usize, cols: usize) -> Extent {
        Extent::new(
            self.origin_x,
            self.origin_y - rows as f64 * self.cell_height,
            self.origin_x + cols as f64 * self.cell_width,
            self.origin_y,
        )
    }

    /// Whether two transforms describe the same lattice within `eps`.
    pub fn aligned_with(&self, other: &GeoTransform, eps: f64) -> bool {
        (self.origin_x - other.origin_x).abs() <= eps
            && (self.origin_y - other.origin_y).abs() <= eps
            && (self.cell_width - other.cell_width).abs() <= eps
            && (self.cell_height - other.cell_height).abs() <= eps
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_to_geo_roundtrip() {
        let gt = GeoTransform::new(100.0, 200.0, 10.0, 10.0);

        let (x, y) = gt.pixel_to_geo(5, 10);
        let (col, row) = gt.geo_to_pixel(x, y);

        assert_relative_eq!(col, 5.5, epsilon = 1e-10);
        assert_relative_eq!(row, 10.5, epsilon = 1e-10);
    }

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::new(0.0, 100.0, 1.0, 1.0);
        let e = gt.bounds(100, 100);

        assert_relative_eq!(e.min_x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(e.min_y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(e.max_x, 100.0, epsilon = 1e-10);
        assert_relative_eq!(e.max_y, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_from_extent() {
        let extent = Extent::new(0.0, 0.0, 2.7, 0.2);
        let (gt, rows, cols) = GeoTransform::from_extent(extent, 0.1);
        assert_eq!(cols, 27);
        assert_eq!(rows, 2);
        assert_relative_eq!(gt.origin_x, 0.0);
        assert_relative_eq!(gt.origin_y, 0.2);
    }

    #[test]
    fn test_aligned_with() {
        let a = GeoTransform::new(0.0, 10.0, 1.0, 1.0);
        let b = GeoTransform::new(0.0, 10.0, 1.0, 1.0);
        let c = GeoTransform::new(0.5, 10.0, 1.0, 1.0);
        assert!(a.aligned_with(&b, 1e-9));
        assert!(!a.aligned_with(&c, 1e-9));
    }
}
