//! Main Raster type

use crate::error::{Error, Result};
use crate::extent::Extent;
use crate::raster::{GeoTransform, RasterElement};
use ndarray::Array2;

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in row-major order with an
/// associated north-up transform and optional no-data sentinel. Row 0 is
/// the northernmost row.
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a raster with the same transform but a different cell type,
    /// filled with zeros
    pub fn with_same_meta<U: RasterElement>(&self) -> Raster<U> {
        Raster {
            data: Array2::zeros(self.data.dim()),
            transform: self.transform,
            nodata: None,
        }
    }

    /// Create a raster with the same dimensions and metadata, filled with a value
    pub fn like(&self, fill_value: T) -> Self {
        Self {
            data: Array2::from_elem(self.data.dim(), fill_value),
            transform: self.transform,
            nodata: self.nodata,
        }
    }

    // Dimensions

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Consume the raster and return the underlying array
    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    // Metadata

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Geographic extent of the grid
    pub fn extent(&self) -> Extent {
        self.transform.bounds(self.rows(), self.cols())
    }

    // Coordinate conversion

    /// Geographic coordinates of the center of cell (row, col)
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Fractional pixel coordinates of a geographic point
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        self.transform.geo_to_pixel(x, y)
    }

    /// Integer (row, col) of the cell containing a geographic point, or
    /// `None` if the point falls outside the grid.
    pub fn row_col_at_xy(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (col, row) = self.geo_to_pixel(x, y);
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col.floor() as usize, row.floor() as usize);
        if row >= self.rows() || col >= self.cols() {
            return None;
        }
        Some((row, col))
    }

    // Value checks

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f32> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<f32> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42.0);
        assert!(raster.get(10, 0).is_err());
        assert!(raster.set(0, 10, 1.0).is_err());
    }

    #[test]
    fn test_row_col_at_xy() {
        let mut raster: Raster<i32> = Raster::new(4, 4);
        raster.set_transform(GeoTransform::new(0.0, 4.0, 1.0, 1.0));

        // Cell centers
        assert_eq!(raster.row_col_at_xy(0.5, 3.5), Some((0, 0)));
        assert_eq!(raster.row_col_at_xy(3.5, 0.5), Some((3, 3)));

        // Outside the grid
        assert_eq!(raster.row_col_at_xy(-0.5, 3.5), None);
        assert_eq!(raster.row_col_at_xy(0.5, 4.5), None);
        assert_eq!(raster.row_col_at_xy(5.0, 1.0), None);
    }

    #[test]
    fn test_nodata_check() {
        let mut raster: Raster<i32> = Raster::filled(2, 2, 7);
        raster.set_nodata(Some(-1));
        assert!(raster.is_nodata(-1));
        assert!(!raster.is_nodata(7));
    }

    #[test]
    fn test_extent() {
        let mut raster: Raster<f64> = Raster::new(10, 20);
        raster.set_transform(GeoTransform::new(100.0, 50.0, 2.0, 1.0));
        let e = raster.extent();
        assert_eq!(e.min_x, 100.0);
        assert_eq!(e.max_x, 140.0);
        assert_eq!(e.min_y, 40.0);
        assert_eq!(e.max_y, 50.0);
    }
}
