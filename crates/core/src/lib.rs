//! # Riverine Core
//!
//! Core types for the riverine connectivity engine.
//!
//! This crate provides:
//! - `Raster<T>`: generic raster grid type with north-up georeferencing
//! - `Extent`: the shared axis-aligned bounding box
//! - River-network vector model: segments, obstacles, components, fragments
//! - Geodetic length measures (haversine chords)
//! - The workspace error taxonomy

pub mod error;
pub mod extent;
pub mod geodesy;
pub mod raster;
pub mod vector;

pub use error::{Error, Result};
pub use extent::Extent;
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::extent::Extent;
    pub use crate::geodesy::{chord_length_km, line_length_km, multiline_length_km};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::{
        ConnectedComponent, Fragment, Obstacle, ObstacleCollection, RiverSegment,
        SegmentCollection,
    };
}
