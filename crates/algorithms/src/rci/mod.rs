//! Zonal connectivity index and its rasterization
//!
//! Two chunked passes over the zone grid: length accounting per
//! (fragment, zone), then painting the per-zone index back onto an
//! output raster at the zone raster's resolution.

mod lengths;
mod rasterize;
mod walk;

pub use lengths::{accumulate_band, connectivity_index, fragment_zone_lengths};
pub use rasterize::{paint_band, rasterize_index};
