//! Geodetic length measures
//!
//! Great-circle chord lengths on the mean earth sphere, in kilometers.
//! Coordinates are geographic (longitude, latitude) in degrees.

use geo::{Distance, Haversine};
use geo_types::{LineString, MultiLineString, Point};

/// Great-circle chord length between two geographic coordinates, in km.
pub fn chord_length_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    Haversine::distance(Point::new(lon1, lat1), Point::new(lon2, lat2)) / 1000.0
}

/// Geodetic length of a line string: sum of chord lengths between
/// consecutive vertices, in km.
pub fn line_length_km(line: &LineString<f64>) -> f64 {
    line.0
        .windows(2)
        .map(|w| chord_length_km(w[0].x, w[0].y, w[1].x, w[1].y))
        .sum()
}

/// Geodetic length of a multi-line, in km.
pub fn multiline_length_km(ml: &MultiLineString<f64>) -> f64 {
    ml.0.iter().map(line_length_km).sum()
}
