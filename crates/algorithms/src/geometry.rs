//! Planar geometry helpers for network traversal and cell clipping
//!
//! Distances here are planar (CRS units); geodetic lengths are computed
//! separately from the clipped coordinates.

use geo_types::{Coord, LineString, Point};
use riverine_core::Extent;

/// Squared distance from `p` to the chord `a`-`b`.
pub fn point_chord_distance_sq(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;

    let t = if len_sq > 0.0 {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let cx = a.x + t * dx - p.x;
    let cy = a.y + t * dy - p.y;
    cx * cx + cy * cy
}

/// Distance from a point to the closest chord of a polyline.
/// Returns infinity for polylines with fewer than two vertices.
pub fn point_line_distance(p: Point<f64>, line: &LineString<f64>) -> f64 {
    line.0
        .windows(2)
        .map(|w| point_chord_distance_sq(p.0, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
        .sqrt()
}

/// Nearest point on a polyline to `p`.
#[derive(Debug, Clone, Copy)]
pub struct PolylineSnap {
    /// Planar distance from the query point
    pub distance: f64,
    /// Index of the chord holding the nearest point
    pub chord: usize,
    /// Position along the chord in [0, 1]
    pub t: f64,
    pub point: Coord<f64>,
}

/// Project `p` onto the polyline and return the nearest position.
/// Returns `None` for polylines with fewer than two vertices.
pub fn nearest_point_on_line(p: Point<f64>, line: &LineString<f64>) -> Option<PolylineSnap> {
    let mut best: Option<PolylineSnap> = None;

    for (chord, w) in line.0.windows(2).enumerate() {
        let (a, b) = (w[0], w[1]);
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len_sq = dx * dx + dy * dy;

        let t = if len_sq > 0.0 {
            (((p.x() - a.x) * dx + (p.y() - a.y) * dy) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let point = Coord {
            x: a.x + t * dx,
            y: a.y + t * dy,
        };
        let ddx = point.x - p.x();
        let ddy = point.y - p.y();
        let distance = (ddx * ddx + ddy * ddy).sqrt();

        if best.map_or(true, |s| distance < s.distance) {
            best = Some(PolylineSnap {
                distance,
                chord,
                t,
                point,
            });
        }
    }
    best
}

/// Clip the chord `a`-`b` against an axis-aligned rectangle
/// (Liang-Barsky). Returns the clipped endpoints, or `None` if the
/// chord misses the rectangle or is degenerate.
pub fn clip_chord_to_rect(
    a: Coord<f64>,
    b: Coord<f64>,
    rect: &Extent,
) -> Option<(Coord<f64>, Coord<f64>)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;

    if dx == 0.0 && dy == 0.0 {
        return None;
    }

    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    let checks = [
        (-dx, a.x - rect.min_x),
        (dx, rect.max_x - a.x),
        (-dy, a.y - rect.min_y),
        (dy, rect.max_y - a.y),
    ];

    for (p, q) in checks {
        if p == 0.0 {
            // Parallel to this boundary: outside means no intersection
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return None;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }
    }

    Some((
        Coord {
            x: a.x + t0 * dx,
            y: a.y + t0 * dy,
        },
        Coord {
            x: a.x + t1 * dx,
            y: a.y + t1 * dy,
        },
    ))
}
