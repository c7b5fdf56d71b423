//! Axis-aligned geographic extent
//!
//! One box type shared by rasters, network geometries and spatial index
//! queries: `(min_x, min_y, max_x, max_y)` in CRS units.

use geo_types::{Coord, LineString, MultiLineString};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    /// Smallest extent containing a single coordinate.
    pub fn from_coord(c: Coord<f64>) -> Self {
        Self {
            min_x: c.x,
            min_y: c.y,
            max_x: c.x,
            max_y: c.y,
        }
    }

    /// Extent of a line string. Returns `None` for an empty line.
    pub fn of_line(line: &LineString<f64>) -> Option<Self> {
        let mut coords = line.0.iter();
        let first = coords.next()?;
        let mut ext = Self::from_coord(*first);
        for c in coords {
            ext = ext.include(*c);
        }
        Some(ext)
    }

    /// Extent of a multi-line. Returns `None` if every part is empty.
    pub fn of_multiline(ml: &MultiLineString<f64>) -> Option<Self> {
        let mut ext: Option<Self> = None;
        for line in &ml.0 {
            if let Some(e) = Self::of_line(line) {
                ext = Some(match ext {
                    Some(acc) => acc.union(&e),
                    None => e,
                });
            }
        }
        ext
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn union(&self, other: &Extent) -> Extent {
        Extent {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grow the extent by `amount` on every side.
    pub fn expand(&self, amount: f64) -> Extent {
        Extent {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }

    fn include(&self, c: Coord<f64>) -> Extent {
        Extent {
            min_x: self.min_x.min(c.x),
            min_y: self.min_y.min(c.y),
            max_x: self.max_x.max(c.x),
            max_y: self.max_y.max(c.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_normalizes_corners() {
        let e = Extent::new(10.0, 5.0, 0.0, 0.0);
        assert_eq!(e.min_x, 0.0);
        assert_eq!(e.max_x, 10.0);
        assert_eq!(e.min_y, 0.0);
        assert_eq!(e.max_y, 5.0);
    }

    #[test]
    fn test_extent_intersects() {
        let a = Extent::new(0.0, 0.0, 10.0, 10.0);
        let b = Extent::new(5.0, 5.0, 15.0, 15.0);
        let c = Extent::new(20.0, 20.0, 30.0, 30.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_extent_of_line() {
        let line = LineString::from(vec![(1.0, 2.0), (4.0, -1.0), (3.0, 5.0)]);
        let e = Extent::of_line(&line).unwrap();
        assert_eq!(e.min_x, 1.0);
        assert_eq!(e.min_y, -1.0);
        assert_eq!(e.max_x, 4.0);
        assert_eq!(e.max_y, 5.0);
    }

    #[test]
    fn test_extent_of_empty_line() {
        let line = LineString::new(vec![]);
        assert!(Extent::of_line(&line).is_none());
    }

    #[test]
    fn test_extent_expand_union() {
        let a = Extent::new(0.0, 0.0, 1.0, 1.0).expand(0.5);
        assert_eq!(a.min_x, -0.5);
        assert_eq!(a.max_y, 1.5);

        let b = Extent::new(2.0, 2.0, 3.0, 3.0);
        let u = a.union(&b);
        assert_eq!(u.max_x, 3.0);
        assert_eq!(u.min_x, -0.5);
    }
}
