//! Point and bounding-box value types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::math::KM_PER_DEGREE;

/// Scale used to quantize coordinates into hashable keys (1e-6 degrees,
/// roughly 0.1 m at the equator).
const KEY_SCALE: f64 = 1_000_000.0;

/// Relative slack added by [`BoundingBox::expanded_km`] to cover the gap
/// between great-circle and along-parallel distance.
const EXPANSION_MARGIN: f64 = 1.01;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build a point from a GeoJSON-ordered `[lng, lat]` pair.
    pub fn from_lng_lat(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[1],
            lng: pair[0],
        }
    }

    /// GeoJSON-ordered `[lng, lat]` pair.
    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    /// Hashable, quantized form of this point.
    pub fn key(self) -> CoordKey {
        CoordKey::from(self)
    }

    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// A point quantized to micro-degrees so it can be used as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordKey {
    lat_e6: i64,
    lng_e6: i64,
}

impl From<Point> for CoordKey {
    fn from(p: Point) -> Self {
        Self {
            lat_e6: (p.lat * KEY_SCALE).round() as i64,
            lng_e6: (p.lng * KEY_SCALE).round() as i64,
        }
    }
}

/// Axis-aligned bounds in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Bounds of a set of points, or `None` when the set is empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self {
            north: first.lat,
            south: first.lat,
            east: first.lng,
            west: first.lng,
        };
        for p in iter {
            bbox.north = bbox.north.max(p.lat);
            bbox.south = bbox.south.min(p.lat);
            bbox.east = bbox.east.max(p.lng);
            bbox.west = bbox.west.min(p.lng);
        }
        Some(bbox)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.lat <= self.north && p.lat >= self.south && p.lng <= self.east && p.lng >= self.west
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.south <= other.north
            && other.south <= self.north
            && self.west <= other.east
            && other.west <= self.east
    }

    /// Grow the box by at least `km` in every direction.
    ///
    /// Any point within `km` (haversine) of a point in the box lies inside
    /// the result, so it can prefilter exact distance checks.
    pub fn expanded_km(&self, km: f64) -> Self {
        let km = km * EXPANSION_MARGIN;
        let dlat = km / KM_PER_DEGREE;
        let north = self.north + dlat;
        let south = self.south - dlat;
        // Degrees of longitude are shortest at the edge farthest from the equator.
        let widest = north.abs().max(south.abs()).min(90.0).to_radians();
        let dlng = km / (KM_PER_DEGREE * widest.cos().max(1e-6));
        Self {
            north,
            south,
            east: self.east + dlng,
            west: self.west - dlng,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lng_lat_roundtrip_swaps_axes() {
        let p = Point::from_lng_lat([125.54, 8.95]);
        assert_eq!(p.lat, 8.95);
        assert_eq!(p.lng, 125.54);
        assert_eq!(p.to_lng_lat(), [125.54, 8.95]);
    }

    #[test]
    fn keys_ignore_sub_micro_degree_noise() {
        let a = Point::new(8.9500001, 125.5400001);
        let b = Point::new(8.95, 125.54);
        assert_eq!(a.key(), b.key());
        assert_ne!(Point::new(8.951, 125.54).key(), b.key());
    }

    #[test]
    fn bounding_box_of_points() {
        let pts = [
            Point::new(8.96, 125.52),
            Point::new(8.95, 125.54),
            Point::new(8.954, 125.53),
        ];
        let bbox = BoundingBox::from_points(&pts).unwrap();
        assert_eq!(bbox.north, 8.96);
        assert_eq!(bbox.south, 8.95);
        assert_eq!(bbox.east, 125.54);
        assert_eq!(bbox.west, 125.52);
        assert!(bbox.contains(Point::new(8.955, 125.53)));
        assert!(!bbox.contains(Point::new(8.97, 125.53)));
    }

    #[test]
    fn empty_points_have_no_bounds() {
        assert!(BoundingBox::from_points(std::iter::empty::<&Point>()).is_none());
    }

    #[test]
    fn expanded_box_covers_points_at_exact_distance() {
        let origin = Point::new(8.95, 125.53);
        let bbox = BoundingBox::from_points(&[origin]).unwrap().expanded_km(0.2);
        for bearing in [0.0, 0.5, 1.5, 3.0, 4.5, 6.0] {
            let edge = crate::geo::offset_km(origin, 0.2, bearing);
            assert!(bbox.contains(edge), "bearing {bearing}: {edge} outside");
        }
        let north = Point::new(origin.lat + 0.1999 / KM_PER_DEGREE, origin.lng);
        assert!(bbox.contains(north));
    }

    #[test]
    fn expanded_boxes_intersect() {
        let a = BoundingBox::from_points(&[Point::new(8.95, 125.50)]).unwrap();
        let b = BoundingBox::from_points(&[Point::new(8.95, 125.501)]).unwrap();
        assert!(!a.intersects(&b));
        assert!(a.expanded_km(0.2).intersects(&b));
    }
}
