//! Geofence checks for road routes.

use std::f64::consts::TAU;

use serde::Serialize;
use tracing::{debug, warn};

use crate::geo::{self, BoundingBox, Point};
use crate::geojson::{self, FeatureCollection, GeoJsonError};

use super::waypoint::Waypoint;

/// A restricted area that road routes must not cross.
#[derive(Debug, Clone, PartialEq)]
pub struct RestrictedPolygon {
    id: String,
    ring: Vec<Point>,
    bounds: Option<BoundingBox>,
}

impl RestrictedPolygon {
    pub fn new(id: impl Into<String>, ring: Vec<Point>) -> Self {
        let bounds = BoundingBox::from_points(&ring);
        Self {
            id: id.into(),
            ring,
            bounds,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ring(&self) -> &[Point] {
        &self.ring
    }

    pub fn contains(&self, p: Point) -> bool {
        self.bounds.is_some_and(|b| b.contains(p)) && geo::point_in_polygon(p, &self.ring)
    }

    fn crossed_by(&self, a: Point, b: Point) -> bool {
        let Some(bounds) = self.bounds else {
            return false;
        };
        let segment = BoundingBox {
            north: a.lat.max(b.lat),
            south: a.lat.min(b.lat),
            east: a.lng.max(b.lng),
            west: a.lng.min(b.lng),
        };
        bounds.intersects(&segment) && geo::segment_intersects_polygon(a, b, &self.ring)
    }
}

/// One path segment crossing one restricted polygon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Index of the segment's first vertex in the path.
    pub segment_index: usize,
    pub polygon_id: String,
}

/// Parameters for the radial safe-point search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafePointSearch {
    pub max_radius_km: f64,
    pub rings: usize,
    pub angles: usize,
}

impl Default for SafePointSearch {
    fn default() -> Self {
        Self {
            max_radius_km: 1.1,
            rings: 30,
            angles: 32,
        }
    }
}

/// Where an endpoint ended up after the safety check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SafePoint {
    pub point: Point,
    pub original: Point,
    pub adjusted: bool,
    pub distance_moved_km: f64,
    /// Whether `point` is outside every restricted polygon.
    pub safe: bool,
}

impl SafePoint {
    fn unchanged(point: Point, safe: bool) -> Self {
        Self {
            point,
            original: point,
            adjusted: false,
            distance_moved_km: 0.0,
            safe,
        }
    }

    fn moved(original: Point, point: Point) -> Self {
        Self {
            point,
            original,
            adjusted: true,
            distance_moved_km: geo::distance(original, point),
            safe: true,
        }
    }
}

/// Safety results for both ends of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EndpointAdjustment {
    pub start: SafePoint,
    pub end: SafePoint,
}

impl EndpointAdjustment {
    pub fn adjusted(&self) -> bool {
        self.start.adjusted || self.end.adjusted
    }
}

/// Tests paths and points against the restricted polygons.
#[derive(Debug, Clone, Default)]
pub struct RestrictionChecker {
    polygons: Vec<RestrictedPolygon>,
}

impl RestrictionChecker {
    pub fn new(polygons: Vec<RestrictedPolygon>) -> Self {
        Self { polygons }
    }

    /// Build from a GeoJSON collection of `Polygon`/`MultiPolygon` features.
    /// Only outer rings are used.
    pub fn from_geojson(collection: &FeatureCollection) -> Result<Self, GeoJsonError> {
        let polygons = geojson::outer_rings(collection)?
            .into_iter()
            .map(|(id, ring)| RestrictedPolygon::new(id, ring))
            .collect();
        Ok(Self { polygons })
    }

    pub fn polygons(&self) -> &[RestrictedPolygon] {
        &self.polygons
    }

    /// Every (segment, polygon) crossing along `path`.
    pub fn check_path(&self, path: &[Point]) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (segment_index, pair) in path.windows(2).enumerate() {
            for polygon in &self.polygons {
                if polygon.crossed_by(pair[0], pair[1]) {
                    violations.push(Violation {
                        segment_index,
                        polygon_id: polygon.id.clone(),
                    });
                }
            }
        }
        violations
    }

    pub fn violation_count(&self, path: &[Point]) -> usize {
        self.check_path(path).len()
    }

    /// The first restricted polygon containing `p`, if any.
    pub fn is_inside(&self, p: Point) -> Option<&str> {
        self.polygons
            .iter()
            .find(|poly| poly.contains(p))
            .map(|poly| poly.id.as_str())
    }

    /// A point outside every restriction, as close to `point` as the search
    /// finds.
    ///
    /// Points already outside are returned unchanged. Otherwise rings of
    /// increasing radius are probed at fixed bearings; if none is clear the
    /// nearest of `fallback` (which must already be validated) is used.
    pub fn find_nearest_safe_point(
        &self,
        point: Point,
        search: &SafePointSearch,
        fallback: &[Waypoint],
    ) -> SafePoint {
        let Some(polygon) = self.is_inside(point) else {
            return SafePoint::unchanged(point, true);
        };
        debug!(%point, polygon, "point inside restriction, searching for safe point");

        let rings = search.rings.max(1);
        let angles = search.angles.max(1);
        for r in 1..=rings {
            let radius = search.max_radius_km * r as f64 / rings as f64;
            for i in 0..angles {
                let bearing = TAU * i as f64 / angles as f64;
                let candidate = geo::offset_km(point, radius, bearing);
                if self.is_inside(candidate).is_none() {
                    let found = SafePoint::moved(point, candidate);
                    debug!(
                        moved_m = (found.distance_moved_km * 1000.0).round(),
                        "found safe point"
                    );
                    return found;
                }
            }
        }

        let nearest = fallback
            .iter()
            .min_by(|a, b| {
                geo::distance(point, a.point).total_cmp(&geo::distance(point, b.point))
            });
        match nearest {
            Some(wp) => {
                debug!(waypoint = %wp.id, "radial search failed, using nearest waypoint");
                SafePoint::moved(point, wp.point)
            }
            None => {
                warn!(%point, "no safe point found");
                SafePoint::unchanged(point, false)
            }
        }
    }

    /// Check both trip endpoints and move any that sit inside a restriction.
    pub fn adjust_endpoints(
        &self,
        start: Point,
        end: Point,
        search: &SafePointSearch,
        fallback: &[Waypoint],
    ) -> EndpointAdjustment {
        EndpointAdjustment {
            start: self.find_nearest_safe_point(start, search, fallback),
            end: self.find_nearest_safe_point(end, search, fallback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restriction::{Side, Waypoint};

    /// Square roughly 220 m on a side centred on (8.945, 125.535).
    fn square(id: &str) -> RestrictedPolygon {
        RestrictedPolygon::new(
            id,
            vec![
                Point::new(8.944, 125.534),
                Point::new(8.944, 125.536),
                Point::new(8.946, 125.536),
                Point::new(8.946, 125.534),
                Point::new(8.944, 125.534),
            ],
        )
    }

    fn checker() -> RestrictionChecker {
        RestrictionChecker::new(vec![square("plaza")])
    }

    #[test]
    fn path_crossing_is_reported_per_segment() {
        let path = [
            Point::new(8.940, 125.530),
            Point::new(8.945, 125.530),
            Point::new(8.945, 125.540),
            Point::new(8.950, 125.540),
        ];
        let violations = checker().check_path(&path);

        assert_eq!(
            violations,
            vec![Violation {
                segment_index: 1,
                polygon_id: "plaza".to_string()
            }]
        );
    }

    #[test]
    fn every_polygon_is_counted() {
        let shifted = RestrictedPolygon::new(
            "market",
            square("x")
                .ring()
                .iter()
                .map(|p| Point::new(p.lat, p.lng + 0.004))
                .collect(),
        );
        let checker = RestrictionChecker::new(vec![square("plaza"), shifted]);
        let path = [Point::new(8.945, 125.530), Point::new(8.945, 125.545)];

        assert_eq!(checker.violation_count(&path), 2);
    }

    #[test]
    fn clear_path_has_no_violations() {
        let path = [Point::new(8.940, 125.530), Point::new(8.940, 125.540)];
        assert!(checker().check_path(&path).is_empty());
    }

    #[test]
    fn inside_lookup() {
        let checker = checker();
        assert_eq!(checker.is_inside(Point::new(8.945, 125.535)), Some("plaza"));
        assert_eq!(checker.is_inside(Point::new(8.947, 125.535)), None);
    }

    #[test]
    fn start_inside_restriction_is_moved_out() {
        let checker = checker();
        let start = Point::new(8.945, 125.535);

        let safe = checker.find_nearest_safe_point(start, &SafePointSearch::default(), &[]);

        assert!(safe.adjusted);
        assert!(safe.safe);
        assert_eq!(safe.original, start);
        assert!(checker.is_inside(safe.point).is_none());
        // Nearest edge is about 110 m away; ring spacing is about 37 m.
        assert!(safe.distance_moved_km > 0.1 && safe.distance_moved_km < 0.2);
    }

    #[test]
    fn outside_point_is_unchanged() {
        let p = Point::new(8.950, 125.535);
        let safe = checker().find_nearest_safe_point(p, &SafePointSearch::default(), &[]);
        assert!(!safe.adjusted);
        assert_eq!(safe.point, p);
    }

    #[test]
    fn falls_back_to_nearest_waypoint() {
        let checker = checker();
        let tiny = SafePointSearch {
            max_radius_km: 0.01,
            rings: 2,
            angles: 4,
        };
        let waypoints = [
            Waypoint::new("far", 8.960, 125.535, "far", Side::North),
            Waypoint::new("near", 8.943, 125.535, "near", Side::South),
        ];

        let safe = checker.find_nearest_safe_point(Point::new(8.945, 125.535), &tiny, &waypoints);
        assert!(safe.adjusted);
        assert_eq!(safe.point, waypoints[1].point);

        let stuck = checker.find_nearest_safe_point(Point::new(8.945, 125.535), &tiny, &[]);
        assert!(!stuck.adjusted);
        assert!(!stuck.safe);
    }

    #[test]
    fn endpoint_report() {
        let report = checker().adjust_endpoints(
            Point::new(8.945, 125.535),
            Point::new(8.950, 125.540),
            &SafePointSearch::default(),
            &[],
        );
        assert!(report.adjusted());
        assert!(report.start.adjusted);
        assert!(!report.end.adjusted);
    }

    #[test]
    fn multipolygon_geojson_loads_outer_rings() {
        let fc = geojson::parse_feature_collection(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"id": 7},
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [[[
                            [125.534, 8.944], [125.536, 8.944], [125.536, 8.946],
                            [125.534, 8.946], [125.534, 8.944]
                        ]]]
                    }
                }]
            }"#,
        )
        .unwrap();
        let checker = RestrictionChecker::from_geojson(&fc).unwrap();

        assert_eq!(checker.polygons().len(), 1);
        assert_eq!(checker.is_inside(Point::new(8.945, 125.535)), Some("7"));
    }
}
