//! OSRM route service DTOs and the oracle's answer type.

use serde::Deserialize;

use crate::geo::Point;

/// A drivable path returned by the oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRoute {
    pub polyline: Vec<Point>,
    pub distance_m: f64,
    pub duration_s: f64,
}

/// Top-level response of `/route/v1`.
#[derive(Debug, Clone, Deserialize)]
pub struct OsrmRouteResponse {
    pub code: String,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsrmRoute {
    /// Meters.
    pub distance: f64,

    /// Seconds.
    pub duration: f64,

    pub geometry: OsrmGeometry,
}

/// GeoJSON `LineString` geometry (`geometries=geojson`).
#[derive(Debug, Clone, Deserialize)]
pub struct OsrmGeometry {
    pub coordinates: Vec<[f64; 2]>,
}

impl OsrmRoute {
    pub fn into_route(self) -> OracleRoute {
        OracleRoute {
            polyline: self
                .geometry
                .coordinates
                .into_iter()
                .map(Point::from_lng_lat)
                .collect(),
            distance_m: self.distance,
            duration_s: self.duration,
        }
    }
}
