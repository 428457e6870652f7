//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::avoidance::GraphStats;
use crate::cache::CacheStats;
use crate::geo::Point;
use crate::places::Place;
use crate::planner::ZoneSummary;
use crate::restriction::WaypointStatus;
use crate::zones::ZoneId;

/// Request for ranked trip suggestions.
#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    pub start: Point,
    pub end: Point,

    /// Use student/senior/PWD fares
    #[serde(default)]
    pub discounted: bool,
}

/// Request to change the current fuel price.
#[derive(Debug, Deserialize)]
pub struct FuelPriceRequest {
    pub fuel_price: f64,
}

/// Request to add a temporary fare multiplier.
#[derive(Debug, Deserialize)]
pub struct AdjustmentRequest {
    /// Zone the multiplier applies to; all zones when absent
    pub zone: Option<ZoneId>,

    pub multiplier: f64,

    /// Lifetime in hours (defaults to 24)
    pub hours: Option<f64>,
}

/// Landmark search query.
#[derive(Debug, Deserialize)]
pub struct PlaceSearchRequest {
    /// Name fragment, matched case-insensitively
    pub q: String,

    /// Maximum results (default 10)
    pub limit: Option<usize>,
}

/// Landmarks matching a search.
#[derive(Debug, Serialize)]
pub struct PlaceSearchResponse {
    pub places: Vec<Place>,
}

/// Request for restriction-avoiding waypoints.
#[derive(Debug, Deserialize)]
pub struct AvoidRequest {
    pub start: Point,
    pub end: Point,
}

/// Request for a driving route.
#[derive(Debug, Deserialize)]
pub struct DriveRequest {
    pub start: Point,
    pub end: Point,

    /// Intermediate points, in order
    #[serde(default)]
    pub waypoints: Vec<Point>,
}

/// Curated waypoint diagnostics.
#[derive(Debug, Serialize)]
pub struct WaypointsResponse {
    pub usable: usize,
    pub excluded: usize,
    pub waypoints: Vec<WaypointStatus>,
}

/// Waypoint graph and oracle statistics.
#[derive(Debug, Serialize)]
pub struct GraphResponse {
    pub graph: GraphStats,
    pub oracle_cache: CacheStats,
    pub oracle_requests: u64,
}

/// Result of a zone reload.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub version: u64,
    pub zones: Vec<ZoneSummary>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
