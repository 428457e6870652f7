//! Application state for the web layer.

use std::path::PathBuf;
use std::sync::Arc;

use crate::avoidance::WaypointRouter;
use crate::oracle::Oracle;
use crate::places::Places;
use crate::planner::TripPlanner;
use crate::restriction::WaypointSet;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Zone route planner with fares and result cache
    pub planner: Arc<TripPlanner>,

    /// Restriction-avoidance router, which also owns the oracle client
    pub avoidance: Arc<WaypointRouter<Oracle>>,

    /// Curated waypoints with their validation results
    pub waypoints: Arc<WaypointSet>,

    /// Landmarks for name search
    pub places: Arc<Places>,

    /// Directory zone files are reloaded from
    pub zones_dir: Arc<PathBuf>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        planner: TripPlanner,
        avoidance: WaypointRouter<Oracle>,
        waypoints: WaypointSet,
        places: Places,
        zones_dir: PathBuf,
    ) -> Self {
        Self {
            planner: Arc::new(planner),
            avoidance: Arc::new(avoidance),
            waypoints: Arc::new(waypoints),
            places: Arc::new(places),
            zones_dir: Arc::new(zones_dir),
        }
    }
}
