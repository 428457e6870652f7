//! Restricted areas and the waypoints that route around them.
//!
//! Road routes returned by the routing oracle are checked segment by segment
//! against a set of restricted polygons. Endpoints that fall inside a
//! restriction are moved to the nearest clear point.

mod checker;
mod waypoint;

pub use checker::{
    EndpointAdjustment, RestrictedPolygon, RestrictionChecker, SafePoint, SafePointSearch,
    Violation,
};
pub use waypoint::{Side, Waypoint, WaypointSet, WaypointStatus, curated_waypoints};
