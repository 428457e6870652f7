//! Restriction avoidance through a precomputed waypoint graph.
//!
//! [`GraphBuilder`] runs offline and tests every ordered waypoint pair
//! through the oracle. [`WaypointRouter`] loads the result and, per request,
//! picks intermediate waypoints with a violation-penalized Dijkstra search
//! whose answer is then verified live.

mod builder;
mod config;
mod dijkstra;
mod graph;
mod router;

pub use builder::GraphBuilder;
pub use config::{AnchorSearch, AvoidanceConfig};
pub use dijkstra::{Anchor, AugmentedGraph, GraphPath};
pub use graph::{
    GRAPH_VERSION, GraphEdge, GraphError, GraphMetadata, GraphNode, GraphStats, Link,
    WaypointGraph, WaypointNetwork,
};
pub use router::{PlanStatus, WaypointPlan, WaypointRouter};
