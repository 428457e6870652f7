//! Precompute the waypoint graph.
//!
//! Routes every ordered pair of usable curated waypoints through the oracle
//! and writes the result to the data directory's `waypoint-graph.json`, or
//! to the path given as the first argument.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use trike_router::avoidance::{AvoidanceConfig, GraphBuilder};
use trike_router::cache::CacheConfig;
use trike_router::clock::system_clock;
use trike_router::oracle::OracleClient;
use trike_router::restriction::{WaypointSet, curated_waypoints};
use trike_router::settings::{ServerConfig, build_oracle, load_restrictions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.graph_path());

    // Building against no restrictions would produce a useless graph.
    let checker = Arc::new(load_restrictions(&config.restricted_path())?);
    let waypoints = WaypointSet::validate(curated_waypoints(), &checker);
    info!(
        polygons = checker.polygons().len(),
        usable = waypoints.usable().len(),
        "validated waypoints"
    );

    let client = OracleClient::new(build_oracle(&config)?, checker, &CacheConfig::default());
    let avoidance = AvoidanceConfig::default();
    let graph = GraphBuilder::new(&client, &avoidance, system_clock())
        .build(&waypoints)
        .await;

    graph.save(&output)?;
    let stats = graph.stats();
    info!(
        path = %output.display(),
        nodes = stats.nodes,
        edges = stats.edges,
        avg_out_degree = %format!("{:.1}", stats.edges as f64 / stats.nodes.max(1) as f64),
        "graph written"
    );
    Ok(())
}
