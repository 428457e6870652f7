use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use trike_router::avoidance::{AvoidanceConfig, WaypointRouter};
use trike_router::cache::CacheConfig;
use trike_router::clock::system_clock;
use trike_router::fare::FareEngine;
use trike_router::oracle::OracleClient;
use trike_router::places::Places;
use trike_router::planner::{SearchConfig, TripPlanner};
use trike_router::restriction::{WaypointSet, curated_waypoints};
use trike_router::settings::{
    ServerConfig, build_oracle, load_fares_or_default, load_graph_or_default,
    load_restrictions_or_default,
};
use trike_router::web::{AppState, create_router};
use trike_router::zones::load_zones_or_default;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let clock = system_clock();
    let cache_config = CacheConfig::default();

    // Zones and fares
    let zones = load_zones_or_default(&config.zones_dir());
    let fare_file = load_fares_or_default(&config.fares_path());
    let fuel_price = config.fuel_price.unwrap_or(fare_file.current_fuel_price);
    let fares = FareEngine::new(fare_file.brackets, fuel_price, clock.clone())?;
    let planner = TripPlanner::new(
        zones,
        fares,
        SearchConfig::default(),
        &cache_config,
        clock.clone(),
    );

    // Restriction avoidance
    let checker = Arc::new(load_restrictions_or_default(&config.restricted_path()));
    let waypoints = WaypointSet::validate(curated_waypoints(), &checker);
    let graph = load_graph_or_default(&config.graph_path(), &waypoints, clock.now());
    let client = OracleClient::new(build_oracle(&config)?, checker, &cache_config);
    let avoidance = WaypointRouter::new(Arc::new(client), &graph, AvoidanceConfig::default());

    let state = AppState::new(
        planner,
        avoidance,
        waypoints,
        Places::butuan(),
        config.zones_dir(),
    );
    let app = create_router(state);

    let addr = config.bind;
    info!(%addr, data_dir = %config.data_dir.display(), "tricycle route planner listening");
    println!("Tricycle Route Planner listening on http://{addr}");
    println!();
    println!("API Endpoints:");
    println!("  GET  /health                 - Health check");
    println!("  GET  /fares                  - Fare matrix and adjustments");
    println!("  PUT  /fares/fuel-price       - Update fuel price");
    println!("  POST /fares/adjustments      - Add a temporary fare multiplier");
    println!("  GET  /places?q=              - Search landmarks by name");
    println!("  GET  /zones                  - Loaded zones");
    println!("  POST /zones/reload           - Reload zone files");
    println!("  POST /routes/suggest         - Ranked trip suggestions");
    println!("  POST /routes/avoid           - Waypoints avoiding restricted areas");
    println!("  POST /routes/drive           - Driving route");
    println!("  GET  /restrictions/waypoints - Curated waypoint diagnostics");
    println!("  GET  /restrictions/graph     - Waypoint graph statistics");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
