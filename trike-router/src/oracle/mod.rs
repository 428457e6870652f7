//! Road-routing oracle.
//!
//! The oracle turns an ordered list of points into a drivable polyline.
//! [`OsrmOracle`] talks to an OSRM server; [`ScriptedOracle`] answers with
//! straight lines for offline use and tests. [`OracleClient`] wraps either
//! one with retries, a content-addressed cache and restriction checking.

mod cached;
mod client;
mod error;
mod scripted;
mod types;

use std::future::Future;

pub use cached::{DriveRoute, OracleClient, OracleTestResult, RetryPolicy};
pub use client::{OsrmConfig, OsrmOracle};
pub use error::OracleError;
pub use scripted::ScriptedOracle;
pub use types::{OracleRoute, OsrmGeometry, OsrmRoute, OsrmRouteResponse};

use crate::geo::Point;

/// Anything that can route through an ordered list of points.
pub trait RoutingOracle: Send + Sync {
    fn route(
        &self,
        waypoints: &[Point],
    ) -> impl Future<Output = Result<OracleRoute, OracleError>> + Send;
}

/// The oracle the server runs with, chosen at startup.
#[derive(Debug, Clone)]
pub enum Oracle {
    Osrm(OsrmOracle),
    Scripted(ScriptedOracle),
}

impl RoutingOracle for Oracle {
    async fn route(&self, waypoints: &[Point]) -> Result<OracleRoute, OracleError> {
        match self {
            Oracle::Osrm(osrm) => osrm.route(waypoints).await,
            Oracle::Scripted(scripted) => scripted.route(waypoints).await,
        }
    }
}
