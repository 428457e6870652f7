//! In-memory oracle for offline runs and tests.
//!
//! By default every request is answered with the straight line through the
//! given points. Specific requests can be scripted with a fixed polyline or
//! a failure, and a number of upcoming calls can be made to fail
//! transiently.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::geo::{self, CoordKey, Point};

use super::RoutingOracle;
use super::error::OracleError;
use super::types::OracleRoute;

/// Average tricycle speed used to invent durations, in meters per second.
const STRAIGHT_LINE_SPEED_MPS: f64 = 20.0 / 3.6;

#[derive(Debug, Clone)]
enum Script {
    Route(Vec<Point>),
    NoRoute,
}

/// Oracle that never leaves the process.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    scripts: Arc<HashMap<Vec<CoordKey>, Script>>,
    failures_left: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the exact request `waypoints` with `polyline`.
    pub fn with_route(mut self, waypoints: &[Point], polyline: Vec<Point>) -> Self {
        Arc::make_mut(&mut self.scripts).insert(key(waypoints), Script::Route(polyline));
        self
    }

    /// Answer the exact request `waypoints` with "no route".
    pub fn with_no_route(mut self, waypoints: &[Point]) -> Self {
        Arc::make_mut(&mut self.scripts).insert(key(waypoints), Script::NoRoute);
        self
    }

    /// Fail the next `n` calls with a retryable error.
    pub fn failing_next(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Number of route requests received, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn key(waypoints: &[Point]) -> Vec<CoordKey> {
    waypoints.iter().map(|p| p.key()).collect()
}

fn route_along(polyline: Vec<Point>) -> OracleRoute {
    let distance_m = polyline
        .windows(2)
        .map(|w| geo::distance(w[0], w[1]) * 1000.0)
        .sum::<f64>();
    OracleRoute {
        polyline,
        distance_m,
        duration_s: distance_m / STRAIGHT_LINE_SPEED_MPS,
    }
}

impl RoutingOracle for ScriptedOracle {
    async fn route(&self, waypoints: &[Point]) -> Result<OracleRoute, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if waypoints.len() < 2 {
            return Err(OracleError::TooFewWaypoints(waypoints.len()));
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(OracleError::Api {
                status: 503,
                message: "scripted failure".to_string(),
            });
        }

        match self.scripts.get(&key(waypoints)) {
            Some(Script::Route(polyline)) => Ok(route_along(polyline.clone())),
            Some(Script::NoRoute) => Err(OracleError::NoRoute("scripted".to_string())),
            None => Ok(route_along(waypoints.to_vec())),
        }
    }
}
