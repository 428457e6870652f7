//! Retrying, caching wrapper around a [`RoutingOracle`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheConfig, CacheStats, OracleCache};
use crate::geo::Point;
use crate::restriction::RestrictionChecker;

use super::RoutingOracle;
use super::error::OracleError;
use super::types::OracleRoute;

/// Bounded retry with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Delay after attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Outcome of routing a waypoint chain and checking it for violations.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleTestResult {
    /// Whether the oracle produced a route at all.
    pub valid: bool,
    pub distance_m: f64,
    pub duration_s: f64,
    pub violation_count: usize,
    pub polyline: Arc<Vec<Point>>,
    pub error: Option<String>,
}

impl OracleTestResult {
    fn from_route(route: OracleRoute, violation_count: usize) -> Self {
        Self {
            valid: true,
            distance_m: route.distance_m,
            duration_s: route.duration_s,
            violation_count,
            polyline: Arc::new(route.polyline),
            error: None,
        }
    }

    fn failed(error: &OracleError) -> Self {
        Self {
            valid: false,
            distance_m: 0.0,
            duration_s: 0.0,
            violation_count: 0,
            polyline: Arc::new(Vec::new()),
            error: Some(error.to_string()),
        }
    }

    /// A valid route that stays out of every restricted polygon.
    pub fn is_clear(&self) -> bool {
        self.valid && self.violation_count == 0
    }
}

/// A driving route for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriveRoute {
    pub polyline: Vec<Point>,
    /// Kilometres, two decimals. `None` on fallback.
    pub distance_km: Option<f64>,
    /// Whole minutes. `None` on fallback.
    pub duration_min: Option<f64>,
    pub violations: usize,
    pub success: bool,
    /// The polyline is the straight chain through the inputs.
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Oracle access for the rest of the crate.
pub struct OracleClient<O> {
    oracle: O,
    checker: Arc<RestrictionChecker>,
    cache: OracleCache<OracleTestResult>,
    retry: RetryPolicy,
    requests: AtomicU64,
}

impl<O: RoutingOracle> OracleClient<O> {
    pub fn new(oracle: O, checker: Arc<RestrictionChecker>, cache: &CacheConfig) -> Self {
        Self {
            oracle,
            checker,
            cache: OracleCache::new(cache),
            retry: RetryPolicy::default(),
            requests: AtomicU64::new(0),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn checker(&self) -> &RestrictionChecker {
        &self.checker
    }

    /// Requests sent to the oracle, counting each retry.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn route_with_retry(&self, waypoints: &[Point]) -> Result<OracleRoute, OracleError> {
        let mut attempt = 1;
        loop {
            self.requests.fetch_add(1, Ordering::Relaxed);
            match self.oracle.route(waypoints).await {
                Ok(route) => return Ok(route),
                Err(e) if e.is_retryable() && attempt < self.retry.attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(attempt, error = %e, ?delay, "oracle request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Route through `waypoints` and count restriction violations on the
    /// returned polyline.
    ///
    /// Answers are cached by the exact ordered coordinates. Transient
    /// failures are not cached so a later request can try again.
    pub async fn test_path(&self, waypoints: &[Point]) -> OracleTestResult {
        let key = OracleCache::<OracleTestResult>::key(waypoints);
        if let Some(hit) = self.cache.get(&key).await {
            return hit;
        }

        match self.route_with_retry(waypoints).await {
            Ok(route) => {
                let violations = self.checker.violation_count(&route.polyline);
                let result = OracleTestResult::from_route(route, violations);
                self.cache.insert(key, result.clone()).await;
                result
            }
            Err(e) => {
                debug!(error = %e, points = waypoints.len(), "oracle test failed");
                let result = OracleTestResult::failed(&e);
                if !e.is_retryable() {
                    self.cache.insert(key, result.clone()).await;
                }
                result
            }
        }
    }

    /// Driving route from `start` through `via` to `end`.
    ///
    /// When the oracle fails after retries the straight chain through the
    /// points is returned with `success: false`.
    pub async fn drive(&self, start: Point, via: &[Point], end: Point) -> DriveRoute {
        let mut chain = Vec::with_capacity(via.len() + 2);
        chain.push(start);
        chain.extend_from_slice(via);
        chain.push(end);

        let result = self.test_path(&chain).await;
        if result.valid {
            DriveRoute {
                polyline: result.polyline.as_ref().clone(),
                distance_km: Some((result.distance_m / 10.0).round() / 100.0),
                duration_min: Some((result.duration_s / 60.0).round()),
                violations: result.violation_count,
                success: true,
                fallback: false,
                error: None,
            }
        } else {
            warn!(%start, %end, error = ?result.error, "driving route unavailable, using straight line");
            DriveRoute {
                violations: self.checker.violation_count(&chain),
                polyline: chain,
                distance_km: None,
                duration_min: None,
                success: false,
                fallback: true,
                error: result.error,
            }
        }
    }
}
