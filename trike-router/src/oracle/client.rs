//! OSRM HTTP client.
//!
//! Queries an OSRM `route` service for a driving path through an ordered
//! list of points.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::trace;

use crate::geo::Point;

use super::RoutingOracle;
use super::error::OracleError;
use super::types::{OracleRoute, OsrmRouteResponse};

/// Default base URL (the public OSRM demo server).
const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Configuration for the OSRM client.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Base URL of the OSRM server
    pub base_url: String,
    /// Routing profile
    pub profile: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            profile: "driving".to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 10,
        }
    }
}

impl OsrmConfig {
    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// OSRM route service client.
///
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
#[derive(Debug, Clone)]
pub struct OsrmOracle {
    http: reqwest::Client,
    base_url: String,
    profile: String,
    semaphore: Arc<Semaphore>,
}

impl OsrmOracle {
    pub fn new(config: OsrmConfig) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Route URL for the given points, `lng,lat` with six decimals.
    pub fn route_url(&self, waypoints: &[Point]) -> String {
        let coords = waypoints
            .iter()
            .map(|p| format!("{:.6},{:.6}", p.lng, p.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson",
            self.base_url, self.profile, coords
        )
    }

    async fn fetch_route(&self, waypoints: &[Point]) -> Result<OracleRoute, OracleError> {
        if waypoints.len() < 2 {
            return Err(OracleError::TooFewWaypoints(waypoints.len()));
        }

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| OracleError::LimiterClosed)?;

        let url = self.route_url(waypoints);
        trace!(%url, "requesting route");
        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(OracleError::RateLimited);
        }

        let body = response.text().await?;

        // OSRM reports routing failures (NoRoute, NoSegment) as 400 with a
        // JSON body, so try to decode before rejecting the status.
        let decoded: Result<OsrmRouteResponse, _> = serde_json::from_str(&body);
        let parsed = match decoded {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(OracleError::Json {
                    message: e.to_string(),
                    body: Some(body.chars().take(500).collect()),
                });
            }
            Err(_) => {
                return Err(OracleError::Api {
                    status: status.as_u16(),
                    message: body.chars().take(500).collect(),
                });
            }
        };

        if parsed.code != "Ok" {
            let definitive = parsed.code == "NoRoute" || parsed.code == "NoSegment";
            let message = parsed.message.unwrap_or(parsed.code);
            return Err(if definitive {
                OracleError::NoRoute(message)
            } else {
                OracleError::Api {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        parsed
            .routes
            .into_iter()
            .next()
            .map(|r| r.into_route())
            .ok_or_else(|| OracleError::NoRoute("empty route list".to_string()))
    }
}

impl RoutingOracle for OsrmOracle {
    async fn route(&self, waypoints: &[Point]) -> Result<OracleRoute, OracleError> {
        self.fetch_route(waypoints).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = OsrmConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.profile, "driving");
        assert_eq!(config.max_concurrent, 4);
    }

    #[test]
    fn config_builder() {
        let config = OsrmConfig::default()
            .with_base_url("http://localhost:5000")
            .with_profile("bike")
            .with_max_concurrent(2)
            .with_timeout(3);

        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.profile, "bike");
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn route_url_uses_lng_lat_order() {
        let oracle =
            OsrmOracle::new(OsrmConfig::default().with_base_url("http://localhost:5000/")).unwrap();
        let url = oracle.route_url(&[Point::new(8.95, 125.53), Point::new(8.9612345678, 125.54)]);

        assert_eq!(
            url,
            "http://localhost:5000/route/v1/driving/125.530000,8.950000;125.540000,8.961235?overview=full&geometries=geojson"
        );
    }

    #[test]
    fn response_parses_geojson_geometry() {
        let body = r#"{
            "code": "Ok",
            "routes": [{
                "distance": 1234.5,
                "duration": 180.2,
                "geometry": {"type": "LineString", "coordinates": [[125.53, 8.95], [125.54, 8.96]]}
            }],
            "waypoints": []
        }"#;
        let parsed: OsrmRouteResponse = serde_json::from_str(body).unwrap();
        let route = parsed.routes.into_iter().next().unwrap().into_route();

        assert_eq!(route.distance_m, 1234.5);
        assert_eq!(route.polyline, vec![Point::new(8.95, 125.53), Point::new(8.96, 125.54)]);
    }

    #[test]
    fn no_route_response_parses() {
        let body = r#"{"code": "NoRoute", "message": "Impossible route between points"}"#;
        let parsed: OsrmRouteResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.code, "NoRoute");
        assert!(parsed.routes.is_empty());
    }

    #[tokio::test]
    async fn single_point_is_rejected_before_any_request() {
        let oracle = OsrmOracle::new(OsrmConfig::default()).unwrap();
        let err = oracle.route(&[Point::new(8.95, 125.53)]).await.unwrap_err();
        assert!(matches!(err, OracleError::TooFewWaypoints(1)));
    }
}
