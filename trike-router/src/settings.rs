//! Runtime settings and data files.
//!
//! Server settings come from environment variables. Zone, fare, restriction
//! and waypoint-graph data live as files under the data directory; each has
//! a built-in fallback so the server starts with nothing on disk.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::avoidance::WaypointGraph;
use crate::fare::{DEFAULT_FUEL_PRICE, FareTable};
use crate::geojson::{self, GeoJsonError};
use crate::oracle::{Oracle, OracleError, OsrmConfig, OsrmOracle, ScriptedOracle};
use crate::restriction::{RestrictionChecker, WaypointSet};

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_DATA_DIR: &str = "data";

/// Errors reading settings or data files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable has an unusable value
    #[error("invalid {name}={value:?}: {message}")]
    InvalidVar {
        name: &'static str,
        value: String,
        message: String,
    },

    /// A data file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A data file is not valid JSON for its kind
    #[error("invalid {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    GeoJson(#[from] GeoJsonError),
}

/// Server settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Listen address (`TRIKE_BIND`)
    pub bind: SocketAddr,
    /// Data directory (`TRIKE_DATA_DIR`)
    pub data_dir: PathBuf,
    /// OSRM server, public demo server when unset (`OSRM_BASE_URL`)
    pub osrm_base_url: Option<String>,
    /// Overrides the fuel price in `fares.json` (`TRIKE_FUEL_PRICE`)
    pub fuel_price: Option<f64>,
    /// Answer routing requests with straight lines instead of OSRM
    /// (`TRIKE_OFFLINE`)
    pub offline: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            osrm_base_url: None,
            fuel_price: None,
            offline: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from a variable lookup. Unset variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_str = lookup("TRIKE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_str.parse::<SocketAddr>().map_err(|e| ConfigError::InvalidVar {
            name: "TRIKE_BIND",
            value: bind_str.clone(),
            message: e.to_string(),
        })?;

        let fuel_price = match lookup("TRIKE_FUEL_PRICE") {
            Some(value) => Some(value.parse::<f64>().map_err(|e| ConfigError::InvalidVar {
                name: "TRIKE_FUEL_PRICE",
                value: value.clone(),
                message: e.to_string(),
            })?),
            None => None,
        };

        let offline = match lookup("TRIKE_OFFLINE").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(ConfigError::InvalidVar {
                    name: "TRIKE_OFFLINE",
                    value: other.to_string(),
                    message: "expected 1/0 or true/false".to_string(),
                });
            }
        };

        Ok(Self {
            bind,
            data_dir: lookup("TRIKE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            osrm_base_url: lookup("OSRM_BASE_URL").filter(|s| !s.is_empty()),
            fuel_price,
            offline,
        })
    }

    pub fn zones_dir(&self) -> PathBuf {
        self.data_dir.join("zones")
    }

    pub fn fares_path(&self) -> PathBuf {
        self.data_dir.join("fares.json")
    }

    pub fn restricted_path(&self) -> PathBuf {
        self.data_dir.join("restricted.geojson")
    }

    pub fn graph_path(&self) -> PathBuf {
        self.data_dir.join("waypoint-graph.json")
    }
}

/// The routing oracle selected by `config`.
pub fn build_oracle(config: &ServerConfig) -> Result<Oracle, OracleError> {
    if config.offline {
        warn!("offline mode: routes are straight lines");
        return Ok(Oracle::Scripted(ScriptedOracle::new()));
    }
    let mut osrm = OsrmConfig::default();
    if let Some(url) = &config.osrm_base_url {
        osrm = osrm.with_base_url(url.clone());
    }
    info!(base_url = %osrm.base_url, profile = %osrm.profile, "using OSRM");
    Ok(Oracle::Osrm(OsrmOracle::new(osrm)?))
}

/// Contents of `fares.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FareFile {
    pub current_fuel_price: f64,
    pub brackets: FareTable,
}

impl Default for FareFile {
    fn default() -> Self {
        Self {
            current_fuel_price: DEFAULT_FUEL_PRICE,
            brackets: FareTable::butuan(),
        }
    }
}

pub fn load_fares(path: &Path) -> Result<FareFile, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| ConfigError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// `fares.json`, or the official matrix when it is missing or invalid.
pub fn load_fares_or_default(path: &Path) -> FareFile {
    match load_fares(path) {
        Ok(fares) => {
            info!(
                brackets = fares.brackets.brackets().len(),
                fuel_price = fares.current_fuel_price,
                "loaded fare table"
            );
            fares
        }
        Err(e) => {
            warn!(error = %e, "using built-in fare table");
            FareFile::default()
        }
    }
}

pub fn load_restrictions(path: &Path) -> Result<RestrictionChecker, ConfigError> {
    let collection = geojson::read_feature_collection(path)?;
    Ok(RestrictionChecker::from_geojson(&collection)?)
}

/// Restricted polygons, or none when the file is missing or invalid.
pub fn load_restrictions_or_default(path: &Path) -> RestrictionChecker {
    match load_restrictions(path) {
        Ok(checker) => {
            info!(polygons = checker.polygons().len(), "loaded restricted areas");
            checker
        }
        Err(e) => {
            warn!(error = %e, "no restricted areas loaded");
            RestrictionChecker::default()
        }
    }
}

/// The persisted waypoint graph, or the usable waypoints without edges.
pub fn load_graph_or_default(
    path: &Path,
    waypoints: &WaypointSet,
    now: DateTime<Utc>,
) -> WaypointGraph {
    match WaypointGraph::load(path) {
        Ok(graph) => graph,
        Err(e) => {
            warn!(error = %e, "waypoint graph unavailable, routing through single waypoints only");
            WaypointGraph::without_edges(now, waypoints.usable())
        }
    }
}
