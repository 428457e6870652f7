//! Trip planning service: route search behind a result cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{CacheConfig, RouteCache, RouteKey};
use crate::clock::SharedClock;
use crate::fare::{FareAdjustment, FareEngine, FareError, FareMatrix};
use crate::geo::Point;
use crate::zones::{Zone, ZoneId, ZoneRegistry};

use super::config::SearchConfig;
use super::search::RouteSearch;
use super::suggestion::RouteSuggestion;

/// Error from trip planning.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// Invalid coordinates in the request
    #[error("invalid {which} point: {point:?}")]
    InvalidPoint { which: &'static str, point: Point },

    /// Fare configuration was rejected
    #[error(transparent)]
    Fare(#[from] FareError),
}

/// Result of a route query.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    pub suggestions: Arc<Vec<RouteSuggestion>>,
    pub fuel_price: f64,
    pub discounted: bool,
    /// Whether the suggestions came from the cache.
    pub cached: bool,
}

/// Summary of one loaded zone.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneSummary {
    pub id: ZoneId,
    pub name: String,
    pub color: String,
    pub polylines: usize,
    pub vertices: usize,
}

/// Cached suggestions tagged with what they were computed against.
#[derive(Debug, Clone)]
struct CachedPlan {
    generation: u64,
    /// Expiry of the earliest fare adjustment priced in, if any.
    fresh_until: Option<DateTime<Utc>>,
    suggestions: Arc<Vec<RouteSuggestion>>,
}

impl CachedPlan {
    fn is_current(&self, generation: u64, now: DateTime<Utc>) -> bool {
        self.generation == generation && self.fresh_until.is_none_or(|t| now < t)
    }
}

/// Plans tricycle trips over the current zones and fares.
pub struct TripPlanner {
    zones: ZoneRegistry,
    fares: RwLock<FareEngine>,
    cache: RouteCache<CachedPlan>,
    /// Bumped whenever fares or zones change.
    generation: AtomicU64,
    config: SearchConfig,
    clock: SharedClock,
}

impl TripPlanner {
    pub fn new(
        zones: Vec<Zone>,
        fares: FareEngine,
        config: SearchConfig,
        cache_config: &CacheConfig,
        clock: SharedClock,
    ) -> Self {
        Self {
            zones: ZoneRegistry::new(zones, config.graph_settings()),
            fares: RwLock::new(fares),
            cache: RouteCache::new(cache_config, clock.clone()),
            generation: AtomicU64::new(0),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Ranked suggestions for a trip, served from cache when fresh.
    pub async fn suggest_routes(
        &self,
        start: Point,
        end: Point,
        discounted: bool,
    ) -> Result<RoutePlan, PlanError> {
        validate_point("start", start)?;
        validate_point("end", end)?;

        let key = RouteKey::new(start, end, discounted);
        let generation = self.generation.load(Ordering::Acquire);
        let fares = self.fares.read().await;

        if let Some(cached) = self.cache.get(&key).await {
            if cached.is_current(generation, self.clock.now()) {
                debug!(%start, %end, discounted, "route cache hit");
                return Ok(RoutePlan {
                    suggestions: cached.suggestions,
                    fuel_price: fares.fuel_price(),
                    discounted,
                    cached: true,
                });
            }
        }

        let snapshot = self.zones.snapshot().await;
        let suggestions =
            Arc::new(RouteSearch::new(&snapshot, &fares, &self.config).suggest(start, end, discounted));
        let cached = CachedPlan {
            generation,
            fresh_until: fares.next_expiry(),
            suggestions: suggestions.clone(),
        };
        self.cache.insert(key, cached).await;

        Ok(RoutePlan {
            suggestions,
            fuel_price: fares.fuel_price(),
            discounted,
            cached: false,
        })
    }

    pub async fn fare_matrix(&self) -> FareMatrix {
        self.fares.read().await.matrix()
    }

    /// Change the fuel price. Cached routes are discarded.
    pub async fn set_fuel_price(&self, fuel_price: f64) -> Result<FareMatrix, PlanError> {
        let mut fares = self.fares.write().await;
        fares.set_fuel_price(fuel_price)?;
        self.invalidate();
        Ok(fares.matrix())
    }

    /// Add a temporary fare multiplier. Cached routes are discarded.
    pub async fn add_fare_adjustment(
        &self,
        zone: Option<ZoneId>,
        multiplier: f64,
        lifetime: Option<Duration>,
    ) -> Result<FareAdjustment, PlanError> {
        let adjustment = self
            .fares
            .write()
            .await
            .add_adjustment(zone, multiplier, lifetime)?;
        self.invalidate();
        Ok(adjustment)
    }

    /// Replace every zone. Cached routes are discarded.
    pub async fn reload_zones(&self, zones: Vec<Zone>) -> u64 {
        let snapshot = self.zones.replace(zones).await;
        self.invalidate();
        snapshot.version()
    }

    pub async fn zone_summaries(&self) -> Vec<ZoneSummary> {
        let snapshot = self.zones.snapshot().await;
        snapshot
            .zones()
            .iter()
            .map(|z| ZoneSummary {
                id: z.id().clone(),
                name: z.display_name().to_string(),
                color: z.color().to_string(),
                polylines: z.polylines().len(),
                vertices: z.vertices().count(),
            })
            .collect()
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    fn invalidate(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.cache.invalidate_all();
        info!(generation, "route cache invalidated");
    }
}

fn validate_point(which: &'static str, point: Point) -> Result<(), PlanError> {
    let in_range = point.lat.abs() <= 90.0 && point.lng.abs() <= 180.0;
    if point.is_finite() && in_range {
        Ok(())
    } else {
        Err(PlanError::InvalidPoint { which, point })
    }
}
