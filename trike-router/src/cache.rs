//! Caching layers.
//!
//! Route suggestions are cached per (start, end, discount) for a limited
//! time and dropped wholesale when fares or zones change. Oracle answers are
//! cached by the exact ordered coordinate list and never expire, since the
//! same query always gets the same road route.
//!
//! Expiry reads the injected [`Clock`](crate::clock::Clock) rather than
//! wall time so tests can step past the TTL.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache as MokaCache;

use crate::clock::SharedClock;
use crate::geo::{CoordKey, Point};

/// Configuration for the caches.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached route suggestions.
    pub route_ttl: Duration,

    /// Maximum number of cached route suggestion sets.
    pub route_capacity: u64,

    /// Maximum number of cached oracle answers.
    pub oracle_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            route_ttl: Duration::from_secs(60 * 60),
            route_capacity: 1000,
            oracle_capacity: 10_000,
        }
    }
}

/// Cache key for a route suggestion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    start: CoordKey,
    end: CoordKey,
    discounted: bool,
}

impl RouteKey {
    pub fn new(start: Point, end: Point, discounted: bool) -> Self {
        Self {
            start: start.key(),
            end: end.key(),
            discounted,
        }
    }
}

/// Time-limited cache of route results.
pub struct RouteCache<V> {
    entries: MokaCache<RouteKey, (DateTime<Utc>, V)>,
    ttl: chrono::Duration,
    clock: SharedClock,
}

impl<V: Clone + Send + Sync + 'static> RouteCache<V> {
    pub fn new(config: &CacheConfig, clock: SharedClock) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(config.route_capacity)
            .build();
        let ttl = chrono::Duration::from_std(config.route_ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        Self {
            entries,
            ttl,
            clock,
        }
    }

    /// A cached value, unless it has outlived the TTL.
    pub async fn get(&self, key: &RouteKey) -> Option<V> {
        let (inserted_at, value) = self.entries.get(key).await?;
        if self.clock.now() - inserted_at >= self.ttl {
            self.entries.invalidate(key).await;
            return None;
        }
        Some(value)
    }

    /// Store a value. Concurrent inserts for the same key keep the last one.
    pub async fn insert(&self, key: RouteKey, value: V) {
        self.entries.insert(key, (self.clock.now(), value)).await;
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }
}

/// Content-addressed cache of oracle answers keyed by waypoint list.
pub struct OracleCache<V> {
    entries: MokaCache<Vec<CoordKey>, V>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Hit and miss counters for an [`OracleCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

impl<V: Clone + Send + Sync + 'static> OracleCache<V> {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: MokaCache::builder()
                .max_capacity(config.oracle_capacity)
                .build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The cache key for an ordered waypoint list.
    pub fn key(waypoints: &[Point]) -> Vec<CoordKey> {
        waypoints.iter().map(|p| p.key()).collect()
    }

    pub async fn get(&self, key: &[CoordKey]) -> Option<V> {
        let found = self.entries.get(key).await;
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub async fn insert(&self, key: Vec<CoordKey>, value: V) {
        self.entries.insert(key, value).await;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.entry_count(),
        }
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }
}
