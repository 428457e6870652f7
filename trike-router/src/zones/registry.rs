//! Versioned zone snapshots with lazily built graphs.

use std::sync::{Arc, OnceLock};

use tokio::sync::RwLock;
use tracing::info;

use super::connectivity::ConnectivityGraph;
use super::error::ZoneError;
use super::transfer::{TransferSettings, ZoneTransferGraph};
use super::zone::{Zone, ZoneId};

/// Parameters for the derived zone graphs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphSettings {
    /// Largest gap between two segments that still counts as joined (km).
    pub connection_threshold_km: f64,
    pub transfer: TransferSettings,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            connection_threshold_km: 0.1,
            transfer: TransferSettings::default(),
        }
    }
}

/// One immutable generation of zone data.
///
/// Connectivity and transfer graphs are built on first use and then shared
/// by every reader of the snapshot.
#[derive(Debug)]
pub struct ZoneSnapshot {
    version: u64,
    zones: Vec<Zone>,
    settings: GraphSettings,
    connectivity: Vec<OnceLock<ConnectivityGraph>>,
    transfers: OnceLock<ZoneTransferGraph>,
}

impl ZoneSnapshot {
    /// Build a snapshot. Zones are ordered by id.
    pub fn new(version: u64, mut zones: Vec<Zone>, settings: GraphSettings) -> Self {
        zones.sort_by(|a, b| a.id().cmp(b.id()));
        zones.dedup_by(|a, b| a.id() == b.id());
        let connectivity = zones.iter().map(|_| OnceLock::new()).collect();
        Self {
            version,
            zones,
            settings,
            connectivity,
            transfers: OnceLock::new(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    fn position(&self, id: &ZoneId) -> Result<usize, ZoneError> {
        self.zones
            .binary_search_by(|z| z.id().cmp(id))
            .map_err(|_| ZoneError::UnknownZone(id.clone()))
    }

    pub fn zone(&self, id: &ZoneId) -> Result<&Zone, ZoneError> {
        self.position(id).map(|i| &self.zones[i])
    }

    /// Connectivity graph for a zone, built on first request.
    pub fn connectivity(&self, id: &ZoneId) -> Result<&ConnectivityGraph, ZoneError> {
        let i = self.position(id)?;
        Ok(self.connectivity[i].get_or_init(|| {
            ConnectivityGraph::build(&self.zones[i], self.settings.connection_threshold_km)
        }))
    }

    /// Cross-zone transfer graph, built on first request.
    pub fn transfers(&self) -> &ZoneTransferGraph {
        self.transfers
            .get_or_init(|| ZoneTransferGraph::build(&self.zones, &self.settings.transfer))
    }
}

/// Shared handle to the current zone snapshot.
///
/// Readers take an `Arc` of the snapshot and keep using it for the whole
/// request; a reload swaps in a new snapshot without disturbing them.
#[derive(Clone)]
pub struct ZoneRegistry {
    current: Arc<RwLock<Arc<ZoneSnapshot>>>,
    settings: GraphSettings,
}

impl ZoneRegistry {
    pub fn new(zones: Vec<Zone>, settings: GraphSettings) -> Self {
        let snapshot = ZoneSnapshot::new(1, zones, settings);
        Self {
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
            settings,
        }
    }

    /// The snapshot in effect now.
    pub async fn snapshot(&self) -> Arc<ZoneSnapshot> {
        self.current.read().await.clone()
    }

    /// Replace all zone data. Returns the new snapshot.
    pub async fn replace(&self, zones: Vec<Zone>) -> Arc<ZoneSnapshot> {
        let mut guard = self.current.write().await;
        let snapshot = Arc::new(ZoneSnapshot::new(guard.version + 1, zones, self.settings));
        info!(
            version = snapshot.version,
            zones = snapshot.zones.len(),
            "zone data replaced"
        );
        *guard = snapshot.clone();
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Point;

    fn line(lng0: f64) -> Vec<Point> {
        vec![Point::new(8.95, lng0), Point::new(8.95, lng0 + 0.01)]
    }

    #[test]
    fn snapshot_orders_zones_and_looks_them_up() {
        let snapshot = ZoneSnapshot::new(
            1,
            vec![
                Zone::from_type("white", vec![line(125.50)]),
                Zone::from_type("green", vec![line(125.52)]),
            ],
            GraphSettings::default(),
        );

        assert_eq!(snapshot.zones()[0].id().as_str(), "green_zone_route");
        assert!(snapshot.zone(&ZoneId::for_type("white")).is_ok());
        assert!(matches!(
            snapshot.connectivity(&ZoneId::for_type("blue")),
            Err(ZoneError::UnknownZone(_))
        ));
    }

    #[test]
    fn graphs_are_built_once() {
        let snapshot = ZoneSnapshot::new(
            1,
            vec![Zone::fallback_orange()],
            GraphSettings::default(),
        );
        let id = ZoneId::for_type("orange");

        let first = snapshot.connectivity(&id).unwrap() as *const ConnectivityGraph;
        let second = snapshot.connectivity(&id).unwrap() as *const ConnectivityGraph;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn replace_swaps_snapshot_without_touching_readers() {
        let registry = ZoneRegistry::new(vec![Zone::fallback_orange()], GraphSettings::default());
        let before = registry.snapshot().await;

        let after = registry
            .replace(vec![Zone::from_type("red", vec![line(125.53)])])
            .await;

        assert_eq!(before.version(), 1);
        assert_eq!(after.version(), 2);
        assert!(before.zone(&ZoneId::for_type("orange")).is_ok());
        assert!(registry.snapshot().await.zone(&ZoneId::for_type("orange")).is_err());
    }
}
