//! Offline construction of the waypoint graph.
//!
//! Every ordered pair of usable waypoints is routed through the oracle once.
//! Pairs whose road route crosses too many restrictions are left out; the
//! rest become edges carrying distance, duration and violation count.

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::clock::SharedClock;
use crate::oracle::{OracleClient, RoutingOracle};
use crate::restriction::WaypointSet;

use super::config::AvoidanceConfig;
use super::graph::{GraphEdge, GraphNode, WaypointGraph};

/// Builds a [`WaypointGraph`] by exhaustive oracle testing.
pub struct GraphBuilder<'a, O> {
    client: &'a OracleClient<O>,
    config: &'a AvoidanceConfig,
    clock: SharedClock,
}

impl<'a, O: RoutingOracle> GraphBuilder<'a, O> {
    pub fn new(client: &'a OracleClient<O>, config: &'a AvoidanceConfig, clock: SharedClock) -> Self {
        Self {
            client,
            config,
            clock,
        }
    }

    /// Test all ordered pairs of `waypoints.usable()`.
    pub async fn build(&self, waypoints: &WaypointSet) -> WaypointGraph {
        let usable = waypoints.usable();
        let excluded = waypoints.excluded().count();
        if excluded > 0 {
            warn!(excluded, "skipping waypoints inside restricted areas");
        }

        let pairs: Vec<(usize, usize)> = (0..usable.len())
            .flat_map(|i| (0..usable.len()).filter(move |&j| j != i).map(move |j| (i, j)))
            .collect();
        info!(
            nodes = usable.len(),
            connections = pairs.len(),
            "building waypoint graph"
        );

        let mut edges = Vec::new();
        let mut tested = 0;
        let mut rejected = 0;

        for batch in pairs.chunks(self.config.concurrency.max(1)) {
            let futures: Vec<_> = batch
                .iter()
                .map(|&(i, j)| async move {
                    let result = self
                        .client
                        .test_path(&[usable[i].point, usable[j].point])
                        .await;
                    (i, j, result)
                })
                .collect();

            for (i, j, result) in join_all(futures).await {
                tested += 1;
                let (from, to) = (&usable[i], &usable[j]);
                if !result.valid {
                    debug!(from = %from.id, to = %to.id, error = ?result.error, "invalid route");
                    rejected += 1;
                    continue;
                }
                if result.violation_count >= self.config.max_edge_violations {
                    debug!(
                        from = %from.id,
                        to = %to.id,
                        violations = result.violation_count,
                        "too many violations"
                    );
                    rejected += 1;
                    continue;
                }
                debug!(
                    from = %from.id,
                    to = %to.id,
                    km = %format!("{:.1}", result.distance_m / 1000.0),
                    violations = result.violation_count,
                    "edge"
                );
                edges.push(GraphEdge {
                    from: from.id.clone(),
                    to: to.id.clone(),
                    distance: result.distance_m,
                    duration: result.duration_s,
                    violations: result.violation_count,
                    cost: self.config.edge_cost(result.distance_m, result.violation_count),
                });
            }

            debug!(tested, total = pairs.len(), valid = edges.len(), "progress");
        }

        let graph = WaypointGraph::new(
            self.clock.now(),
            usable.iter().map(GraphNode::from).collect(),
            edges,
        );

        for (id, outgoing) in graph.out_degrees() {
            if outgoing == 0 {
                warn!(node = id, "waypoint has no outgoing connections");
            } else {
                debug!(node = id, outgoing, "node connectivity");
            }
        }
        let stats = graph.stats();
        info!(
            nodes = stats.nodes,
            edges = stats.edges,
            zero_violation = stats.zero_violation_edges,
            rejected,
            "waypoint graph built"
        );

        graph
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::cache::CacheConfig;
    use crate::clock::ManualClock;
    use crate::geo::Point;
    use crate::oracle::ScriptedOracle;
    use crate::restriction::{RestrictedPolygon, RestrictionChecker, Side, Waypoint};

    fn checker() -> RestrictionChecker {
        RestrictionChecker::new(vec![RestrictedPolygon::new(
            "belt",
            vec![
                Point::new(8.945, 125.535),
                Point::new(8.945, 125.545),
                Point::new(8.955, 125.545),
                Point::new(8.955, 125.535),
                Point::new(8.945, 125.535),
            ],
        )])
    }

    fn waypoints(checker: &RestrictionChecker) -> WaypointSet {
        WaypointSet::validate(
            vec![
                Waypoint::new("N1", 8.958, 125.53, "North 1", Side::North),
                Waypoint::new("N2", 8.958, 125.55, "North 2", Side::North),
                Waypoint::new("S1", 8.941, 125.53, "South 1", Side::South),
                Waypoint::new("X1", 8.95, 125.54, "Inside", Side::South),
            ],
            checker,
        )
    }

    #[tokio::test]
    async fn tests_every_ordered_pair_once() {
        let checker = checker();
        let set = waypoints(&checker);
        let oracle = ScriptedOracle::new();
        let client = OracleClient::new(oracle.clone(), Arc::new(checker), &CacheConfig::default());
        let config = AvoidanceConfig::default();
        let built_at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(built_at));

        let graph = GraphBuilder::new(&client, &config, clock).build(&set).await;

        // X1 sits inside the belt and is excluded.
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(oracle.calls(), 6);
        assert_eq!(graph.edges.len(), 6);
        assert_eq!(graph.metadata.built_at, built_at);

        let crossing = graph
            .edges
            .iter()
            .find(|e| e.from == "N2" && e.to == "S1")
            .unwrap();
        assert_eq!(crossing.violations, 1);
        assert_eq!(crossing.cost, crossing.distance + 1_000_000.0);

        let clear = graph
            .edges
            .iter()
            .find(|e| e.from == "N1" && e.to == "N2")
            .unwrap();
        assert_eq!(clear.violations, 0);
    }

    #[tokio::test]
    async fn drops_failed_pairs() {
        let checker = checker();
        let set = waypoints(&checker);
        let n1 = Point::new(8.958, 125.53);
        let n2 = Point::new(8.958, 125.55);
        let oracle = ScriptedOracle::new().with_no_route(&[n1, n2]);
        let client = OracleClient::new(oracle, Arc::new(checker), &CacheConfig::default());
        let config = AvoidanceConfig::default();
        let clock = Arc::new(ManualClock::new(Utc::now()));

        let graph = GraphBuilder::new(&client, &config, clock).build(&set).await;

        assert_eq!(graph.edges.len(), 5);
        assert!(!graph.edges.iter().any(|e| e.from == "N1" && e.to == "N2"));
    }
}
