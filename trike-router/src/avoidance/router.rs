//! Online restriction-avoidance routing.
//!
//! A request runs through a fixed sequence of strategies:
//!
//! 1. Move endpoints that sit inside a restriction.
//! 2. Test the direct route. If it is clear no waypoints are needed.
//! 3. Anchor each endpoint into the waypoint network, first with
//!    violation-free connections only, then with the least-violating ones.
//! 4. Search the augmented network and verify each candidate path live,
//!    banning the offending hop and searching again when verification
//!    fails.
//! 5. Try single-waypoint detours through the nearest anchors.
//!
//! Every verified chain is remembered and the least-violating one is
//! returned when nothing clear turns up. The number of path tests per
//! request is capped.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::geo::{self, Point};
use crate::oracle::{OracleClient, OracleTestResult, RoutingOracle};
use crate::restriction::{SafePoint, Waypoint};

use super::config::{AnchorSearch, AvoidanceConfig};
use super::dijkstra::{Anchor, AugmentedGraph};
use super::graph::{GraphStats, WaypointGraph, WaypointNetwork};

/// How a [`WaypointPlan`] was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// The direct route was already clear.
    Clear,
    /// Waypoints were found that give a clear route.
    Avoided,
    /// No clear route was found; this is the least-violating one tested.
    BestEffort,
    /// The oracle produced no usable route at all.
    NoPath,
}

/// Result of a restriction-avoidance request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaypointPlan {
    /// Intermediate waypoints, never including start or end.
    pub waypoints: Vec<Waypoint>,
    pub start: SafePoint,
    pub end: SafePoint,
    pub status: PlanStatus,
    /// Verified violations of the chosen chain.
    pub violations: Option<usize>,
    pub distance_km: Option<f64>,
    /// Path tests issued for this request, cache hits included.
    pub oracle_calls: usize,
}

/// A chain that was routed and checked.
#[derive(Debug, Clone)]
struct Candidate {
    waypoints: Vec<usize>,
    violations: usize,
    distance_m: f64,
}

/// Live check of a start → waypoints → end chain, one segment at a time.
struct ChainCheck {
    violations: usize,
    distance_m: f64,
    /// First segment that failed or crossed a restriction.
    first_bad: Option<usize>,
    complete: bool,
}

/// Per-request state.
struct Attempt<'r, O> {
    router: &'r WaypointRouter<O>,
    start: Point,
    end: Point,
    calls: usize,
    best: Option<Candidate>,
}

/// Chooses intermediate waypoints that keep oracle routes out of
/// restricted areas.
pub struct WaypointRouter<O> {
    client: Arc<OracleClient<O>>,
    network: WaypointNetwork,
    stats: GraphStats,
    config: AvoidanceConfig,
}

impl<O: RoutingOracle> WaypointRouter<O> {
    pub fn new(client: Arc<OracleClient<O>>, graph: &WaypointGraph, config: AvoidanceConfig) -> Self {
        let network = WaypointNetwork::from_graph(graph, &config);
        info!(
            waypoints = network.len(),
            edges = network.edge_count(),
            built_at = %graph.metadata.built_at,
            "waypoint router ready"
        );
        Self {
            client,
            network,
            stats: graph.stats(),
            config,
        }
    }

    pub fn client(&self) -> &OracleClient<O> {
        &self.client
    }

    pub fn config(&self) -> &AvoidanceConfig {
        &self.config
    }

    pub fn graph_stats(&self) -> &GraphStats {
        &self.stats
    }

    /// Waypoints that keep the road route from `start` to `end` clear of
    /// restrictions, or the least-violating choice found.
    pub async fn find_optimal_waypoints(&self, start: Point, end: Point) -> WaypointPlan {
        let adjusted = self.client.checker().adjust_endpoints(
            start,
            end,
            &self.config.safe_point,
            self.network.nodes(),
        );
        if adjusted.adjusted() {
            info!(
                start_moved_m = (adjusted.start.distance_moved_km * 1000.0).round(),
                end_moved_m = (adjusted.end.distance_moved_km * 1000.0).round(),
                "endpoints moved out of restricted areas"
            );
        }

        let mut attempt = Attempt {
            router: self,
            start: adjusted.start.point,
            end: adjusted.end.point,
            calls: 0,
            best: None,
        };
        let (status, chosen) = attempt.run().await;

        let waypoints: Vec<Waypoint> = chosen
            .as_ref()
            .map(|c| {
                c.waypoints
                    .iter()
                    .map(|&i| self.network.node(i).clone())
                    .collect()
            })
            .unwrap_or_default();

        WaypointPlan {
            waypoints,
            start: adjusted.start,
            end: adjusted.end,
            status,
            violations: chosen.as_ref().map(|c| c.violations),
            distance_km: chosen.as_ref().map(|c| c.distance_m / 1000.0),
            oracle_calls: attempt.calls,
        }
    }
}

impl<'r, O: RoutingOracle> Attempt<'r, O> {
    async fn run(&mut self) -> (PlanStatus, Option<Candidate>) {
        debug!(start = %self.start, end = %self.end, "phase: direct");
        if let Some(direct) = self.test(&[self.start, self.end]).await {
            if direct.is_clear() {
                info!("direct route is clear");
                let chosen = Candidate {
                    waypoints: Vec::new(),
                    violations: 0,
                    distance_m: direct.distance_m,
                };
                return (PlanStatus::Clear, Some(chosen));
            }
            if direct.valid {
                debug!(violations = direct.violation_count, "direct route crosses restrictions");
                self.consider(Vec::new(), direct.violation_count, direct.distance_m);
            }
        }

        debug!("phase: anchors");
        let start_anchors = self.anchors(self.start, Towards::Waypoint).await;
        let end_anchors = self.anchors(self.end, Towards::Endpoint).await;
        if start_anchors.is_empty() || end_anchors.is_empty() {
            warn!(
                start = start_anchors.len(),
                end = end_anchors.len(),
                "could not connect endpoints to the waypoint graph"
            );
            return self.finish();
        }

        debug!("phase: graph search");
        if self.graph_search(&start_anchors, &end_anchors).await {
            return self.finish();
        }

        debug!("phase: single waypoint");
        self.single_waypoint(&start_anchors, &end_anchors).await;
        self.finish()
    }

    fn finish(&mut self) -> (PlanStatus, Option<Candidate>) {
        match self.best.take() {
            Some(best) if best.violations == 0 => (PlanStatus::Avoided, Some(best)),
            Some(best) => {
                warn!(
                    violations = best.violations,
                    calls = self.calls,
                    "no clear route, using least-violating"
                );
                (PlanStatus::BestEffort, Some(best))
            }
            None => (PlanStatus::NoPath, None),
        }
    }

    fn remaining(&self) -> usize {
        self.router.config.max_oracle_calls.saturating_sub(self.calls)
    }

    async fn test(&mut self, path: &[Point]) -> Option<OracleTestResult> {
        if self.remaining() == 0 {
            return None;
        }
        self.calls += 1;
        Some(self.router.client.test_path(path).await)
    }

    /// Test several paths concurrently, up to the remaining budget.
    async fn test_many(&mut self, paths: &[Vec<Point>]) -> Vec<OracleTestResult> {
        let router = self.router;
        let allowed = paths.len().min(self.remaining());
        let mut results = Vec::with_capacity(allowed);
        for batch in paths[..allowed].chunks(router.config.concurrency.max(1)) {
            let futures: Vec<_> = batch.iter().map(|p| router.client.test_path(p)).collect();
            results.extend(join_all(futures).await);
        }
        self.calls += allowed;
        results
    }

    /// Record a verified chain if it beats the best so far.
    fn consider(&mut self, waypoints: Vec<usize>, violations: usize, distance_m: f64) {
        let better = match &self.best {
            None => true,
            Some(b) => {
                violations < b.violations
                    || (violations == b.violations && distance_m < b.distance_m)
            }
        };
        if better {
            self.best = Some(Candidate {
                waypoints,
                violations,
                distance_m,
            });
        }
    }

    /// Connections between `endpoint` and its nearest waypoints.
    async fn anchors(&mut self, endpoint: Point, direction: Towards) -> Vec<Anchor> {
        let router = self.router;
        let network = &router.network;
        let mut ranked: Vec<usize> = (0..network.len()).collect();
        ranked.sort_by(|&a, &b| {
            geo::distance(endpoint, network.node(a).point)
                .total_cmp(&geo::distance(endpoint, network.node(b).point))
                .then(a.cmp(&b))
        });

        let strict = router.config.strict;
        let tested = self.probe(endpoint, direction, &ranked, strict).await;
        let mut accepted: Vec<Anchor> = tested
            .iter()
            .filter(|a| a.violations == 0)
            .take(strict.target)
            .copied()
            .collect();
        if !accepted.is_empty() {
            debug!(?direction, anchors = accepted.len(), "strict anchors");
            return accepted;
        }

        let relaxed = router.config.relaxed;
        accepted = self.probe(endpoint, direction, &ranked, relaxed).await;
        accepted.sort_by(|a, b| {
            a.violations
                .cmp(&b.violations)
                .then(a.distance_m.total_cmp(&b.distance_m))
        });
        accepted.truncate(relaxed.target);
        debug!(
            ?direction,
            anchors = accepted.len(),
            min_violations = ?accepted.first().map(|a| a.violations),
            "relaxed anchors"
        );
        accepted
    }

    /// Route from `endpoint` to its nearest waypoints, stopping early once
    /// `search.target` clear connections are found.
    async fn probe(
        &mut self,
        endpoint: Point,
        direction: Towards,
        ranked: &[usize],
        search: AnchorSearch,
    ) -> Vec<Anchor> {
        let router = self.router;
        let network = &router.network;
        let candidates = &ranked[..ranked.len().min(search.attempts)];
        let batch_size = router.config.concurrency.max(1);
        let mut anchors = Vec::new();
        let mut clear = 0;

        for batch in candidates.chunks(batch_size) {
            let paths: Vec<Vec<Point>> = batch
                .iter()
                .map(|&i| direction.path(endpoint, network.node(i).point))
                .collect();
            let results = self.test_many(&paths).await;
            if results.is_empty() {
                break;
            }

            for (&node, result) in batch.iter().zip(results) {
                if !result.valid {
                    debug!(waypoint = %network.node(node).id, "anchor rejected: no route");
                    continue;
                }
                if result.violation_count == 0 {
                    clear += 1;
                } else {
                    debug!(
                        waypoint = %network.node(node).id,
                        violations = result.violation_count,
                        "anchor crosses restrictions"
                    );
                }
                anchors.push(Anchor {
                    node,
                    distance_m: result.distance_m,
                    violations: result.violation_count,
                });
            }
            if clear >= search.target {
                break;
            }
        }
        anchors
    }

    /// Search the augmented graph and verify candidates live. True when a
    /// clear chain was found.
    async fn graph_search(&mut self, start: &[Anchor], end: &[Anchor]) -> bool {
        let router = self.router;
        let graph = AugmentedGraph::new(&router.network, start, end, &router.config);
        let mut banned = HashSet::new();

        for alternative in 0..router.config.max_alternatives {
            let Some(path) = graph.shortest_path(&banned) else {
                debug!(alternative, "graph exhausted");
                break;
            };
            let waypoints = path.waypoints().to_vec();
            let ids: Vec<&str> = waypoints
                .iter()
                .map(|&i| router.network.node(i).id.as_str())
                .collect();
            debug!(alternative, path = ?ids, cost = path.cost, "verifying path");

            let Some(check) = self.verify(&waypoints).await else {
                break;
            };
            if check.complete {
                self.consider(waypoints.clone(), check.violations, check.distance_m);
                if check.violations == 0 {
                    info!(path = ?ids, "found clear route through waypoints");
                    return true;
                }
            }

            let Some(bad) = check.first_bad else {
                break;
            };
            let hop: Vec<(usize, usize)> = path.hops().collect();
            let Some(&edge) = hop.get(bad) else {
                break;
            };
            debug!(alternative, segment = bad, "path failed verification, banning hop");
            banned.insert(edge);
        }
        false
    }

    /// Try start → anchor → end for the closest few anchors on each side.
    async fn single_waypoint(&mut self, start: &[Anchor], end: &[Anchor]) {
        let mut seen = HashSet::new();
        let nodes: Vec<usize> = start
            .iter()
            .take(3)
            .chain(end.iter().take(3))
            .map(|a| a.node)
            .filter(|n| seen.insert(*n))
            .collect();

        for node in nodes {
            let Some(check) = self.verify(&[node]).await else {
                return;
            };
            if check.complete {
                self.consider(vec![node], check.violations, check.distance_m);
                if check.violations == 0 {
                    info!(waypoint = %self.router.network.node(node).id, "single waypoint route is clear");
                    return;
                }
            }
        }
    }

    /// Route a chain one segment at a time. `None` when the budget ran out.
    async fn verify(&mut self, waypoints: &[usize]) -> Option<ChainCheck> {
        let network = &self.router.network;
        let mut chain = Vec::with_capacity(waypoints.len() + 2);
        chain.push(self.start);
        chain.extend(waypoints.iter().map(|&i| network.node(i).point));
        chain.push(self.end);

        let segments: Vec<Vec<Point>> = chain.windows(2).map(|w| w.to_vec()).collect();
        if segments.len() > self.remaining() {
            return None;
        }
        let results = self.test_many(&segments).await;

        let mut check = ChainCheck {
            violations: 0,
            distance_m: 0.0,
            first_bad: None,
            complete: true,
        };
        for (i, result) in results.iter().enumerate() {
            if !result.valid {
                check.complete = false;
            }
            if (!result.valid || result.violation_count > 0) && check.first_bad.is_none() {
                check.first_bad = Some(i);
            }
            check.violations += result.violation_count;
            check.distance_m += result.distance_m;
        }
        Some(check)
    }
}

/// Which way an anchor connection is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Towards {
    /// Trip start to waypoint.
    Waypoint,
    /// Waypoint to trip end.
    Endpoint,
}

impl Towards {
    fn path(self, endpoint: Point, waypoint: Point) -> Vec<Point> {
        match self {
            Towards::Waypoint => vec![endpoint, waypoint],
            Towards::Endpoint => vec![waypoint, endpoint],
        }
    }
}
