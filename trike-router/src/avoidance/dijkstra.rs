//! Violation-penalized shortest path over the waypoint network.
//!
//! The network is augmented with two virtual nodes, `start` and `end`,
//! joined to the real waypoints through oracle-tested anchor connections.
//! Ties are broken by node index so repeated searches agree.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use super::config::AvoidanceConfig;
use super::graph::WaypointNetwork;

/// An oracle-tested connection between a trip endpoint and a waypoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    /// Index into the [`WaypointNetwork`].
    pub node: usize,
    pub distance_m: f64,
    pub violations: usize,
}

/// A path through the augmented graph, virtual endpoints included.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath {
    pub nodes: Vec<usize>,
    pub cost: f64,
}

impl GraphPath {
    /// The real waypoints between the virtual endpoints.
    pub fn waypoints(&self) -> &[usize] {
        match self.nodes.len() {
            0..=2 => &[],
            n => &self.nodes[1..n - 1],
        }
    }

    /// Consecutive node pairs, for banning edges.
    pub fn hops(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.nodes.windows(2).map(|w| (w[0], w[1]))
    }
}

/// The waypoint network plus virtual `start` and `end` nodes.
pub struct AugmentedGraph<'a> {
    network: &'a WaypointNetwork,
    start: &'a [Anchor],
    /// Cost from each real node to `end`, if anchored.
    end_cost: Vec<Option<f64>>,
    config: &'a AvoidanceConfig,
}

impl<'a> AugmentedGraph<'a> {
    pub fn new(
        network: &'a WaypointNetwork,
        start: &'a [Anchor],
        end: &[Anchor],
        config: &'a AvoidanceConfig,
    ) -> Self {
        let mut end_cost = vec![None; network.len()];
        for anchor in end {
            let cost = config.edge_cost(anchor.distance_m, anchor.violations);
            let current: Option<f64> = end_cost[anchor.node];
            end_cost[anchor.node] = Some(current.map_or(cost, |c| c.min(cost)));
        }
        Self {
            network,
            start,
            end_cost,
            config,
        }
    }

    pub fn start_id(&self) -> usize {
        self.network.len()
    }

    pub fn end_id(&self) -> usize {
        self.network.len() + 1
    }

    fn neighbors(&self, node: usize) -> Vec<(usize, f64)> {
        let hop = self.config.hop_penalty_m;
        if node == self.start_id() {
            return self
                .start
                .iter()
                .map(|a| {
                    (
                        a.node,
                        self.config.edge_cost(a.distance_m, a.violations) + hop,
                    )
                })
                .collect();
        }
        if node == self.end_id() {
            return Vec::new();
        }

        let mut out: Vec<(usize, f64)> = self
            .network
            .links(node)
            .iter()
            .map(|l| (l.to, l.cost + hop))
            .collect();
        if let Some(cost) = self.end_cost[node] {
            out.push((self.end_id(), cost + hop));
        }
        out
    }

    /// Cheapest `start` → `end` path avoiding `banned` node pairs.
    pub fn shortest_path(&self, banned: &HashSet<(usize, usize)>) -> Option<GraphPath> {
        let size = self.network.len() + 2;
        let (start, end) = (self.start_id(), self.end_id());
        let mut best = vec![f64::INFINITY; size];
        let mut prev: Vec<Option<usize>> = vec![None; size];
        let mut heap = BinaryHeap::new();

        best[start] = 0.0;
        heap.push(Frontier {
            cost: 0.0,
            node: start,
        });

        while let Some(Frontier { cost, node }) = heap.pop() {
            if cost > best[node] {
                continue;
            }
            if node == end {
                break;
            }
            for (next, weight) in self.neighbors(node) {
                if banned.contains(&(node, next)) {
                    continue;
                }
                let next_cost = cost + weight;
                if next_cost < best[next] {
                    best[next] = next_cost;
                    prev[next] = Some(node);
                    heap.push(Frontier {
                        cost: next_cost,
                        node: next,
                    });
                }
            }
        }

        if !best[end].is_finite() {
            return None;
        }

        let mut nodes = vec![end];
        let mut at = end;
        while let Some(p) = prev[at] {
            nodes.push(p);
            at = p;
        }
        nodes.reverse();
        Some(GraphPath {
            nodes,
            cost: best[end],
        })
    }
}

/// Min-heap entry ordered by cost, then node index.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    cost: f64,
    node: usize,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::avoidance::graph::{GraphEdge, GraphNode, WaypointGraph};
    use crate::restriction::{Side, Waypoint};

    fn edge(from: &str, to: &str, distance: f64, violations: usize) -> GraphEdge {
        GraphEdge {
            from: from.into(),
            to: to.into(),
            distance,
            duration: distance / 5.0,
            violations,
            cost: distance,
        }
    }

    /// A → B → C is short but B → C crosses a restriction; A → D → C is
    /// longer and clear.
    fn network() -> WaypointNetwork {
        let nodes = ["A", "B", "C", "D"]
            .iter()
            .map(|id| GraphNode::from(&Waypoint::new(*id, 8.95, 125.53, *id, Side::North)))
            .collect();
        let edges = vec![
            edge("A", "B", 500.0, 0),
            edge("B", "C", 500.0, 1),
            edge("A", "D", 2000.0, 0),
            edge("D", "C", 2000.0, 0),
        ];
        WaypointNetwork::from_graph(
            &WaypointGraph::new(Utc::now(), nodes, edges),
            &AvoidanceConfig::default(),
        )
    }

    fn anchor(node: usize) -> Anchor {
        Anchor {
            node,
            distance_m: 100.0,
            violations: 0,
        }
    }

    #[test]
    fn violations_outweigh_distance() {
        let network = network();
        let config = AvoidanceConfig::default();
        let (a, c, d) = (0, 2, 3);
        let start = [anchor(a)];
        let end = [anchor(c)];
        let graph = AugmentedGraph::new(&network, &start, &end, &config);

        let path = graph.shortest_path(&HashSet::new()).unwrap();
        assert_eq!(path.waypoints(), &[a, d, c]);
        assert_eq!(path.nodes.first(), Some(&graph.start_id()));
        assert_eq!(path.nodes.last(), Some(&graph.end_id()));
    }

    #[test]
    fn banned_edges_force_alternatives() {
        let network = network();
        let config = AvoidanceConfig::default();
        let start = [anchor(0)];
        let end = [anchor(2)];
        let graph = AugmentedGraph::new(&network, &start, &end, &config);

        let banned: HashSet<_> = [(0, 3)].into_iter().collect();
        let path = graph.shortest_path(&banned).unwrap();
        assert_eq!(path.waypoints(), &[0, 1, 2]);
        assert!(path.cost > config.violation_penalty_m);

        let banned: HashSet<_> = [(0, 3), (0, 1)].into_iter().collect();
        assert!(graph.shortest_path(&banned).is_none());
    }

    #[test]
    fn unanchored_end_is_unreachable() {
        let network = network();
        let config = AvoidanceConfig::default();
        let start = [anchor(0)];
        let graph = AugmentedGraph::new(&network, &start, &[], &config);
        assert!(graph.shortest_path(&HashSet::new()).is_none());
    }

    #[test]
    fn repeated_searches_agree() {
        let network = network();
        let config = AvoidanceConfig::default();
        // Two equally good anchors on each side.
        let start = [anchor(1), anchor(0)];
        let end = [anchor(2), anchor(3)];
        let graph = AugmentedGraph::new(&network, &start, &end, &config);

        let first = graph.shortest_path(&HashSet::new()).unwrap();
        for _ in 0..10 {
            assert_eq!(graph.shortest_path(&HashSet::new()).unwrap(), first);
        }
    }
}
