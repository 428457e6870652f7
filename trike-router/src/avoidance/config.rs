//! Tuning for waypoint graph construction and routing.

use crate::restriction::SafePointSearch;

/// How hard to look for oracle-tested connections from an endpoint into
/// the waypoint graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorSearch {
    /// Stop once this many connections are accepted.
    pub target: usize,
    /// Nearest waypoints to try, at most.
    pub attempts: usize,
}

/// Configuration for the restriction-avoidance router.
#[derive(Debug, Clone, PartialEq)]
pub struct AvoidanceConfig {
    /// Cost added per violation, in metres. Large enough that one violation
    /// outweighs any detour.
    pub violation_penalty_m: f64,

    /// Cost added per hop, in metres, to prefer fewer waypoints.
    pub hop_penalty_m: f64,

    /// Edges with this many violations or more are dropped.
    pub max_edge_violations: usize,

    /// Anchor search accepting only violation-free connections.
    pub strict: AnchorSearch,

    /// Anchor search accepting the least-violating connections.
    pub relaxed: AnchorSearch,

    /// Dijkstra paths to verify before giving up on the graph.
    pub max_alternatives: usize,

    /// Oracle requests in flight at once.
    pub concurrency: usize,

    /// Hard cap on path tests per routing request.
    pub max_oracle_calls: usize,

    pub safe_point: SafePointSearch,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            violation_penalty_m: 1_000_000.0,
            hop_penalty_m: 50.0,
            max_edge_violations: 100,
            strict: AnchorSearch {
                target: 5,
                attempts: 15,
            },
            relaxed: AnchorSearch {
                target: 7,
                attempts: 21,
            },
            max_alternatives: 5,
            concurrency: 4,
            max_oracle_calls: 200,
            safe_point: SafePointSearch::default(),
        }
    }
}

impl AvoidanceConfig {
    pub fn with_max_oracle_calls(mut self, n: usize) -> Self {
        self.max_oracle_calls = n;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_max_alternatives(mut self, n: usize) -> Self {
        self.max_alternatives = n;
        self
    }

    /// Edge cost used both when building and when searching the graph.
    pub fn edge_cost(&self, distance_m: f64, violations: usize) -> f64 {
        distance_m + violations as f64 * self.violation_penalty_m
    }
}
