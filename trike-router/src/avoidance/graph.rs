//! The persisted waypoint graph document and its in-memory network form.
//!
//! The document keeps string ids and is what the offline builder writes.
//! [`WaypointNetwork`] is the arena the router searches: nodes live in a
//! `Vec`, adjacency is by index, and ids are only looked up at the edges.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::restriction::{Side, Waypoint};

use super::config::AvoidanceConfig;

/// Document format version written by this crate.
pub const GRAPH_VERSION: &str = "2.0";

const DESCRIPTION: &str = "Complete precomputed route graph with all waypoint connections";

/// Errors loading or saving a waypoint graph document.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// File could not be read or written
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid JSON for a waypoint graph
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document was written by an incompatible builder
    #[error("unsupported graph version {0}")]
    UnsupportedVersion(String),

    /// An edge refers to a node id that is not in the document
    #[error("edge {edge} refers to unknown node {id}")]
    UnknownNode { edge: usize, id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    pub built_at: DateTime<Utc>,
    pub version: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub side: Side,
}

impl From<&Waypoint> for GraphNode {
    fn from(wp: &Waypoint) -> Self {
        Self {
            id: wp.id.clone(),
            lat: wp.point.lat,
            lng: wp.point.lng,
            name: wp.name.clone(),
            side: wp.side,
        }
    }
}

impl GraphNode {
    pub fn to_waypoint(&self) -> Waypoint {
        Waypoint::new(self.id.clone(), self.lat, self.lng, self.name.clone(), self.side)
    }
}

/// A directed, oracle-tested connection between two waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    /// Metres.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    pub violations: usize,
    pub cost: f64,
}

/// Summary of a graph document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub zero_violation_edges: usize,
    pub built_at: DateTime<Utc>,
    pub version: String,
}

/// Versioned, timestamped waypoint graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointGraph {
    pub metadata: GraphMetadata,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl WaypointGraph {
    pub fn new(built_at: DateTime<Utc>, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self {
            metadata: GraphMetadata {
                built_at,
                version: GRAPH_VERSION.to_string(),
                description: DESCRIPTION.to_string(),
            },
            nodes,
            edges,
        }
    }

    /// A graph of bare nodes. The router can still connect endpoints
    /// through a single waypoint.
    pub fn without_edges(built_at: DateTime<Utc>, waypoints: &[Waypoint]) -> Self {
        Self::new(built_at, waypoints.iter().map(GraphNode::from).collect(), Vec::new())
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let graph: Self = serde_json::from_str(json)?;
        graph.validate()?;
        Ok(graph)
    }

    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let json = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> Result<(), GraphError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| GraphError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    fn validate(&self) -> Result<(), GraphError> {
        let major = self.metadata.version.split('.').next().unwrap_or_default();
        if major != "2" {
            return Err(GraphError::UnsupportedVersion(self.metadata.version.clone()));
        }

        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        for (edge, e) in self.edges.iter().enumerate() {
            for id in [&e.from, &e.to] {
                if !ids.contains(id.as_str()) {
                    return Err(GraphError::UnknownNode {
                        edge,
                        id: id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            zero_violation_edges: self.edges.iter().filter(|e| e.violations == 0).count(),
            built_at: self.metadata.built_at,
            version: self.metadata.version.clone(),
        }
    }

    /// Outgoing edge count per node, in node order.
    pub fn out_degrees(&self) -> Vec<(&str, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for e in &self.edges {
            *counts.entry(e.from.as_str()).or_default() += 1;
        }
        self.nodes
            .iter()
            .map(|n| (n.id.as_str(), counts.get(n.id.as_str()).copied().unwrap_or(0)))
            .collect()
    }
}

/// A directed link in the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub to: usize,
    pub distance_m: f64,
    pub violations: usize,
    pub cost: f64,
}

/// Index-based form of a [`WaypointGraph`] for searching.
#[derive(Debug, Clone, Default)]
pub struct WaypointNetwork {
    nodes: Vec<Waypoint>,
    index: HashMap<String, usize>,
    adjacency: Vec<Vec<Link>>,
}

impl WaypointNetwork {
    /// Build the network, dropping edges at or above the violation ceiling
    /// and recosting the rest with `config`.
    pub fn from_graph(graph: &WaypointGraph, config: &AvoidanceConfig) -> Self {
        let nodes: Vec<Waypoint> = graph.nodes.iter().map(GraphNode::to_waypoint).collect();
        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, wp)| (wp.id.clone(), i))
            .collect();
        let mut adjacency = vec![Vec::new(); nodes.len()];

        for e in &graph.edges {
            if e.violations >= config.max_edge_violations {
                continue;
            }
            let (Some(&from), Some(&to)) = (index.get(&e.from), index.get(&e.to)) else {
                continue;
            };
            if from == to {
                continue;
            }
            adjacency[from].push(Link {
                to,
                distance_m: e.distance,
                violations: e.violations,
                cost: config.edge_cost(e.distance, e.violations),
            });
        }

        Self {
            nodes,
            index,
            adjacency,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Waypoint] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &Waypoint {
        &self.nodes[idx]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn links(&self, idx: usize) -> &[Link] {
        &self.adjacency[idx]
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }
}
