//! Per-zone segment connectivity.
//!
//! Two points can both be close to a zone's polylines yet sit on pieces of
//! road that never meet in the source data. The connectivity graph links
//! segments that touch (within a small threshold) so reachability along the
//! zone can be checked by search rather than by proximity alone.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use tracing::trace;

use crate::geo::{self, BoundingBox, Point};

use super::zone::Zone;

/// A single edge between consecutive vertices of a zone polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub polyline: usize,
    pub index: usize,
    pub start: Point,
    pub end: Point,
    /// Length in km. Zero for a polyline that collapsed to one point.
    pub length: f64,
}

impl Segment {
    fn distance_to(&self, p: Point) -> f64 {
        geo::distance_to_segment(p, self.start, self.end)
    }

    /// Minimum of the four endpoint-to-opposite-segment distances.
    fn gap(&self, other: &Segment) -> f64 {
        self.distance_to(other.start)
            .min(self.distance_to(other.end))
            .min(other.distance_to(self.start))
            .min(other.distance_to(self.end))
    }
}

/// Segment adjacency graph for a single zone.
#[derive(Debug, Clone)]
pub struct ConnectivityGraph {
    segments: Vec<Segment>,
    /// `adjacency[i]` holds `(neighbour, weight)` pairs.
    adjacency: Vec<Vec<(usize, f64)>>,
}

impl ConnectivityGraph {
    /// Build the graph for `zone`, linking segments whose gap is at most
    /// `connection_threshold_km`.
    ///
    /// Edge weight is the gap plus the neighbour's own length, so moving onto
    /// a long segment costs that segment.
    pub fn build(zone: &Zone, connection_threshold_km: f64) -> Self {
        let segments = segments_of(zone);
        let bounds: Vec<BoundingBox> = segments
            .iter()
            .map(|s| segment_bounds(s).expanded_km(connection_threshold_km))
            .collect();

        let mut adjacency = vec![Vec::new(); segments.len()];
        for i in 0..segments.len() {
            for j in (i + 1)..segments.len() {
                if !bounds[i].intersects(&bounds[j]) {
                    continue;
                }
                let gap = segments[i].gap(&segments[j]);
                if gap <= connection_threshold_km {
                    adjacency[i].push((j, gap + segments[j].length));
                    adjacency[j].push((i, gap + segments[i].length));
                }
            }
        }

        let graph = Self {
            segments,
            adjacency,
        };
        trace!(
            zone = %zone.id(),
            segments = graph.segments.len(),
            edges = graph.edge_count(),
            "built connectivity graph"
        );
        graph
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Indices of segments within `max_walk_km` of `p`.
    pub fn candidate_segments(&self, p: Point, max_walk_km: f64) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.distance_to(p) <= max_walk_km)
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether `a` and `b` are reachable from each other along the zone.
    ///
    /// Each point maps to the segments within `max_walk_km`. A shared segment
    /// answers immediately; otherwise a uniform-cost search runs from all of
    /// `a`'s segments and fails once the path cost exceeds `cutoff_km`.
    ///
    /// Every path's cost is the sum of the lengths of the segments on it plus
    /// the gaps between them, which is the same in either direction, so the
    /// answer is symmetric in `a` and `b`.
    pub fn are_points_connected(&self, a: Point, b: Point, max_walk_km: f64, cutoff_km: f64) -> bool {
        let sources = self.candidate_segments(a, max_walk_km);
        let targets: HashSet<usize> = self.candidate_segments(b, max_walk_km).into_iter().collect();

        if sources.is_empty() || targets.is_empty() {
            return false;
        }
        if sources.iter().any(|s| targets.contains(s)) {
            return true;
        }

        let mut best = vec![f64::INFINITY; self.segments.len()];
        let mut heap = BinaryHeap::new();
        for &s in &sources {
            let cost = self.segments[s].length;
            if cost <= cutoff_km && cost < best[s] {
                best[s] = cost;
                heap.push(Frontier { cost, segment: s });
            }
        }

        while let Some(Frontier { cost, segment }) = heap.pop() {
            if cost > best[segment] {
                continue;
            }
            if targets.contains(&segment) {
                return true;
            }
            for &(next, weight) in &self.adjacency[segment] {
                let next_cost = cost + weight;
                if next_cost <= cutoff_km && next_cost < best[next] {
                    best[next] = next_cost;
                    heap.push(Frontier {
                        cost: next_cost,
                        segment: next,
                    });
                }
            }
        }

        false
    }
}

/// Min-heap entry ordered by cost, then segment index.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    cost: f64,
    segment: usize,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.segment.cmp(&self.segment))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Enumerate a zone's segments, skipping repeated consecutive vertices.
fn segments_of(zone: &Zone) -> Vec<Segment> {
    let mut segments = Vec::new();
    for (polyline, line) in zone.polylines().iter().enumerate() {
        let mut vertices: Vec<Point> = line.clone();
        vertices.dedup();

        if let [only] = vertices.as_slice() {
            segments.push(Segment {
                polyline,
                index: 0,
                start: *only,
                end: *only,
                length: 0.0,
            });
            continue;
        }

        for (index, pair) in vertices.windows(2).enumerate() {
            segments.push(Segment {
                polyline,
                index,
                start: pair[0],
                end: pair[1],
                length: geo::distance(pair[0], pair[1]),
            });
        }
    }
    segments
}

fn segment_bounds(s: &Segment) -> BoundingBox {
    BoundingBox {
        north: s.start.lat.max(s.end.lat),
        south: s.start.lat.min(s.end.lat),
        east: s.start.lng.max(s.end.lng),
        west: s.start.lng.min(s.end.lng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WALK: f64 = 0.5;
    const CUTOFF: f64 = 10.0;

    fn y_junction() -> Zone {
        // Two arms that run close together at their tips but never join.
        let west_arm = vec![
            Point::new(8.950, 125.520),
            Point::new(8.955, 125.525),
            Point::new(8.960, 125.530),
        ];
        let east_arm = vec![
            Point::new(8.9605, 125.5345),
            Point::new(8.955, 125.540),
            Point::new(8.950, 125.545),
        ];
        Zone::from_type("orange", vec![west_arm, east_arm])
    }

    #[test]
    fn consecutive_segments_are_linked() {
        let graph = ConnectivityGraph::build(&Zone::fallback_orange(), 0.1);
        assert_eq!(graph.segments().len(), 5);
        // Each inner joint links neighbours; at least the four joints.
        assert!(graph.edge_count() >= 4);
    }

    #[test]
    fn fallback_route_ends_are_connected() {
        let zone = Zone::fallback_orange();
        let graph = ConnectivityGraph::build(&zone, 0.1);
        let start = Point::new(8.9643, 125.5401);
        let end = Point::new(8.9548, 125.5285);

        assert!(graph.are_points_connected(start, end, WALK, CUTOFF));
    }

    #[test]
    fn disjoint_arms_are_not_connected() {
        let zone = y_junction();
        let graph = ConnectivityGraph::build(&zone, 0.1);
        let west = Point::new(8.950, 125.520);
        let east = Point::new(8.950, 125.545);

        assert!(!graph.are_points_connected(west, east, 0.2, CUTOFF));
    }

    #[test]
    fn wider_threshold_joins_the_arms() {
        let zone = y_junction();
        // Arm tips are about 0.5 km apart.
        let graph = ConnectivityGraph::build(&zone, 0.6);
        let west = Point::new(8.950, 125.520);
        let east = Point::new(8.950, 125.545);

        assert!(graph.are_points_connected(west, east, 0.2, CUTOFF));
    }

    #[test]
    fn cutoff_bounds_the_search() {
        let zone = Zone::fallback_orange();
        let graph = ConnectivityGraph::build(&zone, 0.1);
        let start = Point::new(8.9643, 125.5401);
        let end = Point::new(8.9548, 125.5285);

        assert!(!graph.are_points_connected(start, end, 0.05, 0.5));
    }

    #[test]
    fn points_far_from_zone_are_not_connected() {
        let graph = ConnectivityGraph::build(&Zone::fallback_orange(), 0.1);
        let far = Point::new(9.0, 125.6);
        assert!(!graph.are_points_connected(far, Point::new(8.9643, 125.5401), WALK, CUTOFF));
    }

    #[test]
    fn single_point_polyline_is_a_degenerate_segment() {
        let p = Point::new(8.95, 125.53);
        let zone = Zone::from_type("red", vec![vec![p, p]]);
        let graph = ConnectivityGraph::build(&zone, 0.1);

        assert_eq!(graph.segments().len(), 1);
        assert_eq!(graph.segments()[0].length, 0.0);
        assert!(graph.are_points_connected(
            Point::new(8.951, 125.53),
            Point::new(8.949, 125.53),
            WALK,
            CUTOFF
        ));
    }

    fn near_y() -> impl Strategy<Value = Point> {
        (8.948f64..8.962, 125.518f64..125.547).prop_map(|(lat, lng)| Point::new(lat, lng))
    }

    proptest! {
        #[test]
        fn connectivity_is_symmetric(a in near_y(), b in near_y()) {
            let zone = y_junction();
            let graph = ConnectivityGraph::build(&zone, 0.1);
            prop_assert_eq!(
                graph.are_points_connected(a, b, 0.3, CUTOFF),
                graph.are_points_connected(b, a, 0.3, CUTOFF)
            );
        }
    }
}
