//! Cross-zone transfer points and zone path enumeration.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use tracing::debug;

use crate::geo::{self, Point};

use super::zone::{Zone, ZoneId};

/// A place where a passenger can walk from one zone's route to another's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransferPoint {
    /// Vertex on the zone being left.
    pub point_a: Point,
    /// Vertex on the zone being entered.
    pub point_b: Point,
    /// Haversine distance between the two vertices (km).
    pub walk_km: f64,
}

/// Limits used when building transfer candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferSettings {
    /// Longest walk allowed between two zones (km).
    pub max_walk_km: f64,
    /// Candidates whose `point_a` is closer than this to a kept one are dropped (km).
    pub dedup_km: f64,
    /// Maximum candidates kept per ordered zone pair.
    pub max_points: usize,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            max_walk_km: 0.2,
            dedup_km: 0.1,
            max_points: 10,
        }
    }
}

/// Transfer candidates for every ordered pair of zones.
#[derive(Debug, Clone)]
pub struct ZoneTransferGraph {
    zones: Vec<ZoneId>,
    index: HashMap<ZoneId, usize>,
    /// `links[a]` lists `(b, transfer points)` for every reachable zone b,
    /// sorted by b.
    links: Vec<Vec<(usize, Vec<TransferPoint>)>>,
}

impl ZoneTransferGraph {
    pub fn build(zones: &[Zone], settings: &TransferSettings) -> Self {
        let ids: Vec<ZoneId> = zones.iter().map(|z| z.id().clone()).collect();
        let index = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut links = vec![Vec::new(); zones.len()];
        for (a, zone_a) in zones.iter().enumerate() {
            for (b, zone_b) in zones.iter().enumerate() {
                if a == b {
                    continue;
                }
                let points = transfer_points_between(zone_a, zone_b, settings);
                if !points.is_empty() {
                    debug!(
                        from = %zone_a.id(),
                        to = %zone_b.id(),
                        count = points.len(),
                        nearest_m = (points[0].walk_km * 1000.0).round(),
                        "transfer points"
                    );
                    links[a].push((b, points));
                }
            }
        }

        Self {
            zones: ids,
            index,
            links,
        }
    }

    /// Transfer candidates for leaving `from` into `to`, nearest first.
    pub fn transfer_points(&self, from: &ZoneId, to: &ZoneId) -> &[TransferPoint] {
        let (Some(&a), Some(&b)) = (self.index.get(from), self.index.get(to)) else {
            return &[];
        };
        self.links[a]
            .iter()
            .find(|(n, _)| *n == b)
            .map(|(_, points)| points.as_slice())
            .unwrap_or(&[])
    }

    /// Number of ordered zone pairs with at least one transfer point.
    pub fn link_count(&self) -> usize {
        self.links.iter().map(Vec::len).sum()
    }

    /// Enumerate zone sequences from `start` to `end` with at most
    /// `max_transfers` changes.
    ///
    /// Breadth-first, so shorter sequences come first. A zone never repeats
    /// within a sequence. Stops once `max_paths` sequences are found. When
    /// `start == end` the single-zone sequence is returned.
    pub fn find_zone_paths(
        &self,
        start: &ZoneId,
        end: &ZoneId,
        max_transfers: usize,
        max_paths: usize,
    ) -> Vec<Vec<ZoneId>> {
        let (Some(&s), Some(&e)) = (self.index.get(start), self.index.get(end)) else {
            return Vec::new();
        };
        if max_paths == 0 {
            return Vec::new();
        }
        if s == e {
            return vec![vec![start.clone()]];
        }

        let max_len = max_transfers + 1;
        let mut found: Vec<Vec<usize>> = Vec::new();
        let mut queue: VecDeque<Vec<usize>> = VecDeque::from([vec![s]]);

        while let Some(path) = queue.pop_front() {
            let Some(&last) = path.last() else {
                continue;
            };
            if last == e {
                found.push(path);
                if found.len() >= max_paths {
                    break;
                }
                continue;
            }
            if path.len() >= max_len {
                continue;
            }
            for (next, _) in &self.links[last] {
                if !path.contains(next) {
                    let mut extended = path.clone();
                    extended.push(*next);
                    queue.push_back(extended);
                }
            }
        }

        found
            .into_iter()
            .map(|path| path.into_iter().map(|i| self.zones[i].clone()).collect())
            .collect()
    }
}

/// Vertex pairs between two zones within walking distance, nearest first,
/// de-duplicated around each physical junction and capped.
fn transfer_points_between(
    zone_a: &Zone,
    zone_b: &Zone,
    settings: &TransferSettings,
) -> Vec<TransferPoint> {
    let (Some(bounds_a), Some(bounds_b)) = (zone_a.bounds(), zone_b.bounds()) else {
        return Vec::new();
    };
    if !bounds_a.expanded_km(settings.max_walk_km).intersects(&bounds_b) {
        return Vec::new();
    }
    let reach_b = bounds_b.expanded_km(settings.max_walk_km);

    let mut candidates = Vec::new();
    for a in zone_a.vertices().filter(|a| reach_b.contains(**a)) {
        for b in zone_b.vertices() {
            let walk_km = geo::distance(*a, *b);
            if walk_km <= settings.max_walk_km {
                candidates.push(TransferPoint {
                    point_a: *a,
                    point_b: *b,
                    walk_km,
                });
            }
        }
    }
    candidates.sort_by(|x, y| x.walk_km.total_cmp(&y.walk_km));

    let mut kept: Vec<TransferPoint> = Vec::new();
    for candidate in candidates {
        if kept.len() >= settings.max_points {
            break;
        }
        let duplicate = kept
            .iter()
            .any(|k| geo::distance(k.point_a, candidate.point_a) < settings.dedup_km);
        if !duplicate {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three zones along an east-west street: A meets B near 125.530,
    /// B meets C near 125.540. A and C never meet.
    fn chain() -> Vec<Zone> {
        let a = Zone::from_type(
            "orange",
            vec![vec![Point::new(8.95, 125.520), Point::new(8.95, 125.530)]],
        );
        let b = Zone::from_type(
            "red",
            vec![vec![Point::new(8.9505, 125.5301), Point::new(8.9505, 125.5399)]],
        );
        let c = Zone::from_type(
            "green",
            vec![vec![Point::new(8.951, 125.540), Point::new(8.951, 125.550)]],
        );
        vec![a, b, c]
    }

    fn id(zone_type: &str) -> ZoneId {
        ZoneId::for_type(zone_type)
    }

    #[test]
    fn transfer_points_found_between_touching_zones() {
        let graph = ZoneTransferGraph::build(&chain(), &TransferSettings::default());
        let points = graph.transfer_points(&id("orange"), &id("red"));

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].point_a, Point::new(8.95, 125.530));
        assert_eq!(points[0].point_b, Point::new(8.9505, 125.5301));
        assert!(points[0].walk_km < 0.1);
        assert_eq!(
            points[0].walk_km,
            geo::distance(points[0].point_a, points[0].point_b)
        );
    }

    #[test]
    fn pairs_just_inside_walk_threshold_are_kept() {
        let anchor = Point::new(8.95, 125.53);
        let north = Point::new(anchor.lat + 0.1999 / geo::KM_PER_DEGREE, anchor.lng);
        let east_deg = 0.1999 / (geo::KM_PER_DEGREE * anchor.lat.to_radians().cos());
        let east = Point::new(anchor.lat, anchor.lng + east_deg);

        for near in [north, east] {
            let a = Zone::from_type(
                "orange",
                vec![vec![anchor, Point::new(anchor.lat - 0.01, anchor.lng - 0.01)]],
            );
            let b = Zone::from_type(
                "red",
                vec![vec![near, Point::new(near.lat + 0.01, near.lng + 0.01)]],
            );
            let walk_km = geo::distance(anchor, near);
            assert!(walk_km > 0.199 && walk_km <= 0.2, "walk {walk_km}");

            let graph = ZoneTransferGraph::build(&[a, b], &TransferSettings::default());
            let points = graph.transfer_points(&id("orange"), &id("red"));
            assert_eq!(points.len(), 1, "pair {walk_km} km apart dropped");
            assert_eq!(points[0].point_b, near);
        }
    }

    #[test]
    fn distant_zones_have_no_transfer_points() {
        let graph = ZoneTransferGraph::build(&chain(), &TransferSettings::default());
        assert!(graph.transfer_points(&id("orange"), &id("green")).is_empty());
        assert_eq!(graph.link_count(), 4);
    }

    #[test]
    fn near_duplicate_candidates_are_collapsed() {
        // Zone B runs alongside zone A with dense vertices.
        let a = Zone::from_type(
            "orange",
            vec![vec![
                Point::new(8.9500, 125.5300),
                Point::new(8.9500, 125.5303),
                Point::new(8.9500, 125.5306),
                Point::new(8.9500, 125.5400),
            ]],
        );
        let b = Zone::from_type(
            "red",
            vec![vec![Point::new(8.9502, 125.5302), Point::new(8.9502, 125.5304)]],
        );
        let graph = ZoneTransferGraph::build(&[a, b], &TransferSettings::default());
        let points = graph.transfer_points(&id("orange"), &id("red"));

        // Three A vertices lie within 100 m of each other; only one survives.
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn candidates_are_capped() {
        let a = Zone::from_type(
            "orange",
            vec![(0..20)
                .map(|i| Point::new(8.95, 125.50 + 0.0015 * i as f64))
                .collect()],
        );
        let b = Zone::from_type(
            "red",
            vec![(0..20)
                .map(|i| Point::new(8.9501, 125.50 + 0.0015 * i as f64))
                .collect()],
        );
        let settings = TransferSettings {
            max_points: 3,
            ..TransferSettings::default()
        };
        let graph = ZoneTransferGraph::build(&[a, b], &settings);
        let points = graph.transfer_points(&id("orange"), &id("red"));

        assert_eq!(points.len(), 3);
        assert!(points.windows(2).all(|w| w[0].walk_km <= w[1].walk_km));
    }

    #[test]
    fn zone_paths_through_intermediate_zone() {
        let graph = ZoneTransferGraph::build(&chain(), &TransferSettings::default());

        let paths = graph.find_zone_paths(&id("orange"), &id("green"), 3, 20);
        assert_eq!(paths, vec![vec![id("orange"), id("red"), id("green")]]);

        // One transfer is not enough to get from A to C.
        assert!(graph.find_zone_paths(&id("orange"), &id("green"), 1, 20).is_empty());
    }

    #[test]
    fn zone_path_to_self() {
        let graph = ZoneTransferGraph::build(&chain(), &TransferSettings::default());
        assert_eq!(
            graph.find_zone_paths(&id("red"), &id("red"), 3, 20),
            vec![vec![id("red")]]
        );
    }

    #[test]
    fn unknown_zones_yield_no_paths() {
        let graph = ZoneTransferGraph::build(&chain(), &TransferSettings::default());
        assert!(graph.find_zone_paths(&id("blue"), &id("red"), 3, 20).is_empty());
    }

    #[test]
    fn path_enumeration_respects_cap() {
        // Four mutually touching zones around one junction.
        let junction = Point::new(8.95, 125.53);
        let zones: Vec<Zone> = ["orange", "red", "white", "green"]
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let off = 0.0001 * i as f64;
                Zone::from_type(
                    t,
                    vec![vec![
                        Point::new(junction.lat + off, junction.lng),
                        Point::new(junction.lat + 0.01, junction.lng + 0.01 * i as f64),
                    ]],
                )
            })
            .collect();
        let graph = ZoneTransferGraph::build(&zones, &TransferSettings::default());

        let all = graph.find_zone_paths(&id("orange"), &id("green"), 3, 100);
        // Direct, via red, via white, via red+white, via white+red.
        assert_eq!(all.len(), 5);
        assert_eq!(all[0], vec![id("orange"), id("green")]);

        let capped = graph.find_zone_paths(&id("orange"), &id("green"), 3, 2);
        assert_eq!(capped.len(), 2);
    }
}
