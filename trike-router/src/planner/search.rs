//! Route search across zones.
//!
//! Finds direct rides within one zone and multi-zone itineraries joined at
//! transfer points, prices them, and ranks the results.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::fare::FareEngine;
use crate::geo::{self, Point};
use crate::zones::{TransferPoint, Zone, ZoneId, ZoneSnapshot};

use super::config::SearchConfig;
use super::rank::{rank_suggestions, score_suggestion};
use super::suggestion::{DirectRoute, Leg, RouteSuggestion, TransferRoute, route_description};

/// Distances from the trip endpoints to one zone.
#[derive(Debug, Clone, Copy)]
struct ZoneAccess<'a> {
    zone: &'a Zone,
    start_km: f64,
    end_km: f64,
}

/// Route search over one zone snapshot and fare state.
pub struct RouteSearch<'a> {
    snapshot: &'a ZoneSnapshot,
    fares: &'a FareEngine,
    config: &'a SearchConfig,
}

impl<'a> RouteSearch<'a> {
    pub fn new(snapshot: &'a ZoneSnapshot, fares: &'a FareEngine, config: &'a SearchConfig) -> Self {
        Self {
            snapshot,
            fares,
            config,
        }
    }

    /// Ranked suggestions for a trip from `start` to `end`.
    ///
    /// An empty result means no zone or zone sequence serves the trip; it is
    /// not an error.
    pub fn suggest(&self, start: Point, end: Point, discounted: bool) -> Vec<RouteSuggestion> {
        if self.snapshot.is_empty() {
            return Vec::new();
        }

        let access: Vec<ZoneAccess<'_>> = self
            .snapshot
            .zones()
            .iter()
            .map(|zone| ZoneAccess {
                zone,
                start_km: zone.nearest_distance(start),
                end_km: zone.nearest_distance(end),
            })
            .collect();

        let mut suggestions: Vec<RouteSuggestion> = access
            .iter()
            .filter_map(|a| self.direct_route(a, start, end))
            .map(RouteSuggestion::Direct)
            .collect();
        let direct_count = suggestions.len();

        suggestions.extend(
            self.transfer_routes(&access, start, end)
                .into_iter()
                .map(RouteSuggestion::Transfer),
        );

        for s in &mut suggestions {
            let score = score_suggestion(s, &self.config.weights, discounted);
            s.set_score(score);
        }

        debug!(
            %start,
            %end,
            direct = direct_count,
            transfer = suggestions.len() - direct_count,
            "route candidates"
        );

        rank_suggestions(suggestions, discounted, self.config.max_results)
    }

    /// A direct ride needs both endpoints within walking distance of the
    /// zone and a physical path between them along it.
    fn direct_route(&self, access: &ZoneAccess<'_>, start: Point, end: Point) -> Option<DirectRoute> {
        let max_walk = self.config.max_walk_km;
        if access.start_km >= max_walk || access.end_km >= max_walk {
            return None;
        }
        let zone = access.zone;
        if !self.connected(zone.id(), start, end) {
            trace!(zone = %zone.id(), "endpoints near zone but not connected");
            return None;
        }

        let distance_km = geo::distance(start, end);
        let quote = self.fares.quote(distance_km, Some(zone.id()));
        Some(DirectRoute {
            zone_id: zone.id().clone(),
            zone: zone.label().to_string(),
            route_name: zone.display_name().to_string(),
            color: zone.color().to_string(),
            description: route_description(access.start_km, access.end_km),
            start_walk_km: access.start_km,
            end_walk_km: access.end_km,
            distance_km,
            fare: quote.regular,
            discounted_fare: quote.discounted,
            score: 0.0,
        })
    }

    fn transfer_routes(&self, access: &[ZoneAccess<'_>], start: Point, end: Point) -> Vec<TransferRoute> {
        let reach = self.config.transfer_access_km;
        let start_zones: Vec<&ZoneId> = access
            .iter()
            .filter(|a| a.start_km < reach)
            .map(|a| a.zone.id())
            .collect();
        let end_zones: Vec<&ZoneId> = access
            .iter()
            .filter(|a| a.end_km < reach)
            .map(|a| a.zone.id())
            .collect();

        let transfers = self.snapshot.transfers();
        let mut paths: BTreeSet<Vec<ZoneId>> = BTreeSet::new();
        for s in &start_zones {
            for e in &end_zones {
                if s == e {
                    continue;
                }
                paths.extend(transfers.find_zone_paths(
                    s,
                    e,
                    self.config.max_transfers,
                    self.config.max_zone_paths,
                ));
            }
        }

        trace!(paths = paths.len(), "zone paths enumerated");
        paths
            .iter()
            .filter_map(|path| self.resolve_itinerary(path, start, end))
            .collect()
    }

    /// Turn a zone sequence into a concrete itinerary, or `None` if any hop
    /// cannot be ridden.
    fn resolve_itinerary(&self, path: &[ZoneId], start: Point, end: Point) -> Option<TransferRoute> {
        let (first, last) = (path.first()?, path.last()?);
        let (mut board, start_walk) = self.snapshot.zone(first).ok()?.nearest_point(start)?;
        let mut walk_km = start_walk;
        let mut legs = Vec::with_capacity(path.len());
        let mut used = Vec::with_capacity(path.len().saturating_sub(1));

        for hop in path.windows(2) {
            let (from, to) = (&hop[0], &hop[1]);
            let chosen = self.choose_transfer(from, to, board, end)?;
            legs.push(self.leg(from, board, chosen.point_a)?);
            walk_km += chosen.walk_km;
            used.push(chosen);
            board = chosen.point_b;
        }

        let (exit, end_walk) = self.snapshot.zone(last).ok()?.nearest_point(end)?;
        if !self.connected(last, board, exit) {
            trace!(zone = %last, "final leg not connected");
            return None;
        }
        legs.push(self.leg(last, board, exit)?);
        walk_km += end_walk;

        if walk_km > self.config.max_total_walk_km {
            trace!(walk_km, "itinerary walks too far");
            return None;
        }
        Some(TransferRoute::new(legs, used, walk_km))
    }

    /// The transfer point from `from` into `to` that best moves the trip
    /// towards `goal` and can be reached from `board` along `from`.
    fn choose_transfer(&self, from: &ZoneId, to: &ZoneId, board: Point, goal: Point) -> Option<TransferPoint> {
        let penalty = self.config.transfer_walk_penalty;
        let mut options: Vec<(f64, TransferPoint)> = self
            .snapshot
            .transfers()
            .transfer_points(from, to)
            .iter()
            .map(|t| {
                let cost = geo::distance(board, t.point_a)
                    + geo::distance(t.point_b, goal)
                    + penalty * t.walk_km;
                (cost, *t)
            })
            .collect();
        options.sort_by(|a, b| a.0.total_cmp(&b.0));

        let chosen = options
            .into_iter()
            .map(|(_, t)| t)
            .find(|t| self.connected(from, board, t.point_a));
        if chosen.is_none() {
            trace!(%from, %to, "no reachable transfer point");
        }
        chosen
    }

    fn leg(&self, zone_id: &ZoneId, board: Point, alight: Point) -> Option<Leg> {
        let zone = self.snapshot.zone(zone_id).ok()?;
        let distance_km = geo::distance(board, alight);
        let quote = self.fares.quote(distance_km, Some(zone_id));
        Some(Leg {
            zone_id: zone_id.clone(),
            zone: zone.label().to_string(),
            color: zone.color().to_string(),
            board,
            alight,
            distance_km,
            fare: quote.regular,
            discounted_fare: quote.discounted,
            description: format!("{} Zone - {:.1}km", zone.label(), distance_km),
        })
    }

    fn connected(&self, zone: &ZoneId, a: Point, b: Point) -> bool {
        self.snapshot.connectivity(zone).is_ok_and(|graph| {
            graph.are_points_connected(
                a,
                b,
                self.config.max_walk_km,
                self.config.connectivity_cutoff_km,
            )
        })
    }
}
