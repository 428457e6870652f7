//! Trip suggestion types.

use serde::Serialize;

use crate::geo::Point;
use crate::zones::{TransferPoint, ZoneId};

/// A ride within a single zone without changing tricycles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectRoute {
    pub zone_id: ZoneId,
    /// Short zone label, e.g. "Orange".
    pub zone: String,
    pub route_name: String,
    pub color: String,
    pub description: String,
    /// Walk from the start point to the route (km).
    pub start_walk_km: f64,
    /// Walk from the route to the end point (km).
    pub end_walk_km: f64,
    /// Straight-line trip distance (km).
    pub distance_km: f64,
    pub fare: f64,
    pub discounted_fare: f64,
    pub score: f64,
}

/// One ride in a transfer itinerary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leg {
    pub zone_id: ZoneId,
    pub zone: String,
    pub color: String,
    pub board: Point,
    pub alight: Point,
    pub distance_km: f64,
    pub fare: f64,
    pub discounted_fare: f64,
    pub description: String,
}

/// Rides in two or more zones joined by short walks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRoute {
    pub legs: Vec<Leg>,
    pub transfer_points: Vec<TransferPoint>,
    /// Total walking: to the first zone, between zones, from the last zone (km).
    pub total_walk_km: f64,
    pub transfer_count: usize,
    pub total_fare: f64,
    pub total_discounted_fare: f64,
    pub score: f64,
}

impl TransferRoute {
    /// Assemble an itinerary; totals are summed from the legs.
    pub fn new(legs: Vec<Leg>, transfer_points: Vec<TransferPoint>, total_walk_km: f64) -> Self {
        let total_fare = legs.iter().map(|l| l.fare).sum();
        let total_discounted_fare = legs.iter().map(|l| l.discounted_fare).sum();
        Self {
            transfer_count: legs.len().saturating_sub(1),
            legs,
            transfer_points,
            total_walk_km,
            total_fare,
            total_discounted_fare,
            score: 0.0,
        }
    }
}

/// A ranked trip option.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteSuggestion {
    Direct(DirectRoute),
    Transfer(TransferRoute),
}

impl RouteSuggestion {
    pub fn score(&self) -> f64 {
        match self {
            Self::Direct(d) => d.score,
            Self::Transfer(t) => t.score,
        }
    }

    pub fn transfer_count(&self) -> usize {
        match self {
            Self::Direct(_) => 0,
            Self::Transfer(t) => t.transfer_count,
        }
    }

    pub fn total_fare(&self) -> f64 {
        match self {
            Self::Direct(d) => d.fare,
            Self::Transfer(t) => t.total_fare,
        }
    }

    pub fn total_discounted_fare(&self) -> f64 {
        match self {
            Self::Direct(d) => d.discounted_fare,
            Self::Transfer(t) => t.total_discounted_fare,
        }
    }

    /// The total fare a passenger with this discount status pays.
    pub fn applicable_fare(&self, discounted: bool) -> f64 {
        if discounted {
            self.total_discounted_fare()
        } else {
            self.total_fare()
        }
    }

    pub fn total_walk_km(&self) -> f64 {
        match self {
            Self::Direct(d) => d.start_walk_km + d.end_walk_km,
            Self::Transfer(t) => t.total_walk_km,
        }
    }

    /// Zones ridden, in order.
    pub fn zone_ids(&self) -> Vec<&ZoneId> {
        match self {
            Self::Direct(d) => vec![&d.zone_id],
            Self::Transfer(t) => t.legs.iter().map(|l| &l.zone_id).collect(),
        }
    }

    pub(crate) fn set_score(&mut self, score: f64) {
        match self {
            Self::Direct(d) => d.score = score,
            Self::Transfer(t) => t.score = score,
        }
    }
}

/// Human-readable walking summary for a direct ride.
pub fn route_description(start_walk_km: f64, end_walk_km: f64) -> String {
    const NEGLIGIBLE_KM: f64 = 0.1;

    if start_walk_km < NEGLIGIBLE_KM && end_walk_km < NEGLIGIBLE_KM {
        return "Direct route available".to_string();
    }
    let mut parts = Vec::new();
    if start_walk_km >= NEGLIGIBLE_KM {
        parts.push(format!("{:.0}m to start", start_walk_km * 1000.0));
    }
    if end_walk_km >= NEGLIGIBLE_KM {
        parts.push(format!("{:.0}m from end", end_walk_km * 1000.0));
    }
    format!("Walk {}", parts.join(" and "))
}
