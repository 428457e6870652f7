//! Search configuration for the route planner.

use crate::zones::{GraphSettings, TransferSettings};

/// Weights combined into a suggestion's score. Higher scores rank first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Starting score before penalties.
    pub base: f64,
    /// Penalty per unit of the fare the passenger pays.
    pub per_fare: f64,
    /// Penalty per transfer.
    pub per_transfer: f64,
    /// Penalty per km walked.
    pub per_walk_km: f64,
    /// Flat bonus for itineraries without a transfer.
    pub direct_bonus: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            base: 100.0,
            per_fare: 6.0,
            per_transfer: 6.0,
            per_walk_km: 8.0,
            direct_bonus: 10.0,
        }
    }
}

/// Configuration parameters for route search.
///
/// Distances are in km. The defaults were tuned for Butuan City's route
/// geometry.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Longest walk to or from a zone for a direct ride.
    pub max_walk_km: f64,

    /// Longest walk to or from a zone for it to take part in a transfer
    /// itinerary.
    pub transfer_access_km: f64,

    /// Longest walk between two zones at a transfer.
    pub max_transfer_walk_km: f64,

    /// Transfer candidates closer than this to a kept one are dropped.
    pub transfer_dedup_km: f64,

    /// Maximum transfer candidates kept per zone pair.
    pub max_transfer_points: usize,

    /// Maximum number of transfers in one itinerary.
    pub max_transfers: usize,

    /// Maximum zone sequences enumerated per start/end zone pair.
    pub max_zone_paths: usize,

    /// Longest total walk (access, transfers and egress) for a transfer
    /// itinerary.
    pub max_total_walk_km: f64,

    /// Maximum number of suggestions to return.
    pub max_results: usize,

    /// Largest gap between two segments of a zone that still counts as a
    /// physical connection.
    pub connection_threshold_km: f64,

    /// Path cost beyond which the connectivity search gives up.
    pub connectivity_cutoff_km: f64,

    /// Multiplier on the transfer walk when choosing a transfer point.
    pub transfer_walk_penalty: f64,

    pub weights: ScoreWeights,
}

impl SearchConfig {
    pub fn with_max_transfers(mut self, max_transfers: usize) -> Self {
        self.max_transfers = max_transfers;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_max_walk_km(mut self, max_walk_km: f64) -> Self {
        self.max_walk_km = max_walk_km;
        self
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Settings for the per-snapshot zone graphs.
    pub fn graph_settings(&self) -> GraphSettings {
        GraphSettings {
            connection_threshold_km: self.connection_threshold_km,
            transfer: TransferSettings {
                max_walk_km: self.max_transfer_walk_km,
                dedup_km: self.transfer_dedup_km,
                max_points: self.max_transfer_points,
            },
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_walk_km: 0.5,
            transfer_access_km: 0.8,
            max_transfer_walk_km: 0.2,
            transfer_dedup_km: 0.1,
            max_transfer_points: 10,
            max_transfers: 3,
            max_zone_paths: 20,
            max_total_walk_km: 1.0,
            max_results: 5,
            connection_threshold_km: 0.1,
            connectivity_cutoff_km: 10.0,
            transfer_walk_penalty: 2.0,
            weights: ScoreWeights::default(),
        }
    }
}
