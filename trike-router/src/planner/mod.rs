//! Tricycle route planner.
//!
//! This module answers: "which tricycle zones, and which transfers between
//! them, get me from here to there, and what will it cost?"
//!
//! Direct rides need both endpoints near one zone and a physical path
//! between them along that zone's roads. Transfer itineraries chain zones
//! whose routes pass within walking distance of each other.

mod config;
mod rank;
mod search;
mod service;
mod suggestion;

pub use config::{ScoreWeights, SearchConfig};
pub use rank::{rank_suggestions, score_suggestion};
pub use search::RouteSearch;
pub use service::{PlanError, RoutePlan, TripPlanner, ZoneSummary};
pub use suggestion::{DirectRoute, Leg, RouteSuggestion, TransferRoute, route_description};
