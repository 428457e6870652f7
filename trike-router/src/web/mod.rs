//! Web layer for the tricycle route planner.
//!
//! Provides JSON endpoints for trip suggestions, fares, restriction
//! avoidance and driving routes.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
