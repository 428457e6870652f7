//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use tracing::{info, warn};

use crate::avoidance::WaypointPlan;
use crate::fare::{FareAdjustment, FareError, FareMatrix};
use crate::geo::Point;
use crate::oracle::DriveRoute;
use crate::planner::{PlanError, RoutePlan, ZoneSummary};
use crate::zones::{self, ZoneError};

use super::dto::*;
use super::state::AppState;

/// Upper bound on intermediate points in one driving request.
const MAX_DRIVE_WAYPOINTS: usize = 25;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/fares", get(fares))
        .route("/fares/fuel-price", put(set_fuel_price))
        .route("/fares/adjustments", post(add_adjustment))
        .route("/places", get(search_places))
        .route("/zones", get(list_zones))
        .route("/zones/reload", post(reload_zones))
        .route("/routes/suggest", post(suggest_routes))
        .route("/routes/avoid", post(avoid_restrictions))
        .route("/routes/drive", post(drive))
        .route("/restrictions/waypoints", get(waypoints))
        .route("/restrictions/graph", get(graph_stats))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Ranked direct and transfer suggestions for a trip.
async fn suggest_routes(
    State(state): State<AppState>,
    Json(req): Json<SuggestRequest>,
) -> Result<Json<RoutePlan>, AppError> {
    let plan = state
        .planner
        .suggest_routes(req.start, req.end, req.discounted)
        .await?;
    Ok(Json(plan))
}

async fn fares(State(state): State<AppState>) -> Json<FareMatrix> {
    Json(state.planner.fare_matrix().await)
}

async fn set_fuel_price(
    State(state): State<AppState>,
    Json(req): Json<FuelPriceRequest>,
) -> Result<Json<FareMatrix>, AppError> {
    let matrix = state.planner.set_fuel_price(req.fuel_price).await?;
    info!(fuel_price = req.fuel_price, "fuel price updated");
    Ok(Json(matrix))
}

async fn add_adjustment(
    State(state): State<AppState>,
    Json(req): Json<AdjustmentRequest>,
) -> Result<(StatusCode, Json<FareAdjustment>), AppError> {
    let lifetime = match req.hours {
        Some(hours) if hours.is_finite() && hours > 0.0 => {
            // The cast saturates, so huge values fall out of `try_seconds`.
            let lifetime = chrono::Duration::try_seconds((hours * 3600.0).round() as i64)
                .ok_or(PlanError::Fare(FareError::InvalidLifetime))?;
            Some(lifetime)
        }
        Some(hours) => {
            return Err(AppError::BadRequest {
                message: format!("Adjustment lifetime must be positive hours, got {hours}"),
            });
        }
        None => None,
    };

    let adjustment = state
        .planner
        .add_fare_adjustment(req.zone, req.multiplier, lifetime)
        .await?;
    Ok((StatusCode::CREATED, Json(adjustment)))
}

/// Search landmarks by name.
async fn search_places(
    State(state): State<AppState>,
    Query(req): Query<PlaceSearchRequest>,
) -> Json<PlaceSearchResponse> {
    let limit = req.limit.unwrap_or(10).min(50);
    let places = state
        .places
        .search(&req.q, limit)
        .into_iter()
        .cloned()
        .collect();
    Json(PlaceSearchResponse { places })
}

async fn list_zones(State(state): State<AppState>) -> Json<Vec<ZoneSummary>> {
    Json(state.planner.zone_summaries().await)
}

/// Re-read zone files and replace every zone at once.
async fn reload_zones(State(state): State<AppState>) -> Result<Json<ReloadResponse>, AppError> {
    let zones = zones::load_zone_dir(&state.zones_dir)?;
    if zones.is_empty() {
        return Err(AppError::NotFound {
            message: format!("No zone files in {}", state.zones_dir.display()),
        });
    }

    let version = state.planner.reload_zones(zones).await;
    Ok(Json(ReloadResponse {
        version,
        zones: state.planner.zone_summaries().await,
    }))
}

/// Waypoints that keep the road route clear of restricted areas.
async fn avoid_restrictions(
    State(state): State<AppState>,
    Json(req): Json<AvoidRequest>,
) -> Result<Json<WaypointPlan>, AppError> {
    check_point("start", req.start)?;
    check_point("end", req.end)?;
    Ok(Json(
        state
            .avoidance
            .find_optimal_waypoints(req.start, req.end)
            .await,
    ))
}

/// Driving route through optional waypoints, straight-line on failure.
async fn drive(
    State(state): State<AppState>,
    Json(req): Json<DriveRequest>,
) -> Result<Json<DriveRoute>, AppError> {
    check_point("start", req.start)?;
    check_point("end", req.end)?;
    if req.waypoints.len() > MAX_DRIVE_WAYPOINTS {
        return Err(AppError::BadRequest {
            message: format!(
                "At most {MAX_DRIVE_WAYPOINTS} waypoints are allowed, got {}",
                req.waypoints.len()
            ),
        });
    }
    for point in &req.waypoints {
        check_point("waypoint", *point)?;
    }
    Ok(Json(
        state
            .avoidance
            .client()
            .drive(req.start, &req.waypoints, req.end)
            .await,
    ))
}

async fn waypoints(State(state): State<AppState>) -> Json<WaypointsResponse> {
    let statuses = state.waypoints.statuses();
    Json(WaypointsResponse {
        usable: state.waypoints.usable().len(),
        excluded: statuses.len() - state.waypoints.usable().len(),
        waypoints: statuses,
    })
}

async fn graph_stats(State(state): State<AppState>) -> Json<GraphResponse> {
    let client = state.avoidance.client();
    Json(GraphResponse {
        graph: state.avoidance.graph_stats().clone(),
        oracle_cache: client.cache_stats(),
        oracle_requests: client.request_count(),
    })
}

fn check_point(which: &str, point: Point) -> Result<(), AppError> {
    if point.is_finite() && point.lat.abs() <= 90.0 && point.lng.abs() <= 180.0 {
        Ok(())
    } else {
        Err(AppError::BadRequest {
            message: format!("Invalid {which} point: {point}"),
        })
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<ZoneError> for AppError {
    fn from(e: ZoneError) -> Self {
        match e {
            ZoneError::UnknownZone(_) => AppError::NotFound {
                message: e.to_string(),
            },
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        warn!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
