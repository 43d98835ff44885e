use airport_core::models::{
    Airplane, AirplaneType, Airport, Crew, Flight, NewAirplane, NewAirport, NewCrew, NewFlight,
    NewRoute, Route,
};
use airport_core::repository::{CatalogRepository, FlightRepository};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{error::AppError, state::AppState};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateAirplaneTypeRequest {
    pub name: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Reference data management. Admin only: mounted behind `require_admin`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/airports", post(create_airport))
        .route("/v1/admin/airplane-types", post(create_airplane_type))
        .route("/v1/admin/airplanes", post(create_airplane))
        .route("/v1/admin/airplanes/{id}", get(get_airplane).put(update_airplane))
        .route("/v1/admin/routes", post(create_route))
        .route("/v1/admin/crews", post(create_crew))
        .route("/v1/admin/flights", post(create_flight))
}

async fn create_airport(
    State(state): State<AppState>,
    Json(req): Json<NewAirport>,
) -> Result<(StatusCode, Json<Airport>), AppError> {
    let airport = state.store.create_airport(&req).await?;
    tracing::info!("Created airport {} ({})", airport.id, airport.name);
    Ok((StatusCode::CREATED, Json(airport)))
}

async fn create_airplane_type(
    State(state): State<AppState>,
    Json(req): Json<CreateAirplaneTypeRequest>,
) -> Result<(StatusCode, Json<AirplaneType>), AppError> {
    let kind = state.store.create_airplane_type(&req.name).await?;
    Ok((StatusCode::CREATED, Json(kind)))
}

async fn create_airplane(
    State(state): State<AppState>,
    Json(req): Json<NewAirplane>,
) -> Result<(StatusCode, Json<Airplane>), AppError> {
    let airplane = state.store.create_airplane(&req).await?;
    tracing::info!(
        "Created airplane {} with {} seats",
        airplane.id,
        airplane.capacity()
    );
    Ok((StatusCode::CREATED, Json(airplane)))
}

async fn get_airplane(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Airplane>, AppError> {
    state
        .store
        .get_airplane(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Airplane not found: {}", id)))
}

/// Resizes or renames an airplane. Tickets already sold are left as they are.
async fn update_airplane(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewAirplane>,
) -> Result<Json<Airplane>, AppError> {
    if state.store.get_airplane(id).await?.is_none() {
        return Err(AppError::NotFoundError(format!("Airplane not found: {}", id)));
    }

    let airplane = Airplane {
        id,
        name: req.name,
        rows: req.rows,
        seats_in_row: req.seats_in_row,
        airplane_type_id: req.airplane_type_id,
    };
    state.store.update_airplane(&airplane).await?;
    Ok(Json(airplane))
}

async fn create_route(
    State(state): State<AppState>,
    Json(req): Json<NewRoute>,
) -> Result<(StatusCode, Json<Route>), AppError> {
    let route = state.store.create_route(&req).await?;
    Ok((StatusCode::CREATED, Json(route)))
}

async fn create_crew(
    State(state): State<AppState>,
    Json(req): Json<NewCrew>,
) -> Result<(StatusCode, Json<Crew>), AppError> {
    let crew = state.store.create_crew(&req).await?;
    Ok((StatusCode::CREATED, Json(crew)))
}

async fn create_flight(
    State(state): State<AppState>,
    Json(req): Json<NewFlight>,
) -> Result<(StatusCode, Json<Flight>), AppError> {
    let flight = state.store.create_flight(&req).await?;
    tracing::info!("Scheduled flight {} on route {}", flight.id, flight.route_id);
    Ok((StatusCode::CREATED, Json(flight)))
}
