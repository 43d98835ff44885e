use airport_core::{FlightAvailability, FlightDetail};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flights", get(list_flights))
        .route("/v1/flights/{id}", get(get_flight))
}

async fn list_flights(State(state): State<AppState>) -> Result<Json<Vec<FlightAvailability>>, AppError> {
    let flights = state.engine.list_flights().await?;
    Ok(Json(flights))
}

async fn get_flight(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<FlightDetail>, AppError> {
    state
        .engine
        .flight_detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Flight not found: {}", id)))
}
