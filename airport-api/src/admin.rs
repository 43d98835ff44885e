use airport_core::models::{Ticket, TicketSpec};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub order: i64,
    #[serde(flatten)]
    pub ticket: TicketSpec,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/tickets", post(create_ticket))
        .route("/v1/admin/tickets/{id}", put(update_ticket))
        .route("/v1/admin/flights/{id}", delete(delete_flight))
        .route("/v1/admin/orders/{id}", delete(delete_order))
}

async fn create_ticket(
    State(state): State<AppState>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>), AppError> {
    let ticket = state.engine.create_ticket(req.order, &req.ticket).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn update_ticket(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(spec): Json<TicketSpec>,
) -> Result<Json<Ticket>, AppError> {
    let ticket = state.engine.update_ticket(id, &spec).await?;
    Ok(Json(ticket))
}

async fn delete_flight(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.engine.delete_flight(id).await.map_err(AppError::lookup)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.engine.delete_order(id).await.map_err(AppError::lookup)?;
    Ok(StatusCode::NO_CONTENT)
}
