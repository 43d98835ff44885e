use airport_core::models::{Order, Ticket, TicketSpec};
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, middleware::Claims, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub tickets: Vec<TicketSpec>,
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    pub flight: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub tickets: Vec<TicketResponse>,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            row: ticket.row,
            seat: ticket.seat,
            flight: ticket.flight_id,
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            created_at: order.created_at,
            tickets: order.tickets.into_iter().map(TicketResponse::from).collect(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/orders", get(list_orders).post(create_order))
}

async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let orders = state.engine.list_orders(&claims.sub).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let order = state.engine.create_order(&claims.sub, &req.tickets).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}
