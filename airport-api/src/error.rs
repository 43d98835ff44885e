use airport_core::{OrderError, StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    /// A booking rule rejected the request.
    Booking(OrderError),
    Anyhow(anyhow::Error),
}

impl AppError {
    /// For ids taken from the URL path: a missing flight or order is a 404,
    /// not a bad reference in the request body.
    pub fn lookup(err: OrderError) -> Self {
        match err {
            OrderError::FlightNotFound(_) | OrderError::OrderNotFound(_) => {
                AppError::NotFoundError(err.to_string())
            }
            other => other.into(),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Storage(e) => AppError::Anyhow(e.into()),
            other => AppError::Booking(other),
        }
    }
}

/// Reference data writes: a dangling id or a rejected value is the caller's fault.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingReference { .. } | StoreError::InvalidField { .. } => {
                AppError::ValidationError(err.to_string())
            }
            other => OrderError::from(other).into(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Anyhow(err)
    }
}

fn booking_status(err: &OrderError) -> StatusCode {
    match err {
        OrderError::EmptyOrder
        | OrderError::InvalidSeat { .. }
        | OrderError::FlightNotFound(_)
        | OrderError::OrderNotFound(_) => StatusCode::BAD_REQUEST,
        OrderError::SeatAlreadyTaken { .. } => StatusCode::CONFLICT,
        OrderError::TicketNotFound(_) => StatusCode::NOT_FOUND,
        OrderError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn booking_detail(err: &OrderError) -> Option<Value> {
    match err {
        OrderError::InvalidSeat { row, seat, reason } => {
            let (min, max) = reason.valid_range();
            Some(json!({
                "row": row,
                "seat": seat,
                "reason": reason,
                "valid_range": [min, max],
            }))
        }
        OrderError::SeatAlreadyTaken { flight_id, row, seat } => Some(json!({
            "flight": flight_id,
            "row": row,
            "seat": seat,
        })),
        OrderError::FlightNotFound(id) => Some(json!({ "flight": id })),
        OrderError::OrderNotFound(id) => Some(json!({ "order": id })),
        OrderError::TicketNotFound(id) => Some(json!({ "ticket": id })),
        OrderError::EmptyOrder | OrderError::Storage(_) => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, detail) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Booking(err) => (booking_status(&err), err.to_string(), booking_detail(&err)),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
        };

        let body = match detail {
            Some(detail) => json!({ "error": error_message, "detail": detail }),
            None => json!({ "error": error_message }),
        };

        (status, Json(body)).into_response()
    }
}
