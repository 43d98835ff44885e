pub mod availability;
pub mod engine;
pub mod guard;
pub mod models;
pub mod repository;
pub mod seat;

pub use availability::{tickets_available, FlightAvailability, FlightDetail};
pub use engine::BookingEngine;
pub use repository::{BookingStore, StoreError, StoreResult};
pub use seat::{check_grid, validate_seat, SeatError};

/// Everything that can go wrong while booking.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order must contain at least one ticket")]
    EmptyOrder,

    #[error("Flight not found: {0}")]
    FlightNotFound(i64),

    #[error("Invalid seat (row {row}, seat {seat}): {reason}")]
    InvalidSeat { row: i32, seat: i32, reason: SeatError },

    #[error("Seat already taken: flight {flight_id}, row {row}, seat {seat}")]
    SeatAlreadyTaken { flight_id: i64, row: i32, seat: i32 },

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Ticket not found: {0}")]
    TicketNotFound(i64),

    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SeatTaken { flight_id, row, seat } => {
                OrderError::SeatAlreadyTaken { flight_id, row, seat }
            }
            StoreError::MissingFlight(id) => OrderError::FlightNotFound(id),
            StoreError::MissingOrder(id) => OrderError::OrderNotFound(id),
            StoreError::MissingTicket(id) => OrderError::TicketNotFound(id),
            other => OrderError::Storage(other),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
