//! The single seat check shared by every path that writes a ticket.

use crate::seat::{validate_seat, SeatGrid};
use crate::models::TicketSpec;
use crate::OrderError;

/// Rejects a ticket whose seat falls outside the flight's airplane grid.
pub fn check_ticket<G: SeatGrid + ?Sized>(spec: &TicketSpec, airplane: &G) -> Result<(), OrderError> {
    validate_seat(spec.row, spec.seat, airplane).map_err(|reason| OrderError::InvalidSeat {
        row: spec.row,
        seat: spec.seat,
        reason,
    })
}
