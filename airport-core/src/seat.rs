use serde::Serialize;

use crate::models::{Airplane, AirplaneSummary, NewAirplane};
use crate::repository::{StoreError, StoreResult};

/// Anything with a rows × seats-per-row seat layout.
pub trait SeatGrid {
    fn rows(&self) -> i32;
    fn seats_in_row(&self) -> i32;
}

impl SeatGrid for Airplane {
    fn rows(&self) -> i32 {
        self.rows
    }

    fn seats_in_row(&self) -> i32 {
        self.seats_in_row
    }
}

impl SeatGrid for NewAirplane {
    fn rows(&self) -> i32 {
        self.rows
    }

    fn seats_in_row(&self) -> i32 {
        self.seats_in_row
    }
}

impl SeatGrid for AirplaneSummary {
    fn rows(&self) -> i32 {
        self.rows
    }

    fn seats_in_row(&self) -> i32 {
        self.seats_in_row
    }
}

/// A seat position that falls outside the airplane's grid.
///
/// Both variants carry the attempted value and the upper bound of the valid range `[1, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeatError {
    #[error("row number must be in available range: (1, rows): (1, {max})")]
    RowOutOfRange { row: i32, max: i32 },

    #[error("seat number must be in available range: (1, seats_in_row): (1, {max})")]
    SeatOutOfRange { seat: i32, max: i32 },
}

impl SeatError {
    /// The valid inclusive range for the offending coordinate.
    pub fn valid_range(&self) -> (i32, i32) {
        match self {
            SeatError::RowOutOfRange { max, .. } | SeatError::SeatOutOfRange { max, .. } => (1, *max),
        }
    }
}

/// Checks a (row, seat) pair against the grid. Row is checked first.
pub fn validate_seat<G: SeatGrid + ?Sized>(row: i32, seat: i32, grid: &G) -> Result<(), SeatError> {
    let rows = grid.rows();
    if !(1..=rows).contains(&row) {
        return Err(SeatError::RowOutOfRange { row, max: rows });
    }

    let seats = grid.seats_in_row();
    if !(1..=seats).contains(&seat) {
        return Err(SeatError::SeatOutOfRange { seat, max: seats });
    }

    Ok(())
}

/// A grid must have at least one row and one seat per row before it can be stored.
pub fn check_grid<G: SeatGrid + ?Sized>(grid: &G) -> StoreResult<()> {
    if grid.rows() < 1 {
        return Err(StoreError::InvalidField {
            field: "rows",
            value: i64::from(grid.rows()),
        });
    }
    if grid.seats_in_row() < 1 {
        return Err(StoreError::InvalidField {
            field: "seats_in_row",
            value: i64::from(grid.seats_in_row()),
        });
    }
    Ok(())
}
