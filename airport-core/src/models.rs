use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Reference data
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airport {
    pub id: i64,
    pub name: String,
    pub closest_big_city: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAirport {
    pub name: String,
    pub closest_big_city: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirplaneType {
    pub id: i64,
    pub name: String,
}

/// An airplane with a fixed rectangular seat grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airplane {
    pub id: i64,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub airplane_type_id: i64,
}

impl Airplane {
    pub fn capacity(&self) -> i64 {
        i64::from(self.rows) * i64::from(self.seats_in_row)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAirplane {
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub airplane_type_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: i64,
    pub source_id: i64,
    pub destination_id: i64,
    pub distance: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRoute {
    pub source_id: i64,
    pub destination_id: i64,
    pub distance: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crew {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl Crew {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCrew {
    pub first_name: String,
    pub last_name: String,
}

// ============================================================================
// Flights
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub id: i64,
    pub route_id: i64,
    pub airplane_id: i64,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub crew: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFlight {
    pub route_id: i64,
    pub airplane_id: i64,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    #[serde(default)]
    pub crew: Vec<i64>,
}

/// Route joined with the cities of both of its airports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub id: i64,
    pub source_city: String,
    pub destination_city: String,
    pub distance: i32,
}

impl std::fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}: {} km",
            self.source_city, self.destination_city, self.distance
        )
    }
}

/// Airplane joined with the name of its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AirplaneSummary {
    pub id: i64,
    pub name: String,
    pub type_name: String,
    pub rows: i32,
    pub seats_in_row: i32,
}

impl AirplaneSummary {
    pub fn capacity(&self) -> i64 {
        i64::from(self.rows) * i64::from(self.seats_in_row)
    }
}

impl std::fmt::Display for AirplaneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.type_name)
    }
}

/// A flight with everything needed to display it or validate seats against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightRecord {
    pub id: i64,
    pub route: RouteSummary,
    pub airplane: AirplaneSummary,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub crew: Vec<Crew>,
}

/// A flight and the seats already ticketed on it, read in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightSeats {
    pub flight: FlightRecord,
    pub taken: Vec<Seat>,
}

/// A flight together with the number of tickets issued for it, read in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightListing {
    pub flight: FlightRecord,
    pub issued_tickets: i64,
}

// ============================================================================
// Tickets & Orders
// ============================================================================

/// A (row, seat) position in an airplane's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Seat {
    pub row: i32,
    pub seat: i32,
}

/// A seat proposed for ticketing on a given flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketSpec {
    pub row: i32,
    pub seat: i32,
    #[serde(rename = "flight")]
    pub flight_id: i64,
}

impl TicketSpec {
    pub fn seat(&self) -> Seat {
        Seat {
            row: self.row,
            seat: self.seat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    #[serde(rename = "flight")]
    pub flight_id: i64,
    #[serde(rename = "order")]
    pub order_id: i64,
}

impl Ticket {
    pub fn seat(&self) -> Seat {
        Seat {
            row: self.row,
            seat: self.seat,
        }
    }

    pub fn spec(&self) -> TicketSpec {
        TicketSpec {
            row: self.row,
            seat: self.seat,
            flight_id: self.flight_id,
        }
    }
}

/// Canonical ticket ordering: (row, seat) ascending, id as a tiebreaker across flights.
pub fn sort_tickets(tickets: &mut [Ticket]) {
    tickets.sort_by_key(|t| (t.row, t.seat, t.id));
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub owner: String,
    pub tickets: Vec<Ticket>,
}
