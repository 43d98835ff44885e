use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Crew, FlightListing, FlightRecord, Seat};

/// Seats left on a flight: grid capacity minus tickets issued.
///
/// Never stored. If an airplane was shrunk after tickets were sold the result goes negative.
pub fn tickets_available(capacity: i64, issued_tickets: i64) -> i64 {
    capacity - issued_tickets
}

/// A flight as shown in listings.
#[derive(Debug, Clone, Serialize)]
pub struct FlightAvailability {
    pub id: i64,
    pub route: String,
    pub airplane: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub crew: Vec<Crew>,
    pub tickets_available: i64,
}

impl From<FlightListing> for FlightAvailability {
    fn from(listing: FlightListing) -> Self {
        let FlightListing {
            flight,
            issued_tickets,
        } = listing;

        Self {
            id: flight.id,
            route: flight.route.to_string(),
            airplane: flight.airplane.to_string(),
            tickets_available: tickets_available(flight.airplane.capacity(), issued_tickets),
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            crew: flight.crew,
        }
    }
}

/// A single flight with the seats already taken on it.
#[derive(Debug, Clone, Serialize)]
pub struct FlightDetail {
    pub id: i64,
    pub route: String,
    pub airplane: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub crew: Vec<String>,
    pub tickets_taken: Vec<Seat>,
}

impl FlightDetail {
    pub fn new(flight: FlightRecord, mut tickets_taken: Vec<Seat>) -> Self {
        tickets_taken.sort();
        Self {
            id: flight.id,
            route: flight.route.to_string(),
            airplane: flight.airplane.to_string(),
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            crew: flight.crew.iter().map(Crew::full_name).collect(),
            tickets_taken,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AirplaneSummary, RouteSummary};

    fn record() -> FlightRecord {
        FlightRecord {
            id: 1,
            route: RouteSummary {
                id: 1,
                source_city: "Boryspol".to_string(),
                destination_city: "Lviv".to_string(),
                distance: 650,
            },
            airplane: AirplaneSummary {
                id: 1,
                name: "A".to_string(),
                type_name: "Airbus".to_string(),
                rows: 10,
                seats_in_row: 10,
            },
            departure_time: Utc::now(),
            arrival_time: Utc::now(),
            crew: vec![Crew {
                id: 1,
                first_name: "First".to_string(),
                last_name: "First".to_string(),
            }],
        }
    }

    #[test]
    fn test_capacity_minus_issued() {
        assert_eq!(tickets_available(100, 3), 97);
        assert_eq!(tickets_available(100, 0), 100);
        assert_eq!(tickets_available(100, 100), 0);
    }

    #[test]
    fn test_listing_conversion() {
        let listing = FlightListing {
            flight: record(),
            issued_tickets: 3,
        };
        let view = FlightAvailability::from(listing);
        assert_eq!(view.tickets_available, 97);
        assert_eq!(view.route, "Boryspol - Lviv: 650 km");
        assert_eq!(view.airplane, "A Airbus");
    }

    #[test]
    fn test_detail_sorts_taken_seats() {
        let detail = FlightDetail::new(
            record(),
            vec![Seat { row: 2, seat: 1 }, Seat { row: 1, seat: 4 }],
        );
        assert_eq!(
            detail.tickets_taken,
            vec![Seat { row: 1, seat: 4 }, Seat { row: 2, seat: 1 }]
        );
        assert_eq!(detail.crew, vec!["First First".to_string()]);
    }
}
