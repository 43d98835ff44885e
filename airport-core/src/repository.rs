use async_trait::async_trait;

use crate::models::{
    Airplane, AirplaneType, Airport, Crew, Flight, FlightListing, FlightRecord, FlightSeats, NewAirplane,
    NewAirport, NewCrew, NewFlight, NewRoute, Order, Route, Seat, Ticket, TicketSpec,
};

/// Failures reported by an entity store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The (flight, row, seat) uniqueness constraint rejected a write.
    #[error("Seat already taken: flight {flight_id}, row {row}, seat {seat}")]
    SeatTaken { flight_id: i64, row: i32, seat: i32 },

    #[error("Flight not found: {0}")]
    MissingFlight(i64),

    #[error("Order not found: {0}")]
    MissingOrder(i64),

    #[error("Ticket not found: {0}")]
    MissingTicket(i64),

    /// Some other foreign key (airport, airplane type, route, crew...) did not resolve.
    #[error("Referenced {entity} not found: {id}")]
    MissingReference { entity: &'static str, id: i64 },

    /// A value rejected by a CHECK constraint (grid dimensions, distance...).
    #[error("Invalid {field}: {value}")]
    InvalidField { field: &'static str, value: i64 },

    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Reference data access: airports, airplane types, airplanes, routes and crews.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn create_airport(&self, airport: &NewAirport) -> StoreResult<Airport>;

    async fn create_airplane_type(&self, name: &str) -> StoreResult<AirplaneType>;

    async fn create_airplane(&self, airplane: &NewAirplane) -> StoreResult<Airplane>;

    async fn get_airplane(&self, id: i64) -> StoreResult<Option<Airplane>>;

    /// Overwrites the airplane's grid. Existing tickets are not re-checked.
    async fn update_airplane(&self, airplane: &Airplane) -> StoreResult<()>;

    async fn create_route(&self, route: &NewRoute) -> StoreResult<Route>;

    async fn create_crew(&self, crew: &NewCrew) -> StoreResult<Crew>;
}

/// Flight data access
#[async_trait]
pub trait FlightRepository: Send + Sync {
    async fn create_flight(&self, flight: &NewFlight) -> StoreResult<Flight>;

    async fn get_flight(&self, id: i64) -> StoreResult<Option<FlightRecord>>;

    /// The flight together with its taken seats, both taken from the same snapshot.
    async fn get_flight_seats(&self, id: i64) -> StoreResult<Option<FlightSeats>>;

    /// Every flight with its issued-ticket count, both taken from the same snapshot.
    async fn list_flights(&self) -> StoreResult<Vec<FlightListing>>;

    /// Seats already ticketed on a flight, in (row, seat) order.
    async fn taken_seats(&self, flight_id: i64) -> StoreResult<Vec<Seat>>;

    /// Deletes the flight and, by cascade, its tickets. Returns false if it did not exist.
    async fn delete_flight(&self, id: i64) -> StoreResult<bool>;
}

/// Order and ticket data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts an order and all of its tickets as one atomic unit.
    ///
    /// A duplicate (flight, row, seat), against stored tickets or within `tickets`,
    /// fails with [`StoreError::SeatTaken`] and leaves nothing behind.
    async fn insert_order(&self, owner: &str, tickets: &[TicketSpec]) -> StoreResult<Order>;

    /// The owner's orders, newest first, tickets in (row, seat) order.
    async fn list_orders(&self, owner: &str) -> StoreResult<Vec<Order>>;

    /// Deletes the order and, by cascade, its tickets. Returns false if it did not exist.
    async fn delete_order(&self, id: i64) -> StoreResult<bool>;

    async fn get_ticket(&self, id: i64) -> StoreResult<Option<Ticket>>;

    /// Adds a single ticket to an existing order.
    async fn insert_ticket(&self, order_id: i64, spec: &TicketSpec) -> StoreResult<Ticket>;

    /// Moves an existing ticket to the seat and flight in `spec`.
    async fn update_ticket(&self, id: i64, spec: &TicketSpec) -> StoreResult<Ticket>;
}

/// Everything the booking engine and the HTTP layer need from persistence.
pub trait BookingStore: CatalogRepository + FlightRepository + OrderRepository {}

impl<T> BookingStore for T where T: CatalogRepository + FlightRepository + OrderRepository {}
