use std::collections::{BTreeMap, HashMap, HashSet};

use airport_core::models::{
    sort_tickets, Airplane, AirplaneSummary, AirplaneType, Airport, Crew, Flight, FlightListing,
    FlightRecord, FlightSeats, NewAirplane, NewAirport, NewCrew, NewFlight, NewRoute, Order, Route,
    RouteSummary, Seat, Ticket, TicketSpec,
};
use airport_core::repository::{CatalogRepository, FlightRepository, OrderRepository};
use airport_core::{check_grid, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

type SeatKey = (i64, i32, i32);

fn seat_key(spec: &TicketSpec) -> SeatKey {
    (spec.flight_id, spec.row, spec.seat)
}

fn seat_taken(spec: &TicketSpec) -> StoreError {
    StoreError::SeatTaken {
        flight_id: spec.flight_id,
        row: spec.row,
        seat: spec.seat,
    }
}

struct OrderEntry {
    created_at: DateTime<Utc>,
    owner: String,
}

#[derive(Default)]
struct State {
    last_id: i64,
    airports: BTreeMap<i64, Airport>,
    airplane_types: BTreeMap<i64, AirplaneType>,
    airplanes: BTreeMap<i64, Airplane>,
    routes: BTreeMap<i64, Route>,
    crews: BTreeMap<i64, Crew>,
    flights: BTreeMap<i64, Flight>,
    orders: BTreeMap<i64, OrderEntry>,
    tickets: BTreeMap<i64, Ticket>,
    /// (flight, row, seat) -> ticket id
    seats: HashMap<SeatKey, i64>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn record(&self, flight: &Flight) -> StoreResult<FlightRecord> {
        let route = self.routes.get(&flight.route_id).ok_or(StoreError::MissingReference {
            entity: "route",
            id: flight.route_id,
        })?;
        let city = |id: i64| {
            self.airports
                .get(&id)
                .map(|a| a.closest_big_city.clone())
                .ok_or(StoreError::MissingReference { entity: "airport", id })
        };
        let airplane = self.airplanes.get(&flight.airplane_id).ok_or(StoreError::MissingReference {
            entity: "airplane",
            id: flight.airplane_id,
        })?;
        let type_name = self
            .airplane_types
            .get(&airplane.airplane_type_id)
            .map(|t| t.name.clone())
            .ok_or(StoreError::MissingReference {
                entity: "airplane type",
                id: airplane.airplane_type_id,
            })?;

        Ok(FlightRecord {
            id: flight.id,
            route: RouteSummary {
                id: route.id,
                source_city: city(route.source_id)?,
                destination_city: city(route.destination_id)?,
                distance: route.distance,
            },
            airplane: AirplaneSummary {
                id: airplane.id,
                name: airplane.name.clone(),
                type_name,
                rows: airplane.rows,
                seats_in_row: airplane.seats_in_row,
            },
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            crew: flight
                .crew
                .iter()
                .filter_map(|id| self.crews.get(id).cloned())
                .collect(),
        })
    }

    fn taken(&self, flight_id: i64) -> Vec<Seat> {
        let mut seats: Vec<Seat> = self
            .seats
            .keys()
            .filter(|(flight, _, _)| *flight == flight_id)
            .map(|&(_, row, seat)| Seat { row, seat })
            .collect();
        seats.sort();
        seats
    }

    fn remove_ticket(&mut self, id: i64) {
        if let Some(ticket) = self.tickets.remove(&id) {
            self.seats.remove(&(ticket.flight_id, ticket.row, ticket.seat));
        }
    }

    fn order(&self, id: i64, entry: &OrderEntry) -> Order {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .values()
            .filter(|t| t.order_id == id)
            .cloned()
            .collect();
        sort_tickets(&mut tickets);
        Order {
            id,
            created_at: entry.created_at,
            owner: entry.owner.clone(),
            tickets,
        }
    }
}

/// In-process store with the same constraints as the Postgres schema.
///
/// Every write holds the lock for its whole duration, so a multi-ticket order
/// is applied all at once or not at all.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn create_airport(&self, airport: &NewAirport) -> StoreResult<Airport> {
        let mut state = self.state.write().await;
        let created = Airport {
            id: state.next_id(),
            name: airport.name.clone(),
            closest_big_city: airport.closest_big_city.clone(),
        };
        state.airports.insert(created.id, created.clone());
        Ok(created)
    }

    async fn create_airplane_type(&self, name: &str) -> StoreResult<AirplaneType> {
        let mut state = self.state.write().await;
        let created = AirplaneType {
            id: state.next_id(),
            name: name.to_string(),
        };
        state.airplane_types.insert(created.id, created.clone());
        Ok(created)
    }

    async fn create_airplane(&self, airplane: &NewAirplane) -> StoreResult<Airplane> {
        check_grid(airplane)?;
        let mut state = self.state.write().await;
        if !state.airplane_types.contains_key(&airplane.airplane_type_id) {
            return Err(StoreError::MissingReference {
                entity: "airplane type",
                id: airplane.airplane_type_id,
            });
        }
        let created = Airplane {
            id: state.next_id(),
            name: airplane.name.clone(),
            rows: airplane.rows,
            seats_in_row: airplane.seats_in_row,
            airplane_type_id: airplane.airplane_type_id,
        };
        state.airplanes.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_airplane(&self, id: i64) -> StoreResult<Option<Airplane>> {
        Ok(self.state.read().await.airplanes.get(&id).cloned())
    }

    async fn update_airplane(&self, airplane: &Airplane) -> StoreResult<()> {
        check_grid(airplane)?;
        let mut state = self.state.write().await;
        if !state.airplane_types.contains_key(&airplane.airplane_type_id) {
            return Err(StoreError::MissingReference {
                entity: "airplane type",
                id: airplane.airplane_type_id,
            });
        }
        match state.airplanes.get_mut(&airplane.id) {
            Some(stored) => {
                *stored = airplane.clone();
                Ok(())
            }
            None => Err(StoreError::MissingReference {
                entity: "airplane",
                id: airplane.id,
            }),
        }
    }

    async fn create_route(&self, route: &NewRoute) -> StoreResult<Route> {
        if route.distance < 0 {
            return Err(StoreError::InvalidField {
                field: "distance",
                value: i64::from(route.distance),
            });
        }
        let mut state = self.state.write().await;
        for id in [route.source_id, route.destination_id] {
            if !state.airports.contains_key(&id) {
                return Err(StoreError::MissingReference { entity: "airport", id });
            }
        }
        let created = Route {
            id: state.next_id(),
            source_id: route.source_id,
            destination_id: route.destination_id,
            distance: route.distance,
        };
        state.routes.insert(created.id, created.clone());
        Ok(created)
    }

    async fn create_crew(&self, crew: &NewCrew) -> StoreResult<Crew> {
        let mut state = self.state.write().await;
        let created = Crew {
            id: state.next_id(),
            first_name: crew.first_name.clone(),
            last_name: crew.last_name.clone(),
        };
        state.crews.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl FlightRepository for MemoryStore {
    async fn create_flight(&self, flight: &NewFlight) -> StoreResult<Flight> {
        let mut state = self.state.write().await;
        if !state.routes.contains_key(&flight.route_id) {
            return Err(StoreError::MissingReference {
                entity: "route",
                id: flight.route_id,
            });
        }
        if !state.airplanes.contains_key(&flight.airplane_id) {
            return Err(StoreError::MissingReference {
                entity: "airplane",
                id: flight.airplane_id,
            });
        }
        if let Some(&id) = flight.crew.iter().find(|id| !state.crews.contains_key(id)) {
            return Err(StoreError::MissingReference { entity: "crew", id });
        }

        let mut crew = flight.crew.clone();
        crew.sort_unstable();
        crew.dedup();

        let created = Flight {
            id: state.next_id(),
            route_id: flight.route_id,
            airplane_id: flight.airplane_id,
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            crew,
        };
        state.flights.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_flight(&self, id: i64) -> StoreResult<Option<FlightRecord>> {
        let state = self.state.read().await;
        state.flights.get(&id).map(|f| state.record(f)).transpose()
    }

    async fn get_flight_seats(&self, id: i64) -> StoreResult<Option<FlightSeats>> {
        let state = self.state.read().await;
        let Some(flight) = state.flights.get(&id) else {
            return Ok(None);
        };
        Ok(Some(FlightSeats {
            flight: state.record(flight)?,
            taken: state.taken(id),
        }))
    }

    async fn list_flights(&self) -> StoreResult<Vec<FlightListing>> {
        let state = self.state.read().await;

        let mut issued: HashMap<i64, i64> = HashMap::new();
        for ticket in state.tickets.values() {
            *issued.entry(ticket.flight_id).or_default() += 1;
        }

        state
            .flights
            .values()
            .map(|flight| {
                Ok(FlightListing {
                    flight: state.record(flight)?,
                    issued_tickets: issued.get(&flight.id).copied().unwrap_or(0),
                })
            })
            .collect()
    }

    async fn taken_seats(&self, flight_id: i64) -> StoreResult<Vec<Seat>> {
        Ok(self.state.read().await.taken(flight_id))
    }

    async fn delete_flight(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.flights.remove(&id).is_none() {
            return Ok(false);
        }
        let doomed: Vec<i64> = state
            .tickets
            .values()
            .filter(|t| t.flight_id == id)
            .map(|t| t.id)
            .collect();
        for ticket_id in doomed {
            state.remove_ticket(ticket_id);
        }
        Ok(true)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert_order(&self, owner: &str, tickets: &[TicketSpec]) -> StoreResult<Order> {
        let mut state = self.state.write().await;

        // Validate the whole batch before touching anything.
        let mut batch = HashSet::with_capacity(tickets.len());
        for spec in tickets {
            if !state.flights.contains_key(&spec.flight_id) {
                return Err(StoreError::MissingFlight(spec.flight_id));
            }
            let key = seat_key(spec);
            if state.seats.contains_key(&key) || !batch.insert(key) {
                return Err(seat_taken(spec));
            }
        }

        let order_id = state.next_id();
        let created_at = Utc::now();
        state.orders.insert(
            order_id,
            OrderEntry {
                created_at,
                owner: owner.to_string(),
            },
        );

        let mut issued = Vec::with_capacity(tickets.len());
        for spec in tickets {
            let ticket = Ticket {
                id: state.next_id(),
                row: spec.row,
                seat: spec.seat,
                flight_id: spec.flight_id,
                order_id,
            };
            state.seats.insert(seat_key(spec), ticket.id);
            state.tickets.insert(ticket.id, ticket.clone());
            issued.push(ticket);
        }

        Ok(Order {
            id: order_id,
            created_at,
            owner: owner.to_string(),
            tickets: issued,
        })
    }

    async fn list_orders(&self, owner: &str) -> StoreResult<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|(_, entry)| entry.owner == owner)
            .map(|(&id, entry)| state.order(id, entry))
            .collect();
        orders.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(orders)
    }

    async fn delete_order(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.orders.remove(&id).is_none() {
            return Ok(false);
        }
        let doomed: Vec<i64> = state
            .tickets
            .values()
            .filter(|t| t.order_id == id)
            .map(|t| t.id)
            .collect();
        for ticket_id in doomed {
            state.remove_ticket(ticket_id);
        }
        Ok(true)
    }

    async fn get_ticket(&self, id: i64) -> StoreResult<Option<Ticket>> {
        Ok(self.state.read().await.tickets.get(&id).cloned())
    }

    async fn insert_ticket(&self, order_id: i64, spec: &TicketSpec) -> StoreResult<Ticket> {
        let mut state = self.state.write().await;
        if !state.orders.contains_key(&order_id) {
            return Err(StoreError::MissingOrder(order_id));
        }
        if !state.flights.contains_key(&spec.flight_id) {
            return Err(StoreError::MissingFlight(spec.flight_id));
        }
        if state.seats.contains_key(&seat_key(spec)) {
            return Err(seat_taken(spec));
        }

        let ticket = Ticket {
            id: state.next_id(),
            row: spec.row,
            seat: spec.seat,
            flight_id: spec.flight_id,
            order_id,
        };
        state.seats.insert(seat_key(spec), ticket.id);
        state.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn update_ticket(&self, id: i64, spec: &TicketSpec) -> StoreResult<Ticket> {
        let mut state = self.state.write().await;
        let Some(current) = state.tickets.get(&id).cloned() else {
            return Err(StoreError::MissingTicket(id));
        };
        if !state.flights.contains_key(&spec.flight_id) {
            return Err(StoreError::MissingFlight(spec.flight_id));
        }
        match state.seats.get(&seat_key(spec)) {
            Some(&holder) if holder != id => return Err(seat_taken(spec)),
            _ => {}
        }

        state.seats.remove(&(current.flight_id, current.row, current.seat));
        let updated = Ticket {
            row: spec.row,
            seat: spec.seat,
            flight_id: spec.flight_id,
            ..current
        };
        state.seats.insert(seat_key(spec), id);
        state.tickets.insert(id, updated.clone());
        Ok(updated)
    }
}
