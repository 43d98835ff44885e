use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::availability::{FlightAvailability, FlightDetail};
use crate::guard::check_ticket;
use crate::models::{sort_tickets, FlightRecord, FlightSeats, Order, Seat, Ticket, TicketSpec};
use crate::repository::BookingStore;
use crate::{OrderError, OrderResult};

/// Entry point for booking: order creation, direct ticket writes and availability reads.
#[derive(Clone)]
pub struct BookingEngine {
    store: Arc<dyn BookingStore>,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    // ========================================================================
    // Orders
    // ========================================================================

    /// Validates every ticket spec, then persists the order and its tickets atomically.
    ///
    /// Nothing is written unless every spec passes. The store's uniqueness constraint has
    /// the final word, so a seat grabbed by a concurrent order between the pre-check and
    /// the insert still comes back as [`OrderError::SeatAlreadyTaken`].
    pub async fn create_order(&self, owner: &str, specs: &[TicketSpec]) -> OrderResult<Order> {
        if specs.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        // 1. Resolve flights and check seat bounds
        let mut flights: HashMap<i64, FlightRecord> = HashMap::new();
        for spec in specs {
            let flight = match flights.entry(spec.flight_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(self.resolve_flight(spec.flight_id).await?),
            };
            check_ticket(spec, &flight.airplane)?;
        }

        // 2. Duplicates inside the request
        let mut requested = HashSet::with_capacity(specs.len());
        for spec in specs {
            if !requested.insert(*spec) {
                warn!(
                    "Order for {} repeats seat {}-{} on flight {}",
                    owner, spec.row, spec.seat, spec.flight_id
                );
                return Err(seat_taken(spec));
            }
        }

        // 3. Seats already sold
        let mut taken: HashMap<i64, HashSet<Seat>> = HashMap::with_capacity(flights.len());
        for flight_id in flights.keys() {
            let seats = self.store.taken_seats(*flight_id).await?;
            taken.insert(*flight_id, seats.into_iter().collect());
        }
        if let Some(spec) = specs.iter().find(|spec| {
            taken
                .get(&spec.flight_id)
                .is_some_and(|seats| seats.contains(&spec.seat()))
        }) {
            warn!(
                "Seat {}-{} on flight {} is already taken",
                spec.row, spec.seat, spec.flight_id
            );
            return Err(seat_taken(spec));
        }

        // 4. Atomic insert
        let mut order = self.store.insert_order(owner, specs).await.map_err(|e| {
            let err = OrderError::from(e);
            if let OrderError::SeatAlreadyTaken { flight_id, row, seat } = &err {
                warn!("Lost race for seat {}-{} on flight {}", row, seat, flight_id);
            }
            err
        })?;
        sort_tickets(&mut order.tickets);

        info!(
            "Order {} created for {} with {} ticket(s)",
            order.id,
            owner,
            order.tickets.len()
        );
        Ok(order)
    }

    pub async fn list_orders(&self, owner: &str) -> OrderResult<Vec<Order>> {
        let mut orders = self.store.list_orders(owner).await?;
        for order in &mut orders {
            sort_tickets(&mut order.tickets);
        }
        Ok(orders)
    }

    pub async fn delete_order(&self, id: i64) -> OrderResult<()> {
        if self.store.delete_order(id).await? {
            info!("Order {} deleted", id);
            Ok(())
        } else {
            Err(OrderError::OrderNotFound(id))
        }
    }

    // ========================================================================
    // Direct ticket writes
    // ========================================================================

    /// Adds one ticket to an existing order, through the same seat checks as order creation.
    pub async fn create_ticket(&self, order_id: i64, spec: &TicketSpec) -> OrderResult<Ticket> {
        let flight = self.resolve_flight(spec.flight_id).await?;
        check_ticket(spec, &flight.airplane)?;
        self.ensure_seat_free(spec).await?;

        let ticket = self.store.insert_ticket(order_id, spec).await?;
        info!(
            "Ticket {} issued on flight {} ({}-{}) for order {}",
            ticket.id, ticket.flight_id, ticket.row, ticket.seat, order_id
        );
        Ok(ticket)
    }

    /// Moves a ticket to another seat or flight, through the same seat checks as order creation.
    pub async fn update_ticket(&self, id: i64, spec: &TicketSpec) -> OrderResult<Ticket> {
        let current = self
            .store
            .get_ticket(id)
            .await?
            .ok_or(OrderError::TicketNotFound(id))?;

        let flight = self.resolve_flight(spec.flight_id).await?;
        check_ticket(spec, &flight.airplane)?;
        if current.spec() != *spec {
            self.ensure_seat_free(spec).await?;
        }

        let ticket = self.store.update_ticket(id, spec).await?;
        info!(
            "Ticket {} moved to flight {} ({}-{})",
            ticket.id, ticket.flight_id, ticket.row, ticket.seat
        );
        Ok(ticket)
    }

    // ========================================================================
    // Flights
    // ========================================================================

    /// Every flight with its seats left, counted fresh on every call.
    pub async fn list_flights(&self) -> OrderResult<Vec<FlightAvailability>> {
        let listings = self.store.list_flights().await?;
        Ok(listings.into_iter().map(FlightAvailability::from).collect())
    }

    pub async fn flight_detail(&self, id: i64) -> OrderResult<Option<FlightDetail>> {
        let detail = self.store.get_flight_seats(id).await?;
        Ok(detail.map(|FlightSeats { flight, taken }| FlightDetail::new(flight, taken)))
    }

    pub async fn delete_flight(&self, id: i64) -> OrderResult<()> {
        if self.store.delete_flight(id).await? {
            info!("Flight {} deleted with its tickets", id);
            Ok(())
        } else {
            Err(OrderError::FlightNotFound(id))
        }
    }

    async fn resolve_flight(&self, id: i64) -> OrderResult<FlightRecord> {
        self.store
            .get_flight(id)
            .await?
            .ok_or(OrderError::FlightNotFound(id))
    }

    async fn ensure_seat_free(&self, spec: &TicketSpec) -> OrderResult<()> {
        let taken = self.store.taken_seats(spec.flight_id).await?;
        if taken.contains(&spec.seat()) {
            return Err(seat_taken(spec));
        }
        Ok(())
    }
}

fn seat_taken(spec: &TicketSpec) -> OrderError {
    OrderError::SeatAlreadyTaken {
        flight_id: spec.flight_id,
        row: spec.row,
        seat: spec.seat,
    }
}
