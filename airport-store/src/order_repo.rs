use std::collections::HashMap;

use airport_core::models::{Order, Ticket, TicketSpec};
use airport_core::repository::OrderRepository;
use airport_core::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::{backend, ticket_write_error, PgStore};

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    created_at: DateTime<Utc>,
    owner: String,
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: i64,
    row: i32,
    seat: i32,
    flight_id: i64,
    order_id: i64,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Self {
            id: row.id,
            row: row.row,
            seat: row.seat,
            flight_id: row.flight_id,
            order_id: row.order_id,
        }
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn insert_order(&self, owner: &str, tickets: &[TicketSpec]) -> StoreResult<Order> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let order = sqlx::query_as::<_, OrderRow>(
            "INSERT INTO orders (owner) VALUES ($1) RETURNING id, created_at, owner",
        )
        .bind(owner)
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;

        let mut issued = Vec::with_capacity(tickets.len());
        for spec in tickets {
            // A concurrent order holding the same seat blocks here until it commits,
            // then this insert fails on tickets_flight_row_seat_key.
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO tickets ("row", seat, flight_id, order_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(spec.row)
            .bind(spec.seat)
            .bind(spec.flight_id)
            .bind(order.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| ticket_write_error(e, spec, None))?;

            issued.push(Ticket {
                id,
                row: spec.row,
                seat: spec.seat,
                flight_id: spec.flight_id,
                order_id: order.id,
            });
        }

        tx.commit().await.map_err(backend)?;

        Ok(Order {
            id: order.id,
            created_at: order.created_at,
            owner: order.owner,
            tickets: issued,
        })
    }

    async fn list_orders(&self, owner: &str) -> StoreResult<Vec<Order>> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, created_at, owner FROM orders WHERE owner = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let ticket_rows = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT id, "row", seat, flight_id, order_id
            FROM tickets
            WHERE order_id = ANY($1)
            ORDER BY "row", seat, id
            "#,
        )
        .bind(ids.as_slice())
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        let mut tickets: HashMap<i64, Vec<Ticket>> = HashMap::new();
        for row in ticket_rows {
            tickets.entry(row.order_id).or_default().push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| Order {
                tickets: tickets.remove(&row.id).unwrap_or_default(),
                id: row.id,
                created_at: row.created_at,
                owner: row.owner,
            })
            .collect())
    }

    async fn delete_order(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_ticket(&self, id: i64) -> StoreResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"SELECT id, "row", seat, flight_id, order_id FROM tickets WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(Ticket::from))
    }

    async fn insert_ticket(&self, order_id: i64, spec: &TicketSpec) -> StoreResult<Ticket> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tickets ("row", seat, flight_id, order_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(spec.row)
        .bind(spec.seat)
        .bind(spec.flight_id)
        .bind(order_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ticket_write_error(e, spec, Some(order_id)))?;

        Ok(Ticket {
            id,
            row: spec.row,
            seat: spec.seat,
            flight_id: spec.flight_id,
            order_id,
        })
    }

    async fn update_ticket(&self, id: i64, spec: &TicketSpec) -> StoreResult<Ticket> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            UPDATE tickets SET "row" = $1, seat = $2, flight_id = $3
            WHERE id = $4
            RETURNING id, "row", seat, flight_id, order_id
            "#,
        )
        .bind(spec.row)
        .bind(spec.seat)
        .bind(spec.flight_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ticket_write_error(e, spec, None))?;

        row.map(Ticket::from).ok_or(StoreError::MissingTicket(id))
    }
}
