use std::collections::HashMap;

use airport_core::models::{
    AirplaneSummary, Crew, Flight, FlightListing, FlightRecord, FlightSeats, NewFlight, RouteSummary,
    Seat,
};
use airport_core::repository::FlightRepository;
use airport_core::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::database::{backend, constraint_error, PgStore};

const FLIGHT_COLUMNS: &str = r#"
    f.id, f.departure_time, f.arrival_time,
    r.id AS route_id, src.closest_big_city AS source_city,
    dst.closest_big_city AS destination_city, r.distance,
    a.id AS airplane_id, a.name AS airplane_name, t.name AS airplane_type,
    a."rows", a.seats_in_row
"#;

const FLIGHT_JOINS: &str = r#"
    FROM flights f
    JOIN routes r ON f.route_id = r.id
    JOIN airports src ON r.source_id = src.id
    JOIN airports dst ON r.destination_id = dst.id
    JOIN airplanes a ON f.airplane_id = a.id
    JOIN airplane_types t ON a.airplane_type_id = t.id
"#;

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: i64,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    route_id: i64,
    source_city: String,
    destination_city: String,
    distance: i32,
    airplane_id: i64,
    airplane_name: String,
    airplane_type: String,
    rows: i32,
    seats_in_row: i32,
    #[sqlx(default)]
    issued_tickets: i64,
}

impl FlightRow {
    fn into_record(self, crew: Vec<Crew>) -> FlightRecord {
        FlightRecord {
            id: self.id,
            route: RouteSummary {
                id: self.route_id,
                source_city: self.source_city,
                destination_city: self.destination_city,
                distance: self.distance,
            },
            airplane: AirplaneSummary {
                id: self.airplane_id,
                name: self.airplane_name,
                type_name: self.airplane_type,
                rows: self.rows,
                seats_in_row: self.seats_in_row,
            },
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            crew,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CrewRow {
    flight_id: i64,
    id: i64,
    first_name: String,
    last_name: String,
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    row: i32,
    seat: i32,
}

async fn flight_row<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> StoreResult<Option<FlightRow>> {
    let sql = format!("SELECT {FLIGHT_COLUMNS} {FLIGHT_JOINS} WHERE f.id = $1");
    sqlx::query_as::<_, FlightRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(backend)
}

async fn crew_by_flight<'e, E: PgExecutor<'e>>(
    executor: E,
    flight_ids: &[i64],
) -> StoreResult<HashMap<i64, Vec<Crew>>> {
    let rows = sqlx::query_as::<_, CrewRow>(
        r#"
        SELECT fc.flight_id, c.id, c.first_name, c.last_name
        FROM flight_crews fc
        JOIN crews c ON fc.crew_id = c.id
        WHERE fc.flight_id = ANY($1)
        ORDER BY c.id
        "#,
    )
    .bind(flight_ids)
    .fetch_all(executor)
    .await
    .map_err(backend)?;

    let mut crew: HashMap<i64, Vec<Crew>> = HashMap::new();
    for row in rows {
        crew.entry(row.flight_id).or_default().push(Crew {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
        });
    }
    Ok(crew)
}

async fn seats_on<'e, E: PgExecutor<'e>>(executor: E, flight_id: i64) -> StoreResult<Vec<Seat>> {
    let rows = sqlx::query_as::<_, SeatRow>(
        r#"SELECT "row", seat FROM tickets WHERE flight_id = $1 ORDER BY "row", seat"#,
    )
    .bind(flight_id)
    .fetch_all(executor)
    .await
    .map_err(backend)?;

    Ok(rows
        .into_iter()
        .map(|r| Seat { row: r.row, seat: r.seat })
        .collect())
}

#[async_trait]
impl FlightRepository for PgStore {
    async fn create_flight(&self, flight: &NewFlight) -> StoreResult<Flight> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO flights (route_id, airplane_id, departure_time, arrival_time)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(flight.route_id)
        .bind(flight.airplane_id)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            constraint_error(
                e,
                &[
                    ("flights_route_id_fkey", "route", flight.route_id),
                    ("flights_airplane_id_fkey", "airplane", flight.airplane_id),
                ],
            )
        })?;

        for crew_id in &flight.crew {
            sqlx::query("INSERT INTO flight_crews (flight_id, crew_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(id)
                .bind(crew_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| constraint_error(e, &[("flight_crews_crew_id_fkey", "crew", *crew_id)]))?;
        }

        tx.commit().await.map_err(backend)?;

        let mut crew = flight.crew.clone();
        crew.sort_unstable();
        crew.dedup();

        Ok(Flight {
            id,
            route_id: flight.route_id,
            airplane_id: flight.airplane_id,
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            crew,
        })
    }

    async fn get_flight(&self, id: i64) -> StoreResult<Option<FlightRecord>> {
        let Some(row) = flight_row(&self.pool, id).await? else {
            return Ok(None);
        };

        let mut crew = crew_by_flight(&self.pool, &[id]).await?;
        Ok(Some(row.into_record(crew.remove(&id).unwrap_or_default())))
    }

    async fn get_flight_seats(&self, id: i64) -> StoreResult<Option<FlightSeats>> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        // All three reads see one snapshot
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        let Some(row) = flight_row(&mut *tx, id).await? else {
            return Ok(None);
        };
        let mut crew = crew_by_flight(&mut *tx, &[id]).await?;
        let taken = seats_on(&mut *tx, id).await?;

        tx.commit().await.map_err(backend)?;

        Ok(Some(FlightSeats {
            flight: row.into_record(crew.remove(&id).unwrap_or_default()),
            taken,
        }))
    }

    async fn list_flights(&self) -> StoreResult<Vec<FlightListing>> {
        // Counting in the same statement keeps availability consistent with the flight rows.
        let sql = format!(
            "SELECT {FLIGHT_COLUMNS}, \
             (SELECT COUNT(*) FROM tickets tk WHERE tk.flight_id = f.id) AS issued_tickets \
             {FLIGHT_JOINS} ORDER BY f.id"
        );
        let rows = sqlx::query_as::<_, FlightRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut crew = crew_by_flight(&self.pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let issued_tickets = row.issued_tickets;
                let flight_crew = crew.remove(&row.id).unwrap_or_default();
                FlightListing {
                    flight: row.into_record(flight_crew),
                    issued_tickets,
                }
            })
            .collect())
    }

    async fn taken_seats(&self, flight_id: i64) -> StoreResult<Vec<Seat>> {
        seats_on(&self.pool, flight_id).await
    }

    async fn delete_flight(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM flights WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }
}

