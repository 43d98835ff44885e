use airport_core::models::{
    Airplane, AirplaneType, Airport, Crew, NewAirplane, NewAirport, NewCrew, NewRoute, Route,
};
use airport_core::repository::CatalogRepository;
use airport_core::{check_grid, StoreError, StoreResult};
use async_trait::async_trait;

use crate::database::{backend, constraint_error, PgStore};

#[derive(sqlx::FromRow)]
struct AirplaneRow {
    id: i64,
    name: String,
    rows: i32,
    seats_in_row: i32,
    airplane_type_id: i64,
}

impl From<AirplaneRow> for Airplane {
    fn from(row: AirplaneRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            rows: row.rows,
            seats_in_row: row.seats_in_row,
            airplane_type_id: row.airplane_type_id,
        }
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn create_airport(&self, airport: &NewAirport) -> StoreResult<Airport> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO airports (name, closest_big_city) VALUES ($1, $2) RETURNING id",
        )
        .bind(&airport.name)
        .bind(&airport.closest_big_city)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(Airport {
            id,
            name: airport.name.clone(),
            closest_big_city: airport.closest_big_city.clone(),
        })
    }

    async fn create_airplane_type(&self, name: &str) -> StoreResult<AirplaneType> {
        let id: i64 = sqlx::query_scalar("INSERT INTO airplane_types (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;

        Ok(AirplaneType {
            id,
            name: name.to_string(),
        })
    }

    async fn create_airplane(&self, airplane: &NewAirplane) -> StoreResult<Airplane> {
        check_grid(airplane)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO airplanes (name, "rows", seats_in_row, airplane_type_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&airplane.name)
        .bind(airplane.rows)
        .bind(airplane.seats_in_row)
        .bind(airplane.airplane_type_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            constraint_error(
                e,
                &[
                    ("airplanes_airplane_type_id_fkey", "airplane type", airplane.airplane_type_id),
                    ("airplanes_rows_check", "rows", i64::from(airplane.rows)),
                    ("airplanes_seats_in_row_check", "seats_in_row", i64::from(airplane.seats_in_row)),
                ],
            )
        })?;

        Ok(Airplane {
            id,
            name: airplane.name.clone(),
            rows: airplane.rows,
            seats_in_row: airplane.seats_in_row,
            airplane_type_id: airplane.airplane_type_id,
        })
    }

    async fn get_airplane(&self, id: i64) -> StoreResult<Option<Airplane>> {
        let row = sqlx::query_as::<_, AirplaneRow>(
            r#"SELECT id, name, "rows", seats_in_row, airplane_type_id FROM airplanes WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(Airplane::from))
    }

    async fn update_airplane(&self, airplane: &Airplane) -> StoreResult<()> {
        check_grid(airplane)?;

        let result = sqlx::query(
            r#"
            UPDATE airplanes SET name = $1, "rows" = $2, seats_in_row = $3, airplane_type_id = $4
            WHERE id = $5
            "#,
        )
        .bind(&airplane.name)
        .bind(airplane.rows)
        .bind(airplane.seats_in_row)
        .bind(airplane.airplane_type_id)
        .bind(airplane.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            constraint_error(
                e,
                &[
                    ("airplanes_airplane_type_id_fkey", "airplane type", airplane.airplane_type_id),
                    ("airplanes_rows_check", "rows", i64::from(airplane.rows)),
                    ("airplanes_seats_in_row_check", "seats_in_row", i64::from(airplane.seats_in_row)),
                ],
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingReference {
                entity: "airplane",
                id: airplane.id,
            });
        }
        Ok(())
    }

    async fn create_route(&self, route: &NewRoute) -> StoreResult<Route> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO routes (source_id, destination_id, distance) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(route.source_id)
        .bind(route.destination_id)
        .bind(route.distance)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            constraint_error(
                e,
                &[
                    ("routes_source_id_fkey", "airport", route.source_id),
                    ("routes_destination_id_fkey", "airport", route.destination_id),
                    ("routes_distance_check", "distance", i64::from(route.distance)),
                ],
            )
        })?;

        Ok(Route {
            id,
            source_id: route.source_id,
            destination_id: route.destination_id,
            distance: route.distance,
        })
    }

    async fn create_crew(&self, crew: &NewCrew) -> StoreResult<Crew> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO crews (first_name, last_name) VALUES ($1, $2) RETURNING id",
        )
        .bind(&crew.first_name)
        .bind(&crew.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(Crew {
            id,
            first_name: crew.first_name.clone(),
            last_name: crew.last_name.clone(),
        })
    }
}
