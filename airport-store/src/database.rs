use airport_core::models::TicketSpec;
use airport_core::StoreError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Postgres-backed entity store. Repository impls live in the `*_repo` modules.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<&DbClient> for PgStore {
    fn from(db: &DbClient) -> Self {
        Self::new(db.pool.clone())
    }
}

pub(crate) fn backend(err: sqlx::Error) -> StoreError {
    StoreError::backend(err)
}

/// Translates constraint failures on the `tickets` table into store errors.
pub(crate) fn ticket_write_error(err: sqlx::Error, spec: &TicketSpec, order_id: Option<i64>) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::SeatTaken {
                flight_id: spec.flight_id,
                row: spec.row,
                seat: spec.seat,
            };
        }
        if db_err.is_foreign_key_violation() {
            return match (db_err.constraint(), order_id) {
                (Some("tickets_order_id_fkey"), Some(id)) => StoreError::MissingOrder(id),
                _ => StoreError::MissingFlight(spec.flight_id),
            };
        }
    }
    backend(err)
}

/// Maps a foreign key or CHECK failure to the entity or field named by its constraint.
///
/// Each entry is `(constraint, name, value)`: a foreign key entry reports the missing
/// entity and id, a CHECK entry the rejected field and value.
pub(crate) fn constraint_error(err: sqlx::Error, constraints: &[(&str, &'static str, i64)]) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let entry = db_err
            .constraint()
            .and_then(|constraint| constraints.iter().find(|(name, _, _)| *name == constraint));
        if let Some((_, name, value)) = entry {
            if db_err.is_foreign_key_violation() {
                return StoreError::MissingReference { entity: *name, id: *value };
            }
            if db_err.is_check_violation() {
                return StoreError::InvalidField { field: *name, value: *value };
            }
        }
    }
    backend(err)
}
