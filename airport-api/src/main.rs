use std::net::SocketAddr;
use std::sync::Arc;

use airport_api::{app, state::{AppState, AuthConfig}};
use airport_core::{BookingEngine, BookingStore};
use airport_store::{app_config::Config, DbClient, MemoryStore, PgStore, RedisClient};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "airport_api=debug,airport_store=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Airport API on port {}", config.server.port);

    // Database Connection
    let store: Arc<dyn BookingStore> = match &config.database.url {
        Some(url) => {
            let db = DbClient::new(url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Arc::new(PgStore::from(&db))
        }
        None => {
            tracing::warn!("No database.url configured, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    // Redis Connection
    let redis = match &config.redis {
        Some(redis) => Some(Arc::new(
            RedisClient::new(&redis.url)
                .await
                .context("Failed to connect to Redis")?,
        )),
        None => {
            tracing::info!("No redis.url configured, rate limiting disabled");
            None
        }
    };

    let app_state = AppState {
        engine: BookingEngine::new(store.clone()),
        store,
        redis,
        rate_limit: config.rate_limit.clone(),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
