use std::sync::Arc;

use airport_core::{BookingEngine, BookingStore};
use airport_store::app_config::RateLimitConfig;
use airport_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: BookingEngine,
    /// Reference data writes bypass the engine.
    pub store: Arc<dyn BookingStore>,
    /// Rate limiting is skipped entirely when no Redis is configured.
    pub redis: Option<Arc<RedisClient>>,
    pub rate_limit: RateLimitConfig,
    pub auth: AuthConfig,
}
