use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection string. Without one the in-memory store is used.
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_window")]
    pub requests_per_window: i64,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: default_requests_per_window(),
            window_seconds: default_window_seconds(),
        }
    }
}

fn default_requests_per_window() -> i64 { 100 }
fn default_window_seconds() -> i64 { 60 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Layers `default`, `{RUN_MODE}` and `local` files from `dir`, then `AIRPORT__*` env vars.
    pub fn load_from(dir: &str) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name(&format!("{}/default", dir)))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("{}/{}", dir, run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name(&format!("{}/local", dir)).required(false))
            // Eg.. `AIRPORT__SERVER__PORT=9000`
            .add_source(config::Environment::with_prefix("AIRPORT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
