use tracing::debug;

/// INCR the window counter; only the hit that opens a window sets its expiry,
/// so later hits never push the reset back.
const FIXED_WINDOW_SCRIPT: &str = r#"
    local count = redis.call("INCR", KEYS[1])
    if count == 1 then
        redis.call("EXPIRE", KEYS[1], ARGV[1])
    end
    return count
"#;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
    window_script: redis::Script,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self {
            client,
            window_script: redis::Script::new(FIXED_WINDOW_SCRIPT),
        })
    }

    /// Fixed-window counter. Returns false once `key` has been hit more than `limit`
    /// times within the window opened by its first hit.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> redis::RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let count: i64 = self
            .window_script
            .key(key)
            .arg(window_seconds)
            .invoke_async(&mut conn)
            .await?;

        if count > limit {
            debug!("Rate limit exceeded for {}: {}/{}", key, count, limit);
        }
        Ok(count <= limit)
    }
}
