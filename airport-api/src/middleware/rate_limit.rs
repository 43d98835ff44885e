use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::state::AppState;

/// Per-IP fixed window limit backed by Redis. Fails open if Redis is unreachable.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(redis) = state.redis.as_ref() else {
        return next.run(req).await;
    };

    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let key = format!("ratelimit:{}", ip);

    let limit = &state.rate_limit;
    match redis
        .check_rate_limit(&key, limit.requests_per_window, limit.window_seconds)
        .await
    {
        Ok(true) => next.run(req).await,
        Ok(false) => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response(),
        Err(e) => {
            tracing::warn!("Rate limiter unavailable, letting request through: {}", e);
            next.run(req).await
        }
    }
}
