use axum::{
    http::Method,
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod catalog;
pub mod error;
pub mod flights;
pub mod middleware;
pub mod orders;
pub mod state;

pub use state::AppState;

use crate::middleware::{rate_limit_middleware, require_admin, require_user};

/// Builds the full route table: public, authenticated and admin groups.
pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let public = Router::new()
        .route("/health", get(health))
        .merge(flights::routes());

    let authenticated = orders::routes()
        .route_layer(from_fn_with_state(state.clone(), require_user));

    let admin = admin::routes()
        .merge(catalog::routes())
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let mut router = Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    if state.redis.is_some() {
        router = router.layer(from_fn_with_state(state.clone(), rate_limit_middleware));
    }

    router.with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
