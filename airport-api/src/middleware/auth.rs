use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Order owner id.
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

/// Token issuing. The API only verifies tokens; these exist for operator
/// tooling that mints them and for tests.
impl Claims {
    pub fn new(sub: impl Into<String>, role: Role, ttl: Duration) -> Self {
        Self {
            sub: sub.into(),
            role,
            exp: (Utc::now() + ttl).timestamp() as usize,
        }
    }

    /// HS256 with the same secret `require_user` verifies against.
    pub fn sign(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::default(), self, &EncodingKey::from_secret(secret.as_bytes()))
    }
}

fn authenticate(state: &AppState, req: &Request) -> Result<Claims, AppError> {
    // 1. Extract token from Authorization header
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    // 2. Decode and validate JWT
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        AppError::AuthenticationError("Invalid token".to_string())
    })?;

    Ok(token_data.claims)
}

// ============================================================================
// Authentication Middleware
// ============================================================================

/// Any valid token. Claims are injected into request extensions.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &req)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// A valid token carrying the ADMIN role.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &req)?;
    if claims.role != Role::Admin {
        return Err(AppError::AuthorizationError("Admin role required".to_string()));
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
