//! Authentication middleware for JWT token validation
//!
//! The middleware resolves a request to an identity and makes it available
//! to the handlers as an explicit [`AuthUser`] extension; handlers never
//! consult ambient "current user" state. Anonymous requests to protected
//! routes are rejected with 401 before any handler runs.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Authenticated user information, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Extract and validate the bearer token, then thread the resolved actor
/// into the request
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        debug!("Token validation failed: {}", e);
        ApiError::Unauthorized
    })?;

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        username: claims.username,
    });

    Ok(next.run(req).await)
}
