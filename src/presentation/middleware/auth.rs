//! Authentication Middleware
//!
//! JWT validation middleware for protected REST routes. A missing
//! credential is 401; a credential that fails validation is 403.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::application::services::TokenError;
use crate::domain::Role;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated user extension
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: Role,
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".into()))?;

    let claims = state.token_service.validate(token).map_err(|e| match e {
        TokenError::Expired => AppError::Forbidden("Token expired".into()),
        _ => AppError::Forbidden("Invalid token".into()),
    })?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        role: claims.role,
    });

    Ok(next.run(request).await)
}
