//! Authentication Handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use validator::Validate;

use crate::application::dto::request::{LoginRequest, RegisterRequest};
use crate::application::dto::response::{RegisterResponse, TokenResponse, UserResponse};
use crate::application::services::{AuthError, AuthService, AuthServiceImpl};
use crate::infrastructure::repositories::{PgSessionRepository, PgUserRepository};
use crate::shared::error::AppError;
use crate::startup::AppState;

fn auth_service(
    state: &AppState,
) -> AuthServiceImpl<PgUserRepository, PgSessionRepository> {
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    let session_repo = Arc::new(PgSessionRepository::new(state.db.clone()));
    AuthServiceImpl::new(user_repo, session_repo, state.token_service.clone())
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = auth_service(&state)
        .register(&body.username, &body.password)
        .await
        .map_err(|e| match e {
            AuthError::UsernameExists => AppError::Conflict("Username already exists".into()),
            e => AppError::Internal(e.to_string()),
        })?;

    let response = RegisterResponse {
        user: UserResponse::from(user),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with credentials
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let outcome = auth_service(&state)
        .login(&body.username, &body.password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => {
                AppError::Unauthorized("Invalid username or password".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(TokenResponse::from(outcome)))
}

/// Current user, resolved from the bearer token
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, AppError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let user = auth_service(&state)
        .get_current_user(token)
        .await
        .map_err(|e| match e {
            AuthError::Token(_) => AppError::Forbidden("Invalid token".into()),
            AuthError::UserNotFound => AppError::NotFound("User not found".into()),
            e => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(UserResponse::from(user)))
}
