//! Registration, login and account preference routes

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::NewUser,
    state::AppState,
    validation,
};

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

/// Response carrying a freshly issued token
#[derive(Serialize)]
pub struct TokenResponse {
    pub user_id: Uuid,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub message: String,
}

/// Request for changing the lending duration preference
#[derive(Deserialize)]
pub struct ChangeDurationRequest {
    pub duration: i32,
}

/// Register a new member and authenticate them in the same step.
///
/// Email uniqueness is checked before username; a taken email steers the
/// caller towards login while a taken username asks for another one.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_required(&payload.first_name, "First name")
        .map_err(ApiError::Validation)?;
    validation::validate_required(&payload.last_name, "Last name").map_err(ApiError::Validation)?;
    validation::validate_email(&payload.email).map_err(ApiError::Validation)?;
    validation::validate_username(&payload.username).map_err(ApiError::Validation)?;
    validation::validate_password(&payload.password, &payload.confirm_password)
        .map_err(ApiError::Validation)?;

    let existing_email = state
        .user_repository
        .find_by_email(&payload.email)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up email: {}", e);
            ApiError::InternalServerError
        })?;
    if existing_email.is_some() {
        warn!("Registration rejected, email already exists");
        return Err(ApiError::Conflict(
            "This email address already exists. Try to login instead.".to_string(),
        ));
    }

    let existing_username = state
        .user_repository
        .find_by_username(&payload.username)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up username: {}", e);
            ApiError::InternalServerError
        })?;
    if existing_username.is_some() {
        warn!(
            "Registration rejected, username {} already exists",
            payload.username
        );
        return Err(ApiError::Conflict("This username already exists.".to_string()));
    }

    let new_user = NewUser {
        first_name: validation::title_case(payload.first_name.trim()),
        last_name: validation::title_case(payload.last_name.trim()),
        email: payload.email,
        username: payload.username,
        password: payload.password,
    };

    let user = state.user_repository.create(&new_user).await.map_err(|e| {
        tracing::error!("Failed to create user: {}", e);
        ApiError::InternalServerError
    })?;

    info!("Created new user {} ({})", user.username, user.id);

    let access_token = state.jwt_service.generate_token(&user, false).map_err(|e| {
        tracing::error!("Failed to generate token: {}", e);
        ApiError::InternalServerError
    })?;

    let response = TokenResponse {
        user_id: user.id,
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.token_expiry(false),
        message: "Your account has been created successfully.".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Log a member in, issuing a bearer token.
///
/// Unknown username and wrong password are reported with distinct
/// messages.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Login attempt for user: {}", payload.username);

    let user = state
        .user_repository
        .find_by_username(&payload.username)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up user: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::InvalidCredentials(
            "Invalid Username. Please try again",
        ))?;

    let password_ok = state
        .user_repository
        .verify_password(&user, &payload.password)
        .await
        .map_err(|e| {
            tracing::error!("Failed to verify password: {}", e);
            ApiError::InternalServerError
        })?;

    if !password_ok {
        info!("Wrong password for username: {}", payload.username);
        return Err(ApiError::InvalidCredentials(
            "Invalid password. Please try again",
        ));
    }

    let access_token = state
        .jwt_service
        .generate_token(&user, payload.remember)
        .map_err(|e| {
            tracing::error!("Failed to generate token: {}", e);
            ApiError::InternalServerError
        })?;

    info!("User {} ({}) logged in", user.username, user.id);

    let response = TokenResponse {
        user_id: user.id,
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.token_expiry(payload.remember),
        message: format!("Logged in successfully as {}.", user.first_name),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Log the current member out.
///
/// Tokens are stateless, so this acknowledges and lets the client drop the
/// token; it expires on its own.
pub async fn logout(Extension(user): Extension<AuthUser>) -> ApiResult<impl IntoResponse> {
    info!("User {} ({}) logged out", user.username, user.id);

    Ok(Json(json!({
        "message": "You have been logged out. Hopefully we'll see you soon."
    })))
}

/// Change a member's lending duration preference.
///
/// Members may only change their own preference. A running loan keeps the
/// due date computed when it was handed over.
pub async fn change_duration(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ChangeDurationRequest>,
) -> ApiResult<impl IntoResponse> {
    if actor.id != user_id {
        warn!(
            "Unauthorized user {} tried to change lending duration for user {}",
            actor.id, user_id
        );
        return Err(ApiError::Unauthorized);
    }

    validation::validate_duration(payload.duration).map_err(|msg| {
        warn!(
            "User {} submitted invalid duration: {}",
            actor.id, payload.duration
        );
        ApiError::Validation(msg)
    })?;

    let user = state
        .user_repository
        .update_duration(user_id, payload.duration)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update duration: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!("User {} changed lending duration to {}", user.id, user.duration);

    Ok(Json(json!({
        "message": "You have successfully changed lending duration",
        "duration": user.duration,
    })))
}
