//! Router for admin authentication

use std::sync::{Arc, RwLock};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use chrono::{Duration, Utc};
use tokio_rusqlite::Connection;

use super::db::{self, SessionStatus};
use super::public::{
    ChangePasswordRequest, CredentialsRequest, LoginResponse, SuccessResponse, TokenRequest,
    VerifyResponse,
};
use crate::api::public::{ApiError, JsonBody};
use crate::api::state::AppState;
use crate::core::auth::{MIN_PASSWORD_LEN, generate_session_token, hash_password, verify_password};

type SharedState = Arc<RwLock<AppState>>;

// Blank values are treated the same as missing ones
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn check_password_len(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(&format!(
            "New password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn shared_db(state: &SharedState) -> Connection {
    state.read().expect("Unable to read shared state").db.clone()
}

/// Create the first admin account. Refused once any admin exists.
async fn setup(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<CredentialsRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let db = shared_db(&state);

    if db::admin_user_exists(&db).await? {
        return Err(ApiError::bad_request("Admin user already exists"));
    }

    let (Some(username), Some(password)) = (present(&payload.username), present(&payload.password))
    else {
        return Err(ApiError::bad_request("Username and password are required"));
    };
    check_password_len(password)?;

    db::insert_admin_user(&db, username, &hash_password(password)).await?;
    tracing::info!("Created admin user {}", username);

    Ok(Json(SuccessResponse::new(Some("Admin user created"))))
}

/// Exchange credentials for a session token
async fn login(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(username), Some(password)) = (present(&payload.username), present(&payload.password))
    else {
        return Err(ApiError::bad_request("Username and password are required"));
    };

    let (db, ttl_hours) = {
        let shared_state = state.read().expect("Unable to read shared state");
        (
            shared_state.db.clone(),
            shared_state.config.session_ttl_hours,
        )
    };

    let Some(user) = db::find_admin_user_by_username(&db, username).await? else {
        tracing::info!("User not found: {}", username);
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    if !verify_password(password, &user.password_hash) {
        tracing::info!("Invalid password for user: {}", username);
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let Some(expires_at) =
        Duration::try_hours(ttl_hours).and_then(|ttl| Utc::now().checked_add_signed(ttl))
    else {
        tracing::error!("Session lifetime of {} hours is out of range", ttl_hours);
        return Err(ApiError::internal("Internal server error"));
    };
    let token = generate_session_token();
    db::replace_sessions(&db, user.id, &token, expires_at).await?;

    Ok(Json(LoginResponse {
        success: true,
        token,
        expires_at,
        username: user.username,
    }))
}

/// Report whether a session token is still valid. Never fails for a
/// bad token, it is simply not valid.
async fn verify(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<TokenRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Some(token) = present(&payload.token) else {
        return Ok(Json(VerifyResponse::invalid()));
    };

    let db = shared_db(&state);
    match db::verify_session(&db, token, Utc::now()).await? {
        SessionStatus::Valid(session) => Ok(Json(VerifyResponse {
            valid: true,
            username: Some(session.username),
        })),
        SessionStatus::Expired | SessionStatus::Missing => Ok(Json(VerifyResponse::invalid())),
    }
}

async fn logout(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<TokenRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if let Some(token) = present(&payload.token) {
        let db = shared_db(&state);
        db::delete_session_by_token(&db, token).await?;
    }
    Ok(Json(SuccessResponse::new(None)))
}

async fn change_password(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<ChangePasswordRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (Some(token), Some(current_password), Some(new_password)) = (
        present(&payload.token),
        present(&payload.current_password),
        present(&payload.new_password),
    ) else {
        return Err(ApiError::bad_request(
            "Token, current password, and new password are required",
        ));
    };
    check_password_len(new_password)?;

    let db = shared_db(&state);
    let session = match db::verify_session(&db, token, Utc::now()).await? {
        SessionStatus::Valid(session) => session,
        SessionStatus::Expired => return Err(ApiError::unauthorized("Session expired")),
        SessionStatus::Missing => return Err(ApiError::unauthorized("Invalid session")),
    };

    let Some(user) = db::find_admin_user_by_id(&db, session.admin_user_id).await? else {
        return Err(ApiError::new(StatusCode::NOT_FOUND, "User not found"));
    };

    if !verify_password(current_password, &user.password_hash) {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    db::update_password_hash(&db, user.id, &hash_password(new_password)).await?;
    tracing::info!("Password changed for user {}", user.username);

    Ok(Json(SuccessResponse::new(Some(
        "Password changed successfully",
    ))))
}

/// Create the admin auth router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/setup", post(setup))
        .route("/login", post(login))
        .route("/verify", post(verify))
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
}
