//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and logout.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use doodle_notes_core::{PortError, User};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;
use crate::web::middleware::{session_id_from_headers, SESSION_COOKIE};
use crate::web::state::AppState;
use crate::web::users::UserResponse;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

//=========================================================================================
// Session Cookies
//=========================================================================================

fn session_cookie(session_id: &str, config: &Config) -> String {
    let secure = if config.cookie_secure { " Secure;" } else { "" };
    format!(
        "{}={}; HttpOnly;{} SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        session_id,
        secure,
        Duration::days(config.session_ttl_days).num_seconds()
    )
}

fn cleared_session_cookie(config: &Config) -> String {
    let secure = if config.cookie_secure { " Secure;" } else { "" };
    format!("{}=; HttpOnly;{} SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE, secure)
}

/// Opens a login session for `user` and returns the `Set-Cookie` value.
async fn open_session(state: &AppState, user: &User) -> Result<String, ApiError> {
    let auth_session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(state.config.session_ttl_days);

    state
        .auth
        .create_auth_session(&auth_session_id, user.user_id, expires_at)
        .await?;

    Ok(session_cookie(&auth_session_id, &state.config))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /users/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/users/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Missing parameters"),
        (status = 409, description = "Username or email already taken"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim();
    let email = req.email.trim();
    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("Parameters missing".to_string()));
    }

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })?
        .to_string();

    // 2. Create user in database
    let user = state
        .auth
        .create_user(username, email, &password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => {
                ApiError::Conflict("Username or email already taken".to_string())
            }
            other => other.into(),
        })?;
    info!("User {} signed up", user.user_id);

    // 3. Log the new user in
    let cookie = open_session(&state, &user).await?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(UserResponse::from(user)),
    ))
}

/// POST /users/login - Login with existing account
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = UserResponse),
        (status = 400, description = "Missing parameters"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("Parameters missing".to_string()));
    }

    // 1. Get user by username
    let user_creds = state
        .auth
        .get_credentials_by_username(username)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => ApiError::Unauthorized("Invalid credentials".to_string()),
            other => other.into(),
        })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    // 3. Create auth session
    let cookie = open_session(&state, &user_creds.user).await?;
    info!("User {} logged in", user_creds.user.user_id);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(UserResponse::from(user_creds.user)),
    ))
}

/// POST /users/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/users/logout",
    responses(
        (status = 200, description = "Logout successful")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(auth_session_id) = session_id_from_headers(&headers) {
        state.auth.delete_auth_session(auth_session_id).await?;
    }

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cleared_session_cookie(&state.config))],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_respects_secure_flag_and_ttl() {
        let mut config = Config::in_memory();
        config.session_ttl_days = 1;
        assert_eq!(
            session_cookie("abc", &config),
            "session=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=86400"
        );

        config.cookie_secure = true;
        assert!(session_cookie("abc", &config).contains("HttpOnly; Secure;"));
        assert!(cleared_session_cookie(&config).contains("Max-Age=0"));
    }
}
