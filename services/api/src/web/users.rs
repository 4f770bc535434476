//! services/api/src/web/users.rs
//!
//! Read-only user endpoints.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use doodle_notes_core::{Identity, PortError, User};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;

/// A user as shown to clients. Never carries the password hash.
#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

async fn fetch_user(state: &AppState, user_id: Uuid) -> Result<UserResponse, ApiError> {
    let user = state.users.get_user_by_id(user_id).await.map_err(|e| match e {
        PortError::NotFound(_) => ApiError::NotFound("User not found".to_string()),
        other => other.into(),
    })?;
    Ok(user.into())
}

/// GET /users - The user behind the current session
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "User not authenticated")
    )
)]
pub async fn get_authenticated_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = identity
        .user_id()
        .ok_or_else(|| ApiError::Unauthorized("User not authenticated".to_string()))?;
    Ok(Json(fetch_user(&state, user_id).await?))
}

/// GET /users/{user_id} - A user by id
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(
        ("user_id" = String, Path, description = "The user's id.")
    ),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 400, description = "Invalid user id"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = Uuid::parse_str(&user_id)
        .map_err(|_| ApiError::BadRequest("Invalid user id".to_string()))?;
    Ok(Json(fetch_user(&state, user_id).await?))
}
