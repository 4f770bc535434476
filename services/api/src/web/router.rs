//! services/api/src/web/router.rs
//!
//! Builds the axum router for every REST endpoint.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{Config, ConfigError};
use crate::web::{
    auth::{login_handler, logout_handler, signup_handler},
    middleware::resolve_identity,
    notes::{
        create_note_handler, delete_note_handler, get_note_handler, list_my_notes_handler,
        list_notes_handler, list_user_notes_handler, update_note_handler,
    },
    state::AppState,
    users::{get_authenticated_user_handler, get_user_handler},
};

/// All note and user routes, with the identity middleware applied to each.
pub fn router(app_state: Arc<AppState>) -> Router {
    let user_routes = Router::new()
        .route("/users", get(get_authenticated_user_handler))
        .route("/users/signup", post(signup_handler))
        .route("/users/login", post(login_handler))
        .route("/users/logout", post(logout_handler))
        .route("/users/{user_id}", get(get_user_handler));

    let note_routes = Router::new()
        .route("/notes", get(list_notes_handler).post(create_note_handler))
        .route("/notes/mine", get(list_my_notes_handler))
        .route("/notes/user/{username}", get(list_user_notes_handler))
        .route(
            "/notes/{note_id}",
            get(get_note_handler)
                .patch(update_note_handler)
                .delete(delete_note_handler),
        );

    Router::new()
        .merge(user_routes)
        .merge(note_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            resolve_identity,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// CORS for the configured browser origin, with credentials so the session cookie is sent.
pub fn cors_layer(config: &Config) -> Result<CorsLayer, ConfigError> {
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]))
}
