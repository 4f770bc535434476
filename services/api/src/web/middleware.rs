//! services/api/src/web/middleware.rs
//!
//! Identity middleware: turns the session cookie into an `Identity`.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use doodle_notes_core::{Identity, PortError};
use std::sync::Arc;
use tracing::{debug, error};

use crate::{error::ApiError, web::state::AppState};

/// Name of the cookie carrying the login session id.
pub const SESSION_COOKIE: &str = "session";

/// Middleware that resolves the auth session cookie to an `Identity` and
/// inserts it into the request extensions.
///
/// A missing, unknown or expired session resolves to an anonymous identity.
/// Rejecting anonymous callers is left to the handlers.
pub async fn resolve_identity(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session_id = session_id_from_headers(req.headers()).map(str::to_owned);
    let identity = match session_id {
        Some(session_id) => match state.auth.validate_auth_session(&session_id).await {
            Ok(user_id) => Identity::user(user_id),
            Err(PortError::NotFound(_)) => {
                debug!("Ignoring unknown or expired session cookie");
                Identity::anonymous()
            }
            Err(e) => {
                error!("Failed to validate auth session: {:?}", e);
                return Err(e.into());
            }
        },
        None => Identity::anonymous(),
    };

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Finds the session id in the request's `Cookie` headers.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|id| !id.is_empty())
}
