//! services/api/src/web/notes.rs
//!
//! REST handlers for notes. Each handler extracts the caller's `Identity`,
//! hands the request to the `NoteAccessController` and renders the outcome.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use doodle_notes_core::{Identity, Note, NoteInput, NotePage, Pagination};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";
pub const PAGE_HEADER: &str = "x-page";
pub const LIMIT_HEADER: &str = "x-limit";

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A note as returned by every note endpoint.
#[derive(Serialize, ToSchema)]
pub struct NoteResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            owner_id: note.owner_id,
            title: note.title,
            image: note.image,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// Body of create and update requests. `img` is accepted for `image`.
#[derive(Deserialize, ToSchema, Default)]
pub struct NotePayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "img")]
    pub image: Option<String>,
}

/// An unreadable body counts as an empty one, so the controller still decides
/// which error wins (identity first, then the id, then the fields).
fn payload_or_empty(payload: Result<Json<NotePayload>, JsonRejection>) -> NotePayload {
    match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            debug!("Treating unreadable note body as empty: {}", rejection);
            NotePayload::default()
        }
    }
}

impl From<NotePayload> for NoteInput {
    fn from(payload: NotePayload) -> Self {
        NoteInput {
            title: payload.title,
            image: payload.image,
        }
    }
}

/// Raw paging parameters. Kept as strings so bad values fall back to defaults
/// instead of rejecting the request.
#[derive(Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number (default 1).
    pub page: Option<String>,
    /// Notes per page (default 5).
    pub limit: Option<String>,
}

impl PageQuery {
    fn pagination(&self) -> Pagination {
        Pagination::from_query(self.page.as_deref(), self.limit.as_deref())
    }
}

/// Renders a page as a JSON array, with paging details in headers.
fn page_response(page: NotePage) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(TOTAL_COUNT_HEADER),
        HeaderValue::from(page.total),
    );
    headers.insert(HeaderName::from_static(PAGE_HEADER), HeaderValue::from(page.page));
    headers.insert(HeaderName::from_static(LIMIT_HEADER), HeaderValue::from(page.limit));

    let notes: Vec<NoteResponse> = page.notes.into_iter().map(NoteResponse::from).collect();
    (StatusCode::OK, headers, Json(notes))
}

//=========================================================================================
// Listing Handlers
//=========================================================================================

/// List notes from every user.
#[utoipa::path(
    get,
    path = "/notes",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of notes", body = [NoteResponse])
    )
)]
pub async fn list_notes_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.notes.list_all(query.pagination()).await?;
    Ok(page_response(page))
}

/// List the notes of the logged-in user.
#[utoipa::path(
    get,
    path = "/notes/mine",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of the caller's notes", body = [NoteResponse]),
        (status = 401, description = "User not authenticated")
    )
)]
pub async fn list_my_notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .notes
        .list_for_session(identity, query.pagination())
        .await?;
    Ok(page_response(page))
}

/// List the notes of a user found by username (case-insensitive).
#[utoipa::path(
    get,
    path = "/notes/user/{username}",
    params(
        ("username" = String, Path, description = "The owner's username."),
        PageQuery
    ),
    responses(
        (status = 200, description = "One page of the user's notes", body = [NoteResponse]),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_user_notes_handler(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .notes
        .list_by_username(&username, query.pagination())
        .await?;
    Ok(page_response(page))
}

//=========================================================================================
// Single-Note Handlers
//=========================================================================================

/// Fetch one note; the configured read policy decides who may see it.
#[utoipa::path(
    get,
    path = "/notes/{note_id}",
    params(
        ("note_id" = String, Path, description = "The note's id.")
    ),
    responses(
        (status = 200, description = "The note", body = NoteResponse),
        (status = 400, description = "Invalid note id"),
        (status = 401, description = "Not the owner of this note"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn get_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(note_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.get_note(identity, &note_id).await?;
    Ok(Json(NoteResponse::from(note)))
}

/// Create a note owned by the logged-in user.
#[utoipa::path(
    post,
    path = "/notes",
    request_body = NotePayload,
    responses(
        (status = 201, description = "Note created", body = NoteResponse),
        (status = 400, description = "Missing title or image"),
        (status = 401, description = "User not authenticated")
    )
)]
pub async fn create_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<NotePayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state
        .notes
        .create_note(identity, payload_or_empty(payload).into())
        .await?;
    Ok((StatusCode::CREATED, Json(NoteResponse::from(note))))
}

/// Replace a note's title and image. Both are required.
#[utoipa::path(
    patch,
    path = "/notes/{note_id}",
    params(
        ("note_id" = String, Path, description = "The note's id.")
    ),
    request_body = NotePayload,
    responses(
        (status = 200, description = "Note updated", body = NoteResponse),
        (status = 400, description = "Invalid note id, or missing title or image"),
        (status = 401, description = "Not authenticated, or not the owner"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn update_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(note_id): Path<String>,
    payload: Result<Json<NotePayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state
        .notes
        .update_note(identity, &note_id, payload_or_empty(payload).into())
        .await?;
    Ok(Json(NoteResponse::from(note)))
}

/// Delete a note. Only its owner may do this.
#[utoipa::path(
    delete,
    path = "/notes/{note_id}",
    params(
        ("note_id" = String, Path, description = "The note's id.")
    ),
    responses(
        (status = 204, description = "Note deleted"),
        (status = 400, description = "Invalid note id"),
        (status = 401, description = "Not authenticated, or not the owner"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn delete_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(note_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.notes.delete_note(identity, &note_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
