//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification of the REST API.

use utoipa::OpenApi;

use crate::web::{auth, notes, users};

#[derive(OpenApi)]
#[openapi(
    paths(
        notes::list_notes_handler,
        notes::list_my_notes_handler,
        notes::list_user_notes_handler,
        notes::get_note_handler,
        notes::create_note_handler,
        notes::update_note_handler,
        notes::delete_note_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        users::get_authenticated_user_handler,
        users::get_user_handler,
    ),
    components(
        schemas(
            notes::NoteResponse,
            notes::NotePayload,
            users::UserResponse,
            auth::SignupRequest,
            auth::LoginRequest,
        )
    ),
    tags(
        (name = "Doodle Notes API", description = "Session-authenticated notes with doodle images.")
    )
)]
pub struct ApiDoc;
