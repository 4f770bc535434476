//! crates/doodle_notes_core/src/access.rs
//!
//! The note access controller: identifier validation, ownership rules and the
//! orchestration of list/read/create/update/delete against the ports.
//!
//! Every check runs in a fixed order, because the order decides which error a
//! caller sees when several conditions fail at once.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{Identity, NewNote, Note};
use crate::pagination::{NotePage, Pagination};
use crate::ports::{NoteFilter, NoteStore, PortError, UserDirectory, UsernameMatch};

//=========================================================================================
// Errors
//=========================================================================================

/// Every way a note operation can be rejected.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Invalid note id")]
    InvalidIdentifier(String),
    #[error("User not authenticated")]
    AuthenticationRequired,
    #[error("User not found")]
    UserNotFound(String),
    #[error("Note not found")]
    NoteNotFound(Uuid),
    /// Deliberately carries nothing about the real owner.
    #[error("You cannot access this note")]
    Unauthorized,
    #[error("Note must have a title")]
    MissingTitle,
    #[error("Note must have a doodle")]
    MissingImage,
    /// Any store failure the controller does not interpret, passed through untouched.
    #[error(transparent)]
    Port(#[from] PortError),
}

pub type AccessResult<T> = Result<T, AccessError>;

//=========================================================================================
// Policy and Input Types
//=========================================================================================

/// Who may read a single note. Chosen once when the controller is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    /// Anyone, including anonymous callers, may read any note.
    #[default]
    Unrestricted,
    /// Only the note's owner may read it.
    OwnerOnly,
}

impl std::str::FromStr for ReadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unrestricted" | "public" => Ok(ReadPolicy::Unrestricted),
            "owner_only" | "owner-only" | "private" => Ok(ReadPolicy::OwnerOnly),
            other => Err(format!("unknown read policy '{}'", other)),
        }
    }
}

/// The body of a create or update request. Both fields are required; they are
/// optional here so that absence can be reported as the right error.
#[derive(Debug, Clone, Default)]
pub struct NoteInput {
    pub title: Option<String>,
    pub image: Option<String>,
}

impl NoteInput {
    pub fn new(title: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            image: Some(image.into()),
        }
    }

    /// Title is checked before image.
    fn validate(self) -> AccessResult<(String, String)> {
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or(AccessError::MissingTitle)?;
        let image = self
            .image
            .filter(|i| !i.trim().is_empty())
            .ok_or(AccessError::MissingImage)?;
        Ok((title, image))
    }
}

/// Parses a note id in the store's format (a UUID). Performs no I/O.
pub fn parse_note_id(raw: &str) -> AccessResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AccessError::InvalidIdentifier(raw.to_string()))
}

//=========================================================================================
// The Controller
//=========================================================================================

/// Enforces note ownership on top of the note store and user directory.
///
/// Holds no mutable state; all state lives behind the ports.
#[derive(Clone)]
pub struct NoteAccessController {
    notes: Arc<dyn NoteStore>,
    users: Arc<dyn UserDirectory>,
    read_policy: ReadPolicy,
    username_match: UsernameMatch,
}

impl NoteAccessController {
    pub fn new(
        notes: Arc<dyn NoteStore>,
        users: Arc<dyn UserDirectory>,
        read_policy: ReadPolicy,
        username_match: UsernameMatch,
    ) -> Self {
        Self {
            notes,
            users,
            read_policy,
            username_match,
        }
    }

    pub fn read_policy(&self) -> ReadPolicy {
        self.read_policy
    }

    // --- Listing ---

    /// Notes across all owners, regardless of who is asking.
    pub async fn list_all(&self, pagination: Pagination) -> AccessResult<NotePage> {
        self.fetch_page(NoteFilter::all(), pagination).await
    }

    /// Notes owned by the user whose username matches `username`.
    pub async fn list_by_username(
        &self,
        username: &str,
        pagination: Pagination,
    ) -> AccessResult<NotePage> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AccessError::UserNotFound(String::new()));
        }

        let user = self
            .users
            .find_user_by_username(username, self.username_match)
            .await
            .map_err(|e| match e {
                PortError::NotFound(_) => AccessError::UserNotFound(username.to_string()),
                other => AccessError::Port(other),
            })?;

        self.fetch_page(NoteFilter::owned_by(user.user_id), pagination)
            .await
    }

    /// Notes owned by the caller.
    pub async fn list_for_session(
        &self,
        identity: Identity,
        pagination: Pagination,
    ) -> AccessResult<NotePage> {
        let user_id = require_identity(identity)?;
        self.fetch_page(NoteFilter::owned_by(user_id), pagination)
            .await
    }

    // --- Single note ---

    pub async fn get_note(&self, identity: Identity, note_id: &str) -> AccessResult<Note> {
        match self.read_policy {
            ReadPolicy::Unrestricted => {
                let note_id = parse_note_id(note_id)?;
                self.fetch_note(note_id).await
            }
            ReadPolicy::OwnerOnly => {
                let user_id = require_identity(identity)?;
                let note_id = parse_note_id(note_id)?;
                self.fetch_owned_note(user_id, note_id).await
            }
        }
    }

    pub async fn create_note(&self, identity: Identity, input: NoteInput) -> AccessResult<Note> {
        let owner_id = require_identity(identity)?;
        let (title, image) = input.validate()?;

        let note = self
            .notes
            .create_note(NewNote {
                owner_id,
                title,
                image,
            })
            .await?;
        info!("Note {} created by user {}", note.id, owner_id);
        Ok(note)
    }

    /// Replaces both title and image. There is no partial update.
    pub async fn update_note(
        &self,
        identity: Identity,
        note_id: &str,
        input: NoteInput,
    ) -> AccessResult<Note> {
        let user_id = require_identity(identity)?;
        let note_id = parse_note_id(note_id)?;
        let (title, image) = input.validate()?;

        let mut note = self.fetch_owned_note(user_id, note_id).await?;
        note.title = title;
        note.image = image;

        // Last write wins: a change saved between our fetch and this save is overwritten.
        let updated = self
            .notes
            .update_note(note)
            .await
            .map_err(|e| not_found_as_note(e, note_id))?;
        info!("Note {} updated by user {}", note_id, user_id);
        Ok(updated)
    }

    /// Deleting a note that is already gone is `NoteNotFound`, not a success.
    pub async fn delete_note(&self, identity: Identity, note_id: &str) -> AccessResult<()> {
        let user_id = require_identity(identity)?;
        let note_id = parse_note_id(note_id)?;

        self.fetch_owned_note(user_id, note_id).await?;
        self.notes
            .delete_note(note_id)
            .await
            .map_err(|e| not_found_as_note(e, note_id))?;
        info!("Note {} deleted by user {}", note_id, user_id);
        Ok(())
    }

    // --- Helpers ---

    async fn fetch_page(&self, filter: NoteFilter, pagination: Pagination) -> AccessResult<NotePage> {
        let notes = self
            .notes
            .list_notes(filter, pagination.skip(), pagination.take())
            .await?;
        let total = self.notes.count_notes(filter).await?;
        debug!(
            "Listed {} of {} notes (page {}, limit {})",
            notes.len(),
            total,
            pagination.page(),
            pagination.limit()
        );

        Ok(NotePage {
            notes,
            page: pagination.page(),
            limit: pagination.limit(),
            total,
        })
    }

    async fn fetch_note(&self, note_id: Uuid) -> AccessResult<Note> {
        self.notes
            .get_note_by_id(note_id)
            .await
            .map_err(|e| not_found_as_note(e, note_id))
    }

    /// Existence is checked before ownership, so a missing note is reported as
    /// missing to everyone.
    async fn fetch_owned_note(&self, user_id: Uuid, note_id: Uuid) -> AccessResult<Note> {
        let note = self.fetch_note(note_id).await?;
        if note.owner_id != user_id {
            warn!("User {} denied access to note {}", user_id, note_id);
            return Err(AccessError::Unauthorized);
        }
        Ok(note)
    }
}

fn require_identity(identity: Identity) -> AccessResult<Uuid> {
    identity
        .user_id()
        .ok_or(AccessError::AuthenticationRequired)
}

fn not_found_as_note(err: PortError, note_id: Uuid) -> AccessError {
    match err {
        PortError::NotFound(_) => AccessError::NoteNotFound(note_id),
        other => AccessError::Port(other),
    }
}

//=========================================================================================
// Tests
//=========================================================================================
