//! crates/doodle_notes_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{NewNote, Note, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Query Types
//=========================================================================================

/// Restricts a note listing to one owner, or leaves it open across all owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoteFilter {
    pub owner_id: Option<Uuid>,
}

impl NoteFilter {
    pub fn all() -> Self {
        Self { owner_id: None }
    }

    pub fn owned_by(owner_id: Uuid) -> Self {
        Self {
            owner_id: Some(owner_id),
        }
    }

    pub fn matches(&self, note: &Note) -> bool {
        self.owner_id.map_or(true, |owner| note.owner_id == owner)
    }
}

/// How a username is compared against stored usernames. Both modes ignore case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsernameMatch {
    #[default]
    Exact,
    /// The stored username contains the requested one.
    Substring,
}

impl UsernameMatch {
    pub fn matches(&self, stored: &str, requested: &str) -> bool {
        let stored = stored.to_lowercase();
        let requested = requested.to_lowercase();
        match self {
            UsernameMatch::Exact => stored == requested,
            UsernameMatch::Substring => stored.contains(&requested),
        }
    }
}

impl std::str::FromStr for UsernameMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(UsernameMatch::Exact),
            "substring" => Ok(UsernameMatch::Substring),
            other => Err(format!("unknown username match mode '{}'", other)),
        }
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Document-style persistence for notes, keyed by note id.
///
/// Each call is atomic for a single note; there are no multi-note transactions.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Persists a new note, assigning its id and timestamps.
    async fn create_note(&self, note: NewNote) -> PortResult<Note>;

    /// Fails with `PortError::NotFound` when no note has this id.
    async fn get_note_by_id(&self, note_id: Uuid) -> PortResult<Note>;

    /// Returns at most `take` notes matching `filter` after skipping `skip`,
    /// in insertion order.
    async fn list_notes(&self, filter: NoteFilter, skip: u64, take: u64) -> PortResult<Vec<Note>>;

    async fn count_notes(&self, filter: NoteFilter) -> PortResult<u64>;

    /// Saves the title and image of an existing note and refreshes `updated_at`.
    /// Fails with `PortError::NotFound` if the note no longer exists.
    async fn update_note(&self, note: Note) -> PortResult<Note>;

    /// Fails with `PortError::NotFound` if the note no longer exists.
    async fn delete_note(&self, note_id: Uuid) -> PortResult<()>;
}

/// Read-only user lookups used by the note listings and the user endpoints.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fails with `PortError::NotFound` when no username matches.
    async fn find_user_by_username(
        &self,
        username: &str,
        mode: UsernameMatch,
    ) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;
}

/// Account and login-session storage backing the identity provider.
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Fails with `PortError::Conflict` when the username (ignoring case) or email is taken.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    /// Exact, case-insensitive username lookup including the password hash.
    async fn get_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the user bound to a live session. Unknown and expired sessions
    /// are `PortError::NotFound`.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_match_ignores_case() {
        assert!(UsernameMatch::Exact.matches("alice", "Alice"));
        assert!(!UsernameMatch::Exact.matches("alice_b", "Alice"));
        assert!(UsernameMatch::Substring.matches("alice_b", "ALICE"));
        assert!(!UsernameMatch::Substring.matches("bob", "alice"));
    }

    #[test]
    fn username_match_parses_config_values() {
        assert_eq!("exact".parse::<UsernameMatch>(), Ok(UsernameMatch::Exact));
        assert_eq!(" Substring ".parse::<UsernameMatch>(), Ok(UsernameMatch::Substring));
        assert!("regex".parse::<UsernameMatch>().is_err());
    }
}
