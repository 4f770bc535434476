//! crates/doodle_notes_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A user-owned note: a title plus an image (doodle) payload.
///
/// `owner_id` is set once at creation and never reassigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields a store needs to persist a brand new note.
/// The store assigns the identifier and both timestamps.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub owner_id: Uuid,
    pub title: String,
    pub image: String,
}

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

/// The caller of a single request: an authenticated user, or nobody.
///
/// Resolved once per request by the identity provider and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Identity(Option<Uuid>);

impl Identity {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn user(user_id: Uuid) -> Self {
        Self(Some(user_id))
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.0
    }

    /// True only for an authenticated caller whose id equals `owner_id`.
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.0 == Some(owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_owns_nothing() {
        let owner = Uuid::new_v4();
        assert!(!Identity::anonymous().owns(owner));
        assert!(Identity::user(owner).owns(owner));
        assert!(!Identity::user(Uuid::new_v4()).owns(owner));
    }
}
