//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of every storage port. Used when
//! `STORAGE_BACKEND=memory` and by the test suites; nothing survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use doodle_notes_core::domain::{NewNote, Note, User, UserCredentials};
use doodle_notes_core::ports::{
    AuthStore, NoteFilter, NoteStore, PortError, PortResult, UserDirectory, UsernameMatch,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    /// Kept in insertion order.
    notes: Vec<Note>,
    /// Kept in registration order.
    users: Vec<UserCredentials>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn note_not_found(note_id: Uuid) -> PortError {
    PortError::NotFound(format!("Note {} not found", note_id))
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn create_note(&self, note: NewNote) -> PortResult<Note> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            owner_id: note.owner_id,
            title: note.title,
            image: note.image,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.notes.push(note.clone());
        Ok(note)
    }

    async fn get_note_by_id(&self, note_id: Uuid) -> PortResult<Note> {
        self.tables
            .read()
            .await
            .notes
            .iter()
            .find(|n| n.id == note_id)
            .cloned()
            .ok_or_else(|| note_not_found(note_id))
    }

    async fn list_notes(&self, filter: NoteFilter, skip: u64, take: u64) -> PortResult<Vec<Note>> {
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let take = usize::try_from(take).unwrap_or(usize::MAX);
        Ok(self
            .tables
            .read()
            .await
            .notes
            .iter()
            .filter(|n| filter.matches(n))
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn count_notes(&self, filter: NoteFilter) -> PortResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.notes.iter().filter(|n| filter.matches(n)).count() as u64)
    }

    async fn update_note(&self, note: Note) -> PortResult<Note> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .notes
            .iter_mut()
            .find(|n| n.id == note.id)
            .ok_or_else(|| note_not_found(note.id))?;
        stored.title = note.title;
        stored.image = note.image;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_note(&self, note_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let index = tables
            .notes
            .iter()
            .position(|n| n.id == note_id)
            .ok_or_else(|| note_not_found(note_id))?;
        tables.notes.remove(index);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_user_by_username(
        &self,
        username: &str,
        mode: UsernameMatch,
    ) -> PortResult<User> {
        self.tables
            .read()
            .await
            .users
            .iter()
            .find(|c| mode.matches(&c.user.username, username))
            .map(|c| c.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", username)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.tables
            .read()
            .await
            .users
            .iter()
            .find(|c| c.user.user_id == user_id)
            .map(|c| c.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        let taken = tables.users.iter().any(|c| {
            UsernameMatch::Exact.matches(&c.user.username, username) || c.user.email == email
        });
        if taken {
            return Err(PortError::Conflict(
                "Username or email already taken".to_string(),
            ));
        }

        let user = User {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(UserCredentials {
            user: user.clone(),
            hashed_password: hashed_password.to_string(),
        });
        Ok(user)
    }

    async fn get_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        self.tables
            .read()
            .await
            .users
            .iter()
            .find(|c| UsernameMatch::Exact.matches(&c.user.username, username))
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", username)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.tables
            .write()
            .await
            .sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        match self.tables.read().await.sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::NotFound(
                "Session not found or expired".to_string(),
            )),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.write().await.sessions.remove(session_id);
        Ok(())
    }
}
