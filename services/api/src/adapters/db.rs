//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `NoteStore`, `UserDirectory` and `AuthStore` ports from the `core` crate.
//! It handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use doodle_notes_core::domain::{NewNote, Note, User, UserCredentials};
use doodle_notes_core::ports::{
    AuthStore, NoteFilter, NoteStore, PortError, PortResult, UserDirectory, UsernameMatch,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports on PostgreSQL.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Postgres takes signed offsets; anything past `i64::MAX` is empty anyway.
fn to_sql_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            username: self.username,
            email: self.email,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    username: String,
    email: String,
    hashed_password: String,
    created_at: DateTime<Utc>,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user: User {
                user_id: self.user_id,
                username: self.username,
                email: self.email,
                created_at: self.created_at,
            },
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct NoteRecord {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    image: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl NoteRecord {
    fn to_domain(self) -> Note {
        Note {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            image: self.image,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const NOTE_COLUMNS: &str = "id, owner_id, title, image, created_at, updated_at";
const USER_COLUMNS: &str = "user_id, username, email, created_at";

//=========================================================================================
// `NoteStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl NoteStore for DbAdapter {
    async fn create_note(&self, note: NewNote) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "INSERT INTO notes (id, owner_id, title, image) VALUES ($1, $2, $3, $4) RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(note.owner_id)
        .bind(&note.title)
        .bind(&note.image)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_note_by_id(&self, note_id: Uuid) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "SELECT {} FROM notes WHERE id = $1",
            NOTE_COLUMNS
        ))
        .bind(note_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Note {} not found", note_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_notes(&self, filter: NoteFilter, skip: u64, take: u64) -> PortResult<Vec<Note>> {
        let records = sqlx::query_as::<_, NoteRecord>(&format!(
            "SELECT {} FROM notes WHERE ($1::uuid IS NULL OR owner_id = $1) \
             ORDER BY created_at ASC, id ASC OFFSET $2 LIMIT $3",
            NOTE_COLUMNS
        ))
        .bind(filter.owner_id)
        .bind(to_sql_count(skip))
        .bind(to_sql_count(take))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let notes = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(notes)
    }

    async fn count_notes(&self, filter: NoteFilter) -> PortResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notes WHERE ($1::uuid IS NULL OR owner_id = $1)",
        )
        .bind(filter.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(count.max(0) as u64)
    }

    async fn update_note(&self, note: Note) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "UPDATE notes SET title = $1, image = $2, updated_at = NOW() WHERE id = $3 RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(&note.title)
        .bind(&note.image)
        .bind(note.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Note {} not found", note.id)))?;
        Ok(record.to_domain())
    }

    async fn delete_note(&self, note_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(note_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Note {} not found", note_id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `UserDirectory` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserDirectory for DbAdapter {
    async fn find_user_by_username(
        &self,
        username: &str,
        mode: UsernameMatch,
    ) -> PortResult<User> {
        let condition = match mode {
            UsernameMatch::Exact => "lower(username) = lower($1)",
            UsernameMatch::Substring => "strpos(lower(username), lower($1)) > 0",
        };
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE {} ORDER BY created_at ASC LIMIT 1",
            USER_COLUMNS, condition
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", username)))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE user_id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }
}

//=========================================================================================
// `AuthStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthStore for DbAdapter {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (user_id, username, email, hashed_password) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PortError::Conflict("Username or email already taken".to_string())
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, username, email, hashed_password, created_at FROM users WHERE lower(username) = lower($1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", username)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.ok_or_else(|| PortError::NotFound("Session not found or expired".to_string()))
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
