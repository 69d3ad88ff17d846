//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diary_core::domain::{DiaryEntry, EntryChanges, NewEntry, User, UserCredentials};
use diary_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const ENTRY_COLUMNS: &str =
    "id, user_id, title, content, mood_emojis, sentiment_analysis, created_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
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

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: Option<String>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct EntryRecord {
    id: Uuid,
    user_id: Uuid,
    title: Option<String>,
    content: String,
    mood_emojis: Vec<String>,
    sentiment_analysis: Option<String>,
    created_at: DateTime<Utc>,
}
impl EntryRecord {
    fn to_domain(self) -> DiaryEntry {
        DiaryEntry {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            mood_emojis: self.mood_emojis,
            sentiment_analysis: self.sentiment_analysis,
            created_at: self.created_at,
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn entry_not_found(entry_id: Uuid) -> PortError {
    PortError::NotFound(format!("Entry {} not found", entry_id))
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;

        Ok(record.to_domain())
    }

    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
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

        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn list_entries(&self, user_id: Uuid) -> PortResult<Vec<DiaryEntry>> {
        let records = sqlx::query_as::<_, EntryRecord>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM diary_entries WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<DiaryEntry> {
        let record = sqlx::query_as::<_, EntryRecord>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM diary_entries WHERE id = $1 AND user_id = $2"
        ))
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| entry_not_found(entry_id))?;

        Ok(record.to_domain())
    }

    async fn insert_entry(&self, entry: NewEntry) -> PortResult<DiaryEntry> {
        let record = sqlx::query_as::<_, EntryRecord>(&format!(
            "INSERT INTO diary_entries (id, user_id, title, content, mood_emojis, sentiment_analysis) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(entry.title)
        .bind(entry.content)
        .bind(entry.annotation.mood_emojis)
        .bind(entry.annotation.sentiment_analysis)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }

    async fn update_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        changes: EntryChanges,
    ) -> PortResult<DiaryEntry> {
        let query = match changes.annotation {
            Some(annotation) => sqlx::query_as::<_, EntryRecord>(&format!(
                "UPDATE diary_entries SET title = $1, content = $2, mood_emojis = $3, sentiment_analysis = $4 \
                 WHERE id = $5 AND user_id = $6 RETURNING {ENTRY_COLUMNS}"
            ))
            .bind(changes.title)
            .bind(changes.content)
            .bind(annotation.mood_emojis)
            .bind(annotation.sentiment_analysis)
            .bind(entry_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await,
            None => sqlx::query_as::<_, EntryRecord>(&format!(
                "UPDATE diary_entries SET title = $1, content = $2 \
                 WHERE id = $3 AND user_id = $4 RETURNING {ENTRY_COLUMNS}"
            ))
            .bind(changes.title)
            .bind(changes.content)
            .bind(entry_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await,
        };

        let record = query
            .map_err(unexpected)?
            .ok_or_else(|| entry_not_found(entry_id))?;
        Ok(record.to_domain())
    }

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM diary_entries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(entry_not_found(entry_id));
        }
        Ok(())
    }
}
