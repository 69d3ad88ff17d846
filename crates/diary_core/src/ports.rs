//! crates/diary_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the diary's core logic.
//! The table store, the identity provider and the AI gateway all sit behind
//! these traits so the core never depends on a concrete backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AnalysisResult, DiaryEntry, EntryChanges, NewEntry, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// The upstream service refused the call because of its request quota.
    #[error("Rate limited by upstream service")]
    RateLimited,
}

impl PortError {
    /// The bare message carried by the error, without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            PortError::NotFound(msg) | PortError::Unexpected(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    // --- Auth Methods ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Diary Entries ---
    /// Returns the owner's entries, newest first.
    async fn list_entries(&self, user_id: Uuid) -> PortResult<Vec<DiaryEntry>>;

    async fn get_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<DiaryEntry>;

    async fn insert_entry(&self, entry: NewEntry) -> PortResult<DiaryEntry>;

    async fn update_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        changes: EntryChanges,
    ) -> PortResult<DiaryEntry>;

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait MoodAnalysisService: Send + Sync {
    /// Asks the language model for mood emojis and a short sentiment reflection.
    ///
    /// Exactly one upstream attempt is made; a quota refusal surfaces as
    /// [`PortError::RateLimited`].
    async fn analyze_mood(&self, content: &str) -> PortResult<AnalysisResult>;
}
