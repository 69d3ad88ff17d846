//! crates/diary_core/src/domain.rs
//!
//! Defines the pure, core data structures for the diary.
//! These structs are independent of any database or HTTP framework.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single diary record owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub mood_emojis: Vec<String>,
    pub sentiment_analysis: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The analysis fields as they are persisted alongside an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoodAnnotation {
    pub mood_emojis: Vec<String>,
    pub sentiment_analysis: Option<String>,
}

/// A validated entry ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub user_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub annotation: MoodAnnotation,
}

/// The fields written by an edit. `annotation` is `None` when the stored
/// analysis must be left untouched.
#[derive(Debug, Clone)]
pub struct EntryChanges {
    pub title: Option<String>,
    pub content: String,
    pub annotation: Option<MoodAnnotation>,
}

/// The normalized reply of the mood analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub emojis: Vec<String>,
    pub sentiment: String,
}

impl From<AnalysisResult> for MoodAnnotation {
    fn from(result: AnalysisResult) -> Self {
        Self {
            mood_emojis: result.emojis,
            sentiment_analysis: Some(result.sentiment),
        }
    }
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
