//! crates/diary_core/src/testing.rs
//!
//! In-memory implementations of the ports for tests in this workspace.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::{
    AnalysisResult, AuthSession, DiaryEntry, EntryChanges, NewEntry, User, UserCredentials,
};
use crate::ports::{DatabaseService, MoodAnalysisService, PortError, PortResult};

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    sessions: HashMap<String, AuthSession>,
    entries: Vec<DiaryEntry>,
}

/// A `DatabaseService` backed by plain vectors.
#[derive(Default)]
pub struct InMemoryDb {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose entry writes all fail.
    pub fn failing_writes() -> Self {
        let db = Self::default();
        db.set_failing_writes(true);
        db
    }

    /// Makes entry inserts, updates and deletes fail until switched back.
    pub fn set_failing_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("connection refused".to_string()));
        }
        Ok(())
    }

    /// Registers a user with a live session and returns `(user_id, session_id)`.
    pub fn seed_session(&self) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4().to_string();
        let mut tables = self.tables.lock().unwrap();
        tables.users.push(UserCredentials {
            user_id,
            email: format!("{}@example.com", user_id),
            hashed_password: String::new(),
        });
        tables.sessions.insert(
            session_id.clone(),
            AuthSession {
                id: session_id.clone(),
                user_id,
                expires_at: Utc::now() + Duration::days(1),
            },
        );
        (user_id, session_id)
    }
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|u| u.user_id == user_id)
            .map(|u| User {
                user_id: u.user_id,
                email: Some(u.email.clone()),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.email == email) {
            return Err(PortError::Unexpected(format!("{} already registered", email)));
        }
        let user_id = Uuid::new_v4();
        tables.users.push(UserCredentials {
            user_id,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        });
        Ok(User {
            user_id,
            email: Some(email.to_string()),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        tables.sessions.insert(
            session_id.to_string(),
            AuthSession {
                id: session_id.to_string(),
                user_id,
                expires_at,
            },
        );
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let tables = self.tables.lock().unwrap();
        match tables.sessions.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.lock().unwrap().sessions.remove(session_id);
        Ok(())
    }

    async fn list_entries(&self, user_id: Uuid) -> PortResult<Vec<DiaryEntry>> {
        let tables = self.tables.lock().unwrap();
        let mut entries: Vec<DiaryEntry> = tables
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn get_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<DiaryEntry> {
        let tables = self.tables.lock().unwrap();
        tables
            .entries
            .iter()
            .find(|e| e.id == entry_id && e.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Entry {} not found", entry_id)))
    }

    async fn insert_entry(&self, entry: NewEntry) -> PortResult<DiaryEntry> {
        self.check_writable()?;
        let record = DiaryEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            title: entry.title,
            content: entry.content,
            mood_emojis: entry.annotation.mood_emojis,
            sentiment_analysis: entry.annotation.sentiment_analysis,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().entries.push(record.clone());
        Ok(record)
    }

    async fn update_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        changes: EntryChanges,
    ) -> PortResult<DiaryEntry> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let entry = tables
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id && e.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("Entry {} not found", entry_id)))?;
        entry.title = changes.title;
        entry.content = changes.content;
        if let Some(annotation) = changes.annotation {
            entry.mood_emojis = annotation.mood_emojis;
            entry.sentiment_analysis = annotation.sentiment_analysis;
        }
        Ok(entry.clone())
    }

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<()> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.entries.len();
        tables
            .entries
            .retain(|e| !(e.id == entry_id && e.user_id == user_id));
        if tables.entries.len() == before {
            return Err(PortError::NotFound(format!("Entry {} not found", entry_id)));
        }
        Ok(())
    }
}

/// What the stub analyzer answers with.
#[derive(Debug, Clone)]
pub enum StubReply {
    Result(AnalysisResult),
    RateLimited,
    Failure(String),
}

/// A `MoodAnalysisService` that returns a canned reply and counts its calls.
pub struct StubAnalyzer {
    reply: StubReply,
    calls: AtomicUsize,
}

impl StubAnalyzer {
    pub fn new(reply: StubReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returning(emojis: &[&str], sentiment: &str) -> Self {
        Self::new(StubReply::Result(AnalysisResult {
            emojis: emojis.iter().map(|e| e.to_string()).collect(),
            sentiment: sentiment.to_string(),
        }))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MoodAnalysisService for StubAnalyzer {
    async fn analyze_mood(&self, _content: &str) -> PortResult<AnalysisResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            StubReply::Result(result) => Ok(result.clone()),
            StubReply::RateLimited => Err(PortError::RateLimited),
            StubReply::Failure(msg) => Err(PortError::Unexpected(msg.clone())),
        }
    }
}
