//! crates/diary_core/src/lifecycle.rs
//!
//! Create, edit, list and delete of diary entries. Saving runs through
//! validation, mood analysis and persistence in sequence; a failed analysis
//! degrades the annotation but never fails the save.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{DiaryEntry, EntryChanges, MoodAnnotation, NewEntry};
use crate::ports::{DatabaseService, MoodAnalysisService, PortError};

/// Stages a save operation moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStage {
    Idle,
    Validating,
    AnalyzingMood,
    Persisting,
}

impl fmt::Display for SaveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SaveStage::Idle => "idle",
            SaveStage::Validating => "validating",
            SaveStage::AnalyzingMood => "analyzing_mood",
            SaveStage::Persisting => "persisting",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DiaryError {
    #[error("Please write something before saving.")]
    EmptyContent,
    #[error(transparent)]
    Port(#[from] PortError),
}

pub type DiaryResult<T> = Result<T, DiaryError>;

/// Orchestrates entry saves against the store and the mood analyzer.
#[derive(Clone)]
pub struct DiaryService {
    db: Arc<dyn DatabaseService>,
    analyzer: Arc<dyn MoodAnalysisService>,
}

impl DiaryService {
    pub fn new(db: Arc<dyn DatabaseService>, analyzer: Arc<dyn MoodAnalysisService>) -> Self {
        Self { db, analyzer }
    }

    pub async fn list_entries(&self, user_id: Uuid) -> DiaryResult<Vec<DiaryEntry>> {
        Ok(self.db.list_entries(user_id).await?)
    }

    pub async fn create_entry(
        &self,
        user_id: Uuid,
        title: Option<&str>,
        content: &str,
    ) -> DiaryResult<DiaryEntry> {
        let result = self.save_new(user_id, title, content).await;
        stage(SaveStage::Idle);
        result
    }

    async fn save_new(
        &self,
        user_id: Uuid,
        title: Option<&str>,
        content: &str,
    ) -> DiaryResult<DiaryEntry> {
        stage(SaveStage::Validating);
        let content = validate_content(content)?;

        stage(SaveStage::AnalyzingMood);
        let annotation = self.annotate(&content).await.unwrap_or_default();

        stage(SaveStage::Persisting);
        let entry = NewEntry {
            user_id,
            title: normalize_title(title),
            content,
            annotation,
        };
        Ok(self.db.insert_entry(entry).await?)
    }

    /// Edits an entry, re-running the analysis only when the content changed.
    pub async fn update_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        title: Option<&str>,
        content: &str,
    ) -> DiaryResult<DiaryEntry> {
        let result = self.save_edit(user_id, entry_id, title, content).await;
        stage(SaveStage::Idle);
        result
    }

    async fn save_edit(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        title: Option<&str>,
        content: &str,
    ) -> DiaryResult<DiaryEntry> {
        stage(SaveStage::Validating);
        let content = validate_content(content)?;
        let stored = self.db.get_entry(user_id, entry_id).await?;

        let annotation = if content != stored.content {
            stage(SaveStage::AnalyzingMood);
            self.annotate(&content).await
        } else {
            None
        };

        stage(SaveStage::Persisting);
        let changes = EntryChanges {
            title: normalize_title(title),
            content,
            annotation,
        };
        Ok(self.db.update_entry(user_id, entry_id, changes).await?)
    }

    pub async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> DiaryResult<()> {
        Ok(self.db.delete_entry(user_id, entry_id).await?)
    }

    /// Returns `None` when the analysis failed, so callers decide what to keep.
    async fn annotate(&self, content: &str) -> Option<MoodAnnotation> {
        match self.analyzer.analyze_mood(content).await {
            Ok(result) => Some(result.into()),
            Err(e) => {
                warn!("Analysis error, saving without mood annotation: {:?}", e);
                None
            }
        }
    }
}

fn stage(stage: SaveStage) {
    debug!(%stage, "save stage");
}

fn validate_content(content: &str) -> DiaryResult<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(DiaryError::EmptyContent);
    }
    Ok(trimmed.to_string())
}

fn normalize_title(title: Option<&str>) -> Option<String> {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryDb, StubAnalyzer, StubReply};

    fn service(analyzer: Arc<StubAnalyzer>) -> (DiaryService, Arc<InMemoryDb>) {
        let db = Arc::new(InMemoryDb::new());
        (DiaryService::new(db.clone(), analyzer), db)
    }

    #[tokio::test]
    async fn create_list_delete_round_trip() {
        let analyzer = Arc::new(StubAnalyzer::returning(&["🙂"], "positive"));
        let (diary, _db) = service(analyzer.clone());
        let owner = Uuid::new_v4();

        let entry = diary
            .create_entry(owner, None, "Today was good")
            .await
            .unwrap();
        assert_eq!(entry.content, "Today was good");
        assert_eq!(entry.mood_emojis, vec!["🙂"]);
        assert_eq!(entry.sentiment_analysis.as_deref(), Some("positive"));

        let listed = diary.list_entries(owner).await.unwrap();
        assert_eq!(listed, vec![entry.clone()]);

        diary.delete_entry(owner, entry.id).await.unwrap();
        assert!(diary.list_entries(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_content_is_rejected_before_analysis() {
        let analyzer = Arc::new(StubAnalyzer::returning(&["🙂"], "positive"));
        let (diary, db) = service(analyzer.clone());
        let owner = Uuid::new_v4();

        let err = diary.create_entry(owner, Some("t"), "   \n").await.unwrap_err();
        assert!(matches!(err, DiaryError::EmptyContent));
        assert_eq!(analyzer.calls(), 0);
        assert!(db.list_entries(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_trims_content_and_drops_blank_title() {
        let analyzer = Arc::new(StubAnalyzer::returning(&["🌧️"], "A quiet day."));
        let (diary, _db) = service(analyzer);

        let entry = diary
            .create_entry(Uuid::new_v4(), Some("  "), "  rain all day \n")
            .await
            .unwrap();
        assert_eq!(entry.title, None);
        assert_eq!(entry.content, "rain all day");
    }

    #[tokio::test]
    async fn failed_analysis_still_saves_the_entry() {
        let analyzer = Arc::new(StubAnalyzer::new(StubReply::Failure(
            "AI gateway error: 500".to_string(),
        )));
        let (diary, _db) = service(analyzer.clone());

        let entry = diary
            .create_entry(Uuid::new_v4(), Some("Work"), "Long meeting")
            .await
            .unwrap();
        assert_eq!(analyzer.calls(), 1);
        assert!(entry.mood_emojis.is_empty());
        assert_eq!(entry.sentiment_analysis, None);
    }

    #[tokio::test]
    async fn rate_limited_analysis_still_saves_the_entry() {
        let analyzer = Arc::new(StubAnalyzer::new(StubReply::RateLimited));
        let (diary, _db) = service(analyzer);

        let entry = diary
            .create_entry(Uuid::new_v4(), None, "Busy")
            .await
            .unwrap();
        assert!(entry.mood_emojis.is_empty());
    }

    #[tokio::test]
    async fn editing_unchanged_content_keeps_annotation_without_analysis() {
        let analyzer = Arc::new(StubAnalyzer::returning(&["🙂"], "positive"));
        let (diary, _db) = service(analyzer.clone());
        let owner = Uuid::new_v4();
        let entry = diary
            .create_entry(owner, None, "Today was good")
            .await
            .unwrap();
        assert_eq!(analyzer.calls(), 1);

        let edited = diary
            .update_entry(owner, entry.id, Some("New title"), "Today was good")
            .await
            .unwrap();
        assert_eq!(analyzer.calls(), 1);
        assert_eq!(edited.title.as_deref(), Some("New title"));
        assert_eq!(edited.mood_emojis, vec!["🙂"]);
        assert_eq!(edited.sentiment_analysis.as_deref(), Some("positive"));
    }

    #[tokio::test]
    async fn editing_changed_content_reanalyzes() {
        let analyzer = Arc::new(StubAnalyzer::returning(&["😌"], "Calm."));
        let (diary, _db) = service(analyzer.clone());
        let owner = Uuid::new_v4();
        let entry = diary.create_entry(owner, None, "first").await.unwrap();

        let edited = diary
            .update_entry(owner, entry.id, None, "second thoughts")
            .await
            .unwrap();
        assert_eq!(analyzer.calls(), 2);
        assert_eq!(edited.content, "second thoughts");
        assert_eq!(edited.mood_emojis, vec!["😌"]);
    }

    #[tokio::test]
    async fn entries_of_other_owners_are_not_found() {
        let analyzer = Arc::new(StubAnalyzer::returning(&["🙂"], "positive"));
        let (diary, _db) = service(analyzer);
        let owner = Uuid::new_v4();
        let entry = diary.create_entry(owner, None, "mine").await.unwrap();

        let stranger = Uuid::new_v4();
        let err = diary.delete_entry(stranger, entry.id).await.unwrap_err();
        assert!(matches!(err, DiaryError::Port(PortError::NotFound(_))));
        let err = diary
            .update_entry(stranger, entry.id, None, "theirs")
            .await
            .unwrap_err();
        assert!(matches!(err, DiaryError::Port(PortError::NotFound(_))));
        assert_eq!(diary.list_entries(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_insert_is_reported_and_nothing_is_stored() {
        let analyzer = Arc::new(StubAnalyzer::returning(&["🙂"], "positive"));
        let db = Arc::new(InMemoryDb::failing_writes());
        let diary = DiaryService::new(db.clone(), analyzer);
        let owner = Uuid::new_v4();

        let err = diary.create_entry(owner, None, "lost words").await.unwrap_err();
        assert!(matches!(err, DiaryError::Port(PortError::Unexpected(_))));
        assert!(db.list_entries(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_update_leaves_the_stored_entry_alone() {
        let analyzer = Arc::new(StubAnalyzer::returning(&["🙂"], "positive"));
        let (diary, db) = service(analyzer);
        let owner = Uuid::new_v4();
        let entry = diary.create_entry(owner, Some("Before"), "original").await.unwrap();

        db.set_failing_writes(true);
        let err = diary
            .update_entry(owner, entry.id, Some("After"), "rewritten")
            .await
            .unwrap_err();
        assert!(matches!(err, DiaryError::Port(PortError::Unexpected(_))));
        assert_eq!(db.get_entry(owner, entry.id).await.unwrap(), entry);
    }

    //-------------------------------------------------------------------------------------
    // Stage trace
    //-------------------------------------------------------------------------------------

    use std::sync::Mutex;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Collects the `stage` field of every event.
    struct StageRecorder(Arc<Mutex<Vec<String>>>);

    struct StageVisitor(Option<String>);

    impl Visit for StageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "stage" {
                self.0 = Some(format!("{:?}", value));
            }
        }
    }

    impl<S: Subscriber> Layer<S> for StageRecorder {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = StageVisitor(None);
            event.record(&mut visitor);
            if let Some(stage) = visitor.0 {
                self.0.lock().unwrap().push(stage);
            }
        }
    }

    fn record_stages() -> (Arc<Mutex<Vec<String>>>, tracing::subscriber::DefaultGuard) {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(StageRecorder(stages.clone()));
        (stages, tracing::subscriber::set_default(subscriber))
    }

    #[tokio::test]
    async fn rejected_validation_returns_to_idle() {
        let (diary, _db) = service(Arc::new(StubAnalyzer::returning(&[], "")));
        let (stages, _guard) = record_stages();

        diary.create_entry(Uuid::new_v4(), None, " ").await.unwrap_err();
        assert_eq!(*stages.lock().unwrap(), vec!["validating", "idle"]);
    }

    #[tokio::test]
    async fn failed_persistence_returns_to_idle() {
        let analyzer = Arc::new(StubAnalyzer::returning(&["🙂"], "positive"));
        let diary = DiaryService::new(Arc::new(InMemoryDb::failing_writes()), analyzer);
        let (stages, _guard) = record_stages();

        diary.create_entry(Uuid::new_v4(), None, "hello").await.unwrap_err();
        assert_eq!(
            *stages.lock().unwrap(),
            vec!["validating", "analyzing_mood", "persisting", "idle"]
        );
    }

    #[tokio::test]
    async fn successful_edit_of_unchanged_content_skips_analysis_stage() {
        let (diary, _db) = service(Arc::new(StubAnalyzer::returning(&["🙂"], "positive")));
        let owner = Uuid::new_v4();
        let entry = diary.create_entry(owner, None, "same").await.unwrap();
        let (stages, _guard) = record_stages();

        diary.update_entry(owner, entry.id, None, "same").await.unwrap();
        assert_eq!(
            *stages.lock().unwrap(),
            vec!["validating", "persisting", "idle"]
        );
    }

    #[test]
    fn blank_titles_become_absent() {
        assert_eq!(normalize_title(None), None);
        assert_eq!(normalize_title(Some("   ")), None);
        assert_eq!(normalize_title(Some(" Monday ")), Some("Monday".to_string()));
    }

    #[test]
    fn content_is_trimmed_and_required() {
        assert!(matches!(validate_content(" \n\t"), Err(DiaryError::EmptyContent)));
        assert_eq!(validate_content("  hi  ").unwrap(), "hi");
    }
}
