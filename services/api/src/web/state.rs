//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use diary_core::{
    lifecycle::DiaryService,
    ports::{DatabaseService, MoodAnalysisService},
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub mood_adapter: Arc<dyn MoodAnalysisService>,
    pub diary: DiaryService,
}

impl AppState {
    /// Wires the diary service to the given store and analyzer.
    pub fn new(
        db: Arc<dyn DatabaseService>,
        mood_adapter: Arc<dyn MoodAnalysisService>,
        config: Arc<Config>,
    ) -> Self {
        let diary = DiaryService::new(db.clone(), mood_adapter.clone());
        Self {
            db,
            config,
            mood_adapter,
            diary,
        }
    }
}
