pub mod analysis;
pub mod domain;
pub mod lifecycle;
pub mod ports;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use analysis::{analyze_content, AnalysisOutcome};
pub use domain::{
    AnalysisResult, AuthSession, DiaryEntry, EntryChanges, MoodAnnotation, NewEntry, User,
    UserCredentials,
};
pub use lifecycle::{DiaryError, DiaryResult, DiaryService, SaveStage};
pub use ports::{DatabaseService, MoodAnalysisService, PortError, PortResult};
