pub mod emotion;
pub mod session;
pub mod study_state;

pub use emotion::{DerivedLabel, Emotion};
pub use session::{
    AttentionRecord, Session, SessionId, SessionMetrics, SessionOverview, SessionReport,
    SessionStatus, SessionSummary,
};
pub use study_state::{HistoryEntry, StudyState};
