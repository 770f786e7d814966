pub mod history;
pub mod merge;

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::models::{HistoryEntry, StudyState};

pub use history::{HistoryStore, MAX_HISTORY_ENTRIES};
pub use merge::merge;

pub type LiveState = Option<Arc<StudyState>>;

/// Live study state plus its rolling history.
///
/// Only the sampling loop of the open session publishes here. Readers get
/// whole `Arc<StudyState>` values or owned history snapshots, never a value
/// that is half updated.
pub struct StudyBoard {
    live: watch::Sender<LiveState>,
    history: Mutex<HistoryStore>,
}

impl StudyBoard {
    pub fn new() -> Self {
        let (live, _rx) = watch::channel(None);
        Self {
            live,
            history: Mutex::new(HistoryStore::new()),
        }
    }

    pub fn publish(&self, state: StudyState) {
        let mut history = self.lock_history();
        history.append(HistoryEntry::new(state.clone()));
        self.live.send_replace(Some(Arc::new(state)));
    }

    pub fn current(&self) -> LiveState {
        self.live.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveState> {
        self.live.subscribe()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock_history().snapshot()
    }

    /// Clears live state and history ahead of a new session.
    pub fn reset(&self) {
        let mut history = self.lock_history();
        history.clear();
        self.live.send_replace(None);
    }

    fn lock_history(&self) -> MutexGuard<'_, HistoryStore> {
        match self.history.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for StudyBoard {
    fn default() -> Self {
        Self::new()
    }
}
