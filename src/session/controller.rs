use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::Duration,
};

use super::{
    error::{SessionStartError, SessionStopError},
    state::{OpenSession, SessionState},
};
use crate::{
    api::{ApiError, SessionApi},
    auth::{AuthState, IdentityProvider},
    db::{Database, JournalEntry, JournalStatus},
    models::{
        HistoryEntry, Session, SessionId, SessionMetrics, SessionOverview, SessionReport,
        SessionSummary,
    },
    sampling::{AnalysisCycle, CycleLimits, Pipeline, SampleScheduler},
    settings::StudySyncSettings,
    state::{LiveState, StudyBoard},
};

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub sample_period: Duration,
    pub limits: CycleLimits,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_period: Duration::from_millis(3000),
            limits: CycleLimits::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_settings(settings: &StudySyncSettings) -> Self {
        Self {
            sample_period: settings.sample_period(),
            limits: CycleLimits {
                capture_timeout: settings.capture_timeout(),
                request_timeout: settings.request_timeout(),
            },
        }
    }
}

/// Owns the study-session lifecycle and the sampling that runs inside it.
///
/// Cheap to clone; every clone drives the same session.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    scheduler: Arc<Mutex<SampleScheduler>>,
    board: Arc<StudyBoard>,
    api: Arc<dyn SessionApi>,
    identity: Arc<dyn IdentityProvider>,
    pipeline: Pipeline,
    journal: Option<Database>,
    config: SessionConfig,
}

impl SessionController {
    pub fn new(
        api: Arc<dyn SessionApi>,
        identity: Arc<dyn IdentityProvider>,
        pipeline: Pipeline,
        config: SessionConfig,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            scheduler: Arc::new(Mutex::new(SampleScheduler::new())),
            board: Arc::new(StudyBoard::new()),
            api,
            identity,
            pipeline,
            journal: None,
            config,
        }
    }

    pub fn with_journal(mut self, journal: Database) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Opens a server-side session and starts sampling against it.
    ///
    /// The state lock is held across the request so two concurrent starts
    /// cannot both open a session.
    pub async fn start(&self) -> Result<Session, SessionStartError> {
        let principal = match self.identity.current() {
            AuthState::Authenticated(principal) => principal,
            AuthState::Unknown | AuthState::Unauthenticated => {
                return Err(SessionStartError::Unauthenticated)
            }
        };

        let mut state = self.state.lock().await;
        if state.is_open() {
            return Err(SessionStartError::AlreadyOpen);
        }

        let started = self.api.start_session().await.map_err(|err| {
            warn!("Session start failed: {err}");
            SessionStartError::from(err)
        })?;
        let session = Session::open(started.id, started.start_time.unwrap_or_else(Utc::now));

        self.board.reset();
        let cycle = AnalysisCycle::new(
            session.id.clone(),
            self.pipeline.clone(),
            self.board.clone(),
            self.config.limits,
            Utc::now(),
        );

        if let Err(err) = self
            .scheduler
            .lock()
            .await
            .start(self.config.sample_period, cycle)
        {
            error!("Failed to start sampling for session {}: {err}", session.id);
            if let Err(close_err) = self.api.end_session(&session.id).await {
                warn!("Could not release session {}: {close_err}", session.id);
            }
            return Err(SessionStartError::SamplingUnavailable(err.to_string()));
        }

        // Sampling is live from here on, so record Open before the next await.
        // A caller that drops this future still leaves a session `stop` can close.
        let journal_entry = self
            .journal
            .as_ref()
            .map(|_| JournalEntry::opened(&session, Some(&principal.uid)));
        state.begin(OpenSession {
            session: session.clone(),
            principal: principal.uid.clone(),
            journal_entry_id: journal_entry.as_ref().map(|entry| entry.id.clone()),
        });
        info!("Session {} opened for {}", session.id, principal.uid);

        if let (Some(journal), Some(entry)) = (self.journal.as_ref(), journal_entry) {
            if let Err(err) = journal.insert_journal_entry(&entry).await {
                error!("Failed to journal session {}: {err:#}", session.id);
                state.forget_journal_entry();
            }
        }

        Ok(session)
    }

    /// Stops sampling and closes the open session.
    ///
    /// Sampling is cancelled before the close request goes out, so a failed
    /// close still leaves the controller Closed with nothing running.
    pub async fn stop(&self) -> Result<SessionReport, SessionStopError> {
        let mut state = self.state.lock().await;
        let open = state.finish().ok_or(SessionStopError::NotOpen)?;

        if let Err(err) = self.scheduler.lock().await.stop().await {
            error!("Sampling loop for session {} ended badly: {err:#}", open.session.id);
        }

        let session = open.session.close(Utc::now());
        let ended_at = session.ended_at.unwrap_or_else(Utc::now);

        match self.api.end_session(&session.id).await {
            Ok(summary) => {
                info!(
                    "Session {} closed: duration={:?}min attention={:?} break={:?}min",
                    session.id,
                    summary.total_duration,
                    summary.average_attention_score,
                    summary.recommended_break_duration
                );
                self.journal_close(
                    open.journal_entry_id.as_deref(),
                    JournalStatus::Closed,
                    ended_at,
                    Some(summary.clone()),
                )
                .await;
                Ok(SessionReport { session, summary })
            }
            Err(err) => {
                warn!("Session {} closed locally but not remotely: {err}", session.id);
                self.journal_close(
                    open.journal_entry_id.as_deref(),
                    JournalStatus::Unconfirmed,
                    ended_at,
                    None,
                )
                .await;
                Err(SessionStopError::from(err))
            }
        }
    }

    pub async fn is_open(&self) -> bool {
        self.state.lock().await.is_open()
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.state
            .lock()
            .await
            .current()
            .map(|open| open.session.clone())
    }

    pub fn live_state(&self) -> LiveState {
        self.board.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveState> {
        self.board.subscribe()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.board.history()
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionOverview>, ApiError> {
        self.api.list_sessions().await
    }

    pub async fn session_metrics(&self, session_id: &SessionId) -> Result<SessionMetrics, ApiError> {
        self.api.session_metrics(session_id).await
    }

    /// Stops the open session when the user signs out. Abort the returned
    /// handle to stop watching.
    pub fn watch_identity(&self) -> JoinHandle<()> {
        let controller = self.clone();
        let mut auth_rx = self.identity.subscribe();

        tokio::spawn(async move {
            while auth_rx.changed().await.is_ok() {
                let signed_out = matches!(*auth_rx.borrow_and_update(), AuthState::Unauthenticated);
                if !signed_out || !controller.is_open().await {
                    continue;
                }

                info!("Signed out; stopping the open session");
                match controller.stop().await {
                    Ok(_) | Err(SessionStopError::NotOpen) => {}
                    Err(err) => warn!("Session stop after sign-out incomplete: {err}"),
                }
            }
        })
    }

    async fn journal_close(
        &self,
        entry_id: Option<&str>,
        status: JournalStatus,
        ended_at: DateTime<Utc>,
        summary: Option<SessionSummary>,
    ) {
        let (Some(journal), Some(entry_id)) = (self.journal.as_ref(), entry_id) else {
            return;
        };
        if let Err(err) = journal
            .close_journal_entry(entry_id, status, ended_at, summary)
            .await
        {
            error!("Failed to update journal entry {entry_id}: {err:#}");
        }
    }
}
