use crate::models::Session;

/// The session currently owned by the controller, plus its journal row.
#[derive(Debug, Clone)]
pub struct OpenSession {
    pub session: Session,
    pub principal: String,
    pub journal_entry_id: Option<String>,
}

/// `Closed -> Open -> Closed`. Each open interval is a fresh `Session`.
#[derive(Debug, Default)]
pub struct SessionState {
    open: Option<OpenSession>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn current(&self) -> Option<&OpenSession> {
        self.open.as_ref()
    }

    pub fn begin(&mut self, open: OpenSession) {
        self.open = Some(open);
    }

    /// Drops the journal link when the row never made it to disk.
    pub fn forget_journal_entry(&mut self) {
        if let Some(open) = self.open.as_mut() {
            open.journal_entry_id = None;
        }
    }

    /// Moves to Closed, handing back what was open. A second call returns `None`.
    pub fn finish(&mut self) -> Option<OpenSession> {
        self.open.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionId;
    use chrono::Utc;

    #[test]
    fn finish_is_one_shot() {
        let mut state = SessionState::new();
        assert!(!state.is_open());

        state.begin(OpenSession {
            session: Session::open(SessionId::new("42"), Utc::now()),
            principal: "user-1".into(),
            journal_entry_id: None,
        });
        assert!(state.is_open());
        assert_eq!(state.current().map(|o| o.session.id.as_str()), Some("42"));

        let finished = state.finish().unwrap();
        assert_eq!(finished.session.id.as_str(), "42");
        assert!(state.finish().is_none());
        assert!(!state.is_open());
    }

    #[test]
    fn forgetting_the_journal_link_keeps_the_session_open() {
        let mut state = SessionState::new();
        state.begin(OpenSession {
            session: Session::open(SessionId::new("42"), Utc::now()),
            principal: "user-1".into(),
            journal_entry_id: Some("row-1".into()),
        });

        state.forget_journal_entry();
        let open = state.current().unwrap();
        assert!(open.journal_entry_id.is_none());
        assert_eq!(open.session.id.as_str(), "42");
    }
}
