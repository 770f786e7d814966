//! Identity boundary. The actual sign-in flow lives elsewhere; this side only
//! needs "who is signed in right now" and a way to hear about changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub uid: String,
    pub display_name: Option<String>,
}

impl Principal {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Provider has not reported yet.
    #[default]
    Unknown,
    Unauthenticated,
    Authenticated(Principal),
}

impl AuthState {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            AuthState::Authenticated(principal) => Some(principal),
            AuthState::Unknown | AuthState::Unauthenticated => None,
        }
    }
}

pub trait IdentityProvider: Send + Sync {
    fn current(&self) -> AuthState;

    fn subscribe(&self) -> watch::Receiver<AuthState>;
}

/// In-process provider fed by whatever performs the sign-in.
#[derive(Clone)]
pub struct IdentityHandle {
    tx: Arc<watch::Sender<AuthState>>,
}

impl IdentityHandle {
    pub fn new(initial: AuthState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn signed_in(principal: Principal) -> Self {
        Self::new(AuthState::Authenticated(principal))
    }

    pub fn set(&self, state: AuthState) {
        self.tx.send_replace(state);
    }

    pub fn sign_out(&self) {
        self.set(AuthState::Unauthenticated);
    }
}

impl Default for IdentityHandle {
    fn default() -> Self {
        Self::new(AuthState::Unknown)
    }
}

impl IdentityProvider for IdentityHandle {
    fn current(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }
}
