pub mod controller;
pub mod error;
pub mod recovery;
pub mod state;

pub use controller::{SessionConfig, SessionController};
pub use error::{SessionStartError, SessionStopError};
pub use recovery::{recover_unfinished, RecoveryReport};
pub use state::{OpenSession, SessionState};
