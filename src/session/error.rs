use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionStartError {
    #[error("no signed-in user")]
    Unauthenticated,
    #[error("a session is already open")]
    AlreadyOpen,
    #[error("session service rejected the request (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("session service unreachable: {0}")]
    Unreachable(String),
    #[error("session service sent a malformed response: {0}")]
    MalformedResponse(String),
    #[error("sampling could not be started: {0}")]
    SamplingUnavailable(String),
}

impl From<ApiError> for SessionStartError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status, detail } => SessionStartError::Rejected { status, detail },
            ApiError::Transport(reason) => SessionStartError::Unreachable(reason),
            ApiError::Decode(reason) => SessionStartError::MalformedResponse(reason),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionStopError {
    #[error("no session is open")]
    NotOpen,
    #[error("session service rejected the close (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("session service unreachable: {0}")]
    Unreachable(String),
}

impl From<ApiError> for SessionStopError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status, detail } => SessionStopError::Rejected { status, detail },
            // An unreadable reply still means the close never got confirmed.
            ApiError::Transport(reason) | ApiError::Decode(reason) => {
                SessionStopError::Unreachable(reason)
            }
        }
    }
}
