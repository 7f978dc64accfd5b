//! Bridge-local error type and its mapping to the wire-visible
//! `{code, message}` shape every bridge response carries on failure.

use cordon_chain::{CoreError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("unknown request type: {0}")]
    UnknownType(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("another authorization is already in progress")]
    AuthInProgress,

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl BridgeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownType(_) | Self::MalformedRequest(_) => ErrorCode::Unknown,
            Self::AuthInProgress => ErrorCode::AuthInProgress,
            Self::Core(e) => e.code(),
        }
    }
}
