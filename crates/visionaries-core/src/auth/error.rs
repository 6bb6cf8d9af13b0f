use thiserror::Error;

use crate::api::BackendError;
use crate::store::StoreError;

/// Message used when a backend call could not complete and gave no reason.
pub const GENERIC_TRANSPORT_MESSAGE: &str = "Network error";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    TransportFailure(String),

    #[error("Refresh rejected: {0}")]
    RefreshRejected(String),

    #[error("Storage error: {0}")]
    StoreFailure(String),

    #[error("Another login or refresh is already in progress")]
    Busy,

    #[error("Session changed while the request was in flight")]
    Superseded,
}

impl SessionError {
    /// Map a backend failure during login.
    pub(crate) fn from_login(err: BackendError) -> Self {
        match err {
            BackendError::Rejected(msg) => SessionError::InvalidCredentials(msg),
            BackendError::Transport(msg) if msg.trim().is_empty() => {
                SessionError::TransportFailure(GENERIC_TRANSPORT_MESSAGE.to_string())
            }
            BackendError::Transport(msg) => SessionError::TransportFailure(msg),
        }
    }

    /// Map a backend failure during refresh.
    pub(crate) fn from_refresh(err: BackendError) -> Self {
        match err {
            BackendError::Rejected(msg) => SessionError::RefreshRejected(msg),
            BackendError::Transport(msg) => SessionError::TransportFailure(msg),
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        SessionError::StoreFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_error_mapping() {
        assert_eq!(
            SessionError::from_login(BackendError::Rejected("Invalid credentials".into())),
            SessionError::InvalidCredentials("Invalid credentials".into())
        );
        assert_eq!(
            SessionError::from_login(BackendError::Transport(String::new())),
            SessionError::TransportFailure(GENERIC_TRANSPORT_MESSAGE.into())
        );
        assert_eq!(
            SessionError::from_login(BackendError::Transport("connection reset".into())).to_string(),
            "connection reset"
        );
    }

    #[test]
    fn test_refresh_error_mapping() {
        assert_eq!(
            SessionError::from_refresh(BackendError::Rejected("revoked".into())),
            SessionError::RefreshRejected("revoked".into())
        );
    }

    #[test]
    fn test_store_error_becomes_store_failure() {
        let err = SessionError::from(StoreError::from(std::io::Error::other("disk full")));
        assert_eq!(err, SessionError::StoreFailure("I/O error: disk full".into()));
        assert_eq!(err.to_string(), "Storage error: I/O error: disk full");
    }
}
