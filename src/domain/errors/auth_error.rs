//! Authentication error types.

use thiserror::Error;

/// Authentication error variants.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("session expired: {reason}")]
    SessionExpired { reason: String },

    #[error("cannot reach the server, check that the backend is running")]
    ServerUnreachable,

    #[error("request timed out, try again")]
    Timeout,

    #[error("network error during authentication: {message}")]
    NetworkError { message: String },

    #[error("malformed authentication response: {message}")]
    MalformedResponse { message: String },

    #[error("failed to read stored credential: {message}")]
    RetrievalFailed { message: String },

    #[error("failed to store credential: {message}")]
    StorageFailed { message: String },

    #[error("unexpected authentication error: {message}")]
    Unexpected { message: String },
}

impl AuthError {
    /// Creates session expired error.
    #[must_use]
    pub fn session_expired(reason: impl Into<String>) -> Self {
        Self::SessionExpired {
            reason: reason.into(),
        }
    }

    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates malformed response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Creates retrieval failed error.
    #[must_use]
    pub fn retrieval_failed(message: impl Into<String>) -> Self {
        Self::RetrievalFailed {
            message: message.into(),
        }
    }

    /// Creates storage failed error.
    #[must_use]
    pub fn storage_failed(message: impl Into<String>) -> Self {
        Self::StorageFailed {
            message: message.into(),
        }
    }

    /// Creates unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns whether the user can retry the same action.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ServerUnreachable | Self::Timeout | Self::NetworkError { .. }
        )
    }

    /// Returns whether the session must be reset and the user sent to login.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(AuthError::Timeout.is_recoverable());
        assert!(AuthError::network("reset").is_recoverable());
        assert!(!AuthError::InvalidCredentials.is_recoverable());
        assert!(AuthError::session_expired("refresh rejected").is_session_expired());
        assert!(!AuthError::storage_failed("disk full").is_session_expired());
    }
}
