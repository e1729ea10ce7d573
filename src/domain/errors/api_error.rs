//! Authenticated request pipeline error types.

use thiserror::Error;

use super::AuthError;

/// Result alias for pipeline operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure surfaced by the request pipeline to its caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ApiError {
    /// Network unreachable, timeout, or broken connection. Never retried.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        timeout: bool,
        connect: bool,
    },

    /// Still unauthorized after renewing the credential and replaying once.
    #[error("request unauthorized after credential renewal")]
    Unauthorized,

    /// Renewal failed; the stored credential has been cleared.
    #[error(transparent)]
    SessionExpired(AuthError),

    #[error("failed to decode response body: {message}")]
    Decode { message: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl ApiError {
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timeout: false,
            connect: false,
        }
    }

    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timeout: true,
            connect: false,
        }
    }

    #[must_use]
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timeout: false,
            connect: true,
        }
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Returns whether the caller should send the user back to login.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }

    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<ApiError> for AuthError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::SessionExpired(inner) => inner,
            ApiError::Transport { timeout: true, .. } => Self::Timeout,
            ApiError::Transport { connect: true, .. } => Self::ServerUnreachable,
            ApiError::Transport { message, .. } => Self::network(message),
            ApiError::Unauthorized => Self::InvalidCredentials,
            ApiError::Decode { message } => Self::malformed(message),
            ApiError::InvalidRequest { message } => Self::unexpected(message),
        }
    }
}
