use thiserror::Error;

pub type StreamResult<T> = Result<T, StreamError>;

/// Notification stream failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("stream rejected with status {status}")]
    Rejected { status: u16 },

    #[error("stream closed by server")]
    Closed,

    #[error("stream transport error: {message}")]
    Transport { message: String },

    #[error("protocol error: {message}")]
    Protocol { message: String },

    #[error("failed to decode event: {message}")]
    Decode { message: String },

    #[error("reconnection limit exceeded after {attempts} attempts")]
    ReconnectionLimitExceeded { attempts: u32 },

    #[error("already connecting or connected")]
    AlreadyConnected,
}

impl StreamError {
    #[must_use]
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns whether the failure ends the current connection and should
    /// schedule another attempt.
    #[must_use]
    pub const fn should_reconnect(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. }
            | Self::Rejected { .. }
            | Self::Closed
            | Self::Transport { .. }
            | Self::Protocol { .. } => true,

            Self::Decode { .. }
            | Self::ReconnectionLimitExceeded { .. }
            | Self::AlreadyConnected => false,
        }
    }

    /// Returns whether no further automatic attempts will follow.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::ReconnectionLimitExceeded { .. })
    }
}
