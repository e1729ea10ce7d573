/// Lifecycle of the notification stream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamStatus {
    /// Not connected and not trying to be.
    #[default]
    Idle,
    /// Opening the stream.
    Connecting,
    /// Stream open and delivering frames.
    Open,
    /// Waiting before the next attempt.
    Backoff,
    /// Gave up after too many failures; only `connect` leaves this state.
    Stopped,
}

impl StreamStatus {
    /// Returns whether a connection task owns this state.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Open | Self::Backoff)
    }

    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl std::fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
            Self::Backoff => write!(f, "Backoff"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}
