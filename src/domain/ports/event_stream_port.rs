//! Push-stream connector port.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::entities::AccessToken;
use crate::domain::errors::StreamResult;

/// One frame of a text event stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamFrame {
    /// Event name; `None` for the default event.
    pub event: Option<String>,
    /// Payload, with multi-line data joined by `\n`.
    pub data: String,
    /// Last event id, if the server sent one.
    pub id: Option<String>,
}

impl StreamFrame {
    #[must_use]
    pub fn new(event: Option<&str>, data: impl Into<String>) -> Self {
        Self {
            event: event.map(str::to_string),
            data: data.into(),
            id: None,
        }
    }

    /// Event name with the default applied.
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.event.as_deref().unwrap_or("message")
    }
}

/// Frames of one live connection; the stream ends when the server closes it.
pub type FrameStream = BoxStream<'static, StreamResult<StreamFrame>>;

/// Port that opens one push-stream connection.
#[async_trait]
pub trait EventStreamConnector: Send + Sync {
    /// Opens a connection authenticated with `token`.
    ///
    /// Resolves once the server has accepted the stream.
    async fn connect(&self, token: &AccessToken) -> StreamResult<FrameStream>;
}
