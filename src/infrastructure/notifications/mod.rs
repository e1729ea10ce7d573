//! Live notification stream: framing, reconnection, and event fan-out.

mod client;
mod codec;
mod connection;
mod constants;
mod registry;
mod state;

pub use client::NotificationClient;
pub use codec::{SseDecoder, decode_event, parse_frame};
pub use connection::HttpEventStreamConnector;
pub use constants::{MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_BASE, RECONNECT_DELAY_MAX, STREAM_PATH};
pub use registry::{
    ConnectedCallback, ErrorCallback, EventCallback, NotificationRegistry, StreamSignal,
    SubscriptionId,
};
pub use state::{BackoffPolicy, Decision, ReconnectState};
