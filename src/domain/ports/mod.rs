//! Port definitions for the adapters the core depends on.

mod auth_port;
mod clock_port;
mod event_stream_port;
mod http_transport_port;
mod key_value_store_port;

pub use auth_port::AuthPort;
pub use clock_port::Clock;
pub use event_stream_port::{EventStreamConnector, FrameStream, StreamFrame};
pub use http_transport_port::{ApiRequest, ApiResponse, HttpTransport};
pub use key_value_store_port::{KeyValueStore, StorageScope};

#[cfg(test)]
pub mod mocks {
    pub use super::auth_port::mock::MockAuthPort;
    pub use super::clock_port::mock::ManualClock;
    pub use super::event_stream_port::mock::{ScriptedAttempt, ScriptedConnector};
    pub use super::http_transport_port::mock::ScriptedTransport;
    pub use super::key_value_store_port::mock::MockKeyValueStore;
}
