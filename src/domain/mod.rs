//! Domain layer with core entities, errors, and port definitions.

/// Notification stream status.
pub mod connection;
/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Serde helpers.
pub mod serde_utils;

pub use connection::StreamStatus;
pub use entities::{AccessToken, Credential, NotificationEvent, NotificationKind};
pub use errors::{ApiError, AuthError, StreamError};
pub use ports::{AuthPort, Clock, EventStreamConnector, HttpTransport, KeyValueStore, StorageScope};
