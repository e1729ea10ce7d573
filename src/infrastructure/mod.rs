//! Infrastructure layer with external service adapters.

/// Wall-clock adapter.
pub mod clock;
/// Application configuration.
pub mod config;
/// Backend HTTP adapters.
pub mod http;
/// Live notification stream.
pub mod notifications;
/// Credential storage adapters.
pub mod storage;

pub use clock::SystemClock;
pub use config::{AppConfig, CliArgs, Command, LogLevel, StorageManager};
pub use http::{HttpAuthClient, ReqwestTransport, build_client};
pub use notifications::{
    BackoffPolicy, HttpEventStreamConnector, NotificationClient, NotificationRegistry,
    StreamSignal, SubscriptionId,
};
pub use storage::{FileKeyValueStore, MemoryKeyValueStore};
