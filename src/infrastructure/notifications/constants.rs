use std::time::Duration;

pub const STREAM_PATH: &str = "/api/notifications/stream";
pub const TOKEN_QUERY_PARAM: &str = "token";
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

pub const EVENT_NOTIFICATION: &str = "notification";
pub const EVENT_COUNT_UPDATE: &str = "count_update";
pub const EVENT_DEFAULT: &str = "message";

pub const RECONNECT_DELAY_BASE: Duration = Duration::from_millis(3_000);
pub const RECONNECT_DELAY_MAX: Duration = Duration::from_millis(30_000);
pub const RECONNECT_GROWTH_FACTOR: f64 = 1.5;
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Largest unfinished frame the decoder buffers before dropping the connection.
pub const MAX_PENDING_BYTES: usize = 1024 * 1024;

pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

pub const SIGNAL_CHANNEL_CAPACITY: usize = 64;
