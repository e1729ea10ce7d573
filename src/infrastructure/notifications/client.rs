use std::sync::Arc;

use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, trace, warn};

use super::codec::decode_event;
use super::registry::NotificationRegistry;
use super::state::{BackoffPolicy, Decision, ReconnectState};
use crate::domain::StreamStatus;
use crate::domain::entities::AccessToken;
use crate::domain::errors::{StreamError, StreamResult};
use crate::domain::ports::{EventStreamConnector, FrameStream};

/// Keeps one notification stream alive.
///
/// Failed or dropped connections are retried with bounded exponential
/// backoff until the attempt budget is spent. Decoded events go to the
/// [`NotificationRegistry`].
pub struct NotificationClient {
    connector: Arc<dyn EventStreamConnector>,
    registry: Arc<NotificationRegistry>,
    state: Arc<Mutex<ReconnectState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationClient {
    #[must_use]
    pub fn new(connector: Arc<dyn EventStreamConnector>, policy: BackoffPolicy) -> Self {
        Self::with_registry(connector, Arc::new(NotificationRegistry::new()), policy)
    }

    #[must_use]
    pub fn with_registry(
        connector: Arc<dyn EventStreamConnector>,
        registry: Arc<NotificationRegistry>,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            connector,
            registry,
            state: Arc::new(Mutex::new(ReconnectState::new(policy))),
            task: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<NotificationRegistry> {
        &self.registry
    }

    /// Starts the connection task with `token`.
    ///
    /// Allowed from `Idle` and `Stopped`; counters are reset.
    ///
    /// # Errors
    /// Returns `StreamError::AlreadyConnected` if a connection task is active.
    pub fn connect(&self, token: AccessToken) -> StreamResult<()> {
        let mut task = self.task.lock();

        if task.as_ref().is_some_and(|h| !h.is_finished()) && self.status().is_active() {
            return Err(StreamError::AlreadyConnected);
        }
        if let Some(stale) = task.take() {
            stale.abort();
        }

        let epoch = self.state.lock().begin();
        info!(epoch, "Starting notification stream");

        *task = Some(tokio::spawn(run_stream_loop(
            self.connector.clone(),
            self.registry.clone(),
            self.state.clone(),
            token,
            epoch,
        )));

        Ok(())
    }

    /// Closes the stream and cancels any pending reconnect timer.
    pub fn disconnect(&self) {
        self.state.lock().close();

        if let Some(task) = self.task.lock().take() {
            task.abort();
            info!("Notification stream disconnected");
        }
    }

    #[must_use]
    pub fn status(&self) -> StreamStatus {
        self.state.lock().status()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status().is_open()
    }

    /// Consecutive failed attempts since the last successful connection.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.state.lock().attempts()
    }
}

impl Drop for NotificationClient {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

async fn run_stream_loop(
    connector: Arc<dyn EventStreamConnector>,
    registry: Arc<NotificationRegistry>,
    state: Arc<Mutex<ReconnectState>>,
    token: AccessToken,
    epoch: u64,
) {
    loop {
        if !update(&state, epoch, ReconnectState::transition_to_connecting) {
            return;
        }

        let failure = match connector.connect(&token).await {
            Ok(frames) => {
                if !update(&state, epoch, ReconnectState::transition_to_open) {
                    return;
                }
                info!("Notification stream connected");
                registry.dispatch_connected();
                pump(frames, &registry).await
            }
            Err(e) => e,
        };

        let decision = {
            let mut guard = state.lock();
            if !guard.is_current(epoch) {
                return;
            }
            guard.record_failure()
        };

        warn!(error = %failure, "Notification stream failed");
        registry.dispatch_error(&failure);

        match decision {
            Decision::Retry { attempt, delay } => {
                info!(
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Reconnecting notification stream"
                );
                sleep(delay).await;
            }
            Decision::GiveUp { attempts } => {
                error!(attempts, "Notification stream reconnection limit reached");
                registry.dispatch_error(&StreamError::ReconnectionLimitExceeded { attempts });
                return;
            }
        }
    }
}

fn update(state: &Mutex<ReconnectState>, epoch: u64, apply: fn(&mut ReconnectState)) -> bool {
    let mut guard = state.lock();
    if !guard.is_current(epoch) {
        debug!(epoch, "Stream task superseded");
        return false;
    }
    apply(&mut *guard);
    true
}

/// Delivers frames until the connection ends, returning why it ended.
async fn pump(mut frames: FrameStream, registry: &NotificationRegistry) -> StreamError {
    while let Some(item) = frames.next().await {
        match item {
            Ok(frame) => match decode_event(&frame) {
                Ok(Some(event)) => registry.dispatch_event(&event),
                Ok(None) => trace!(event = frame.event_name(), "Ignoring stream event"),
                Err(e) => warn!(error = %e, "Dropping malformed notification frame"),
            },
            Err(e) if e.should_reconnect() => return e,
            Err(e) => warn!(error = %e, "Dropping stream item"),
        }
    }

    StreamError::Closed
}
