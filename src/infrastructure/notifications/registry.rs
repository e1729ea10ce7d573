//! Fan-out of decoded stream events to subscribers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::entities::NotificationEvent;
use crate::domain::errors::StreamError;

use super::constants::SIGNAL_CHANNEL_CAPACITY;

pub type EventCallback = Arc<dyn Fn(&NotificationEvent) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&StreamError) + Send + Sync>;
pub type ConnectedCallback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by every registration, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Everything the stream reports, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    Connected,
    Event(NotificationEvent),
    Error(StreamError),
}

struct Subscribers<T> {
    entries: RwLock<Vec<(SubscriptionId, T)>>,
}

impl<T: Clone> Subscribers<T> {
    const fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    fn add(&self, id: SubscriptionId, callback: T) {
        self.entries.write().push((id, callback));
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    // Callbacks run outside the lock so they may register or unsubscribe.
    fn snapshot(&self) -> Vec<T> {
        self.entries.read().iter().map(|(_, cb)| cb.clone()).collect()
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// Subscription list for notification events, stream errors, and connects.
///
/// Callbacks are invoked synchronously in registration order, on the task
/// that reads the stream. The same signals are also published on a broadcast
/// channel for consumers that prefer a queue.
pub struct NotificationRegistry {
    next_id: AtomicU64,
    events: Subscribers<EventCallback>,
    errors: Subscribers<ErrorCallback>,
    connected: Subscribers<ConnectedCallback>,
    signals: broadcast::Sender<StreamSignal>,
}

impl NotificationRegistry {
    #[must_use]
    pub fn new() -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        Self {
            next_id: AtomicU64::new(1),
            events: Subscribers::new(),
            errors: Subscribers::new(),
            connected: Subscribers::new(),
            signals,
        }
    }

    pub fn on_event(
        &self,
        callback: impl Fn(&NotificationEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.events.add(id, Arc::new(callback));
        id
    }

    pub fn on_error(
        &self,
        callback: impl Fn(&StreamError) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.errors.add(id, Arc::new(callback));
        id
    }

    pub fn on_connected(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = self.next_id();
        self.connected.add(id, Arc::new(callback));
        id
    }

    /// Removes a registration of any kind. Returns whether it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.remove(id) || self.errors.remove(id) || self.connected.remove(id)
    }

    /// Receives every signal dispatched after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StreamSignal> {
        self.signals.subscribe()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.events.len() + self.errors.len() + self.connected.len()
    }

    pub fn dispatch_event(&self, event: &NotificationEvent) {
        trace!(kind = event.kind.as_str(), "Dispatching notification event");
        for callback in self.events.snapshot() {
            callback(event);
        }
        let _ = self.signals.send(StreamSignal::Event(event.clone()));
    }

    pub fn dispatch_error(&self, error: &StreamError) {
        for callback in self.errors.snapshot() {
            callback(error);
        }
        let _ = self.signals.send(StreamSignal::Error(error.clone()));
    }

    pub fn dispatch_connected(&self) {
        for callback in self.connected.snapshot() {
            callback();
        }
        let _ = self.signals.send(StreamSignal::Connected);
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for NotificationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
