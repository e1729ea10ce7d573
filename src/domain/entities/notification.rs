//! Push notification payloads.

use serde::{Deserialize, Serialize};

/// A single user notification.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(default)]
    pub read: bool,
    pub created_at: String,
}

/// What happened to a notification, the `type` field of a stream event.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    New,
    Read,
    Deleted,
    CountUpdate,
}

impl NotificationKind {
    /// Wire name of the event kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Read => "read",
            Self::Deleted => "deleted",
            Self::CountUpdate => "count_update",
        }
    }
}

/// Event delivered over the notification stream.
///
/// Both payload fields are optional for every kind; the backend sends
/// whichever it has.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl NotificationEvent {
    #[must_use]
    pub const fn new(kind: NotificationKind) -> Self {
        Self {
            kind,
            notification: None,
            count: None,
        }
    }

    /// Unread-count event.
    #[must_use]
    pub fn count_update(count: u64) -> Self {
        Self {
            count: Some(count),
            ..Self::new(NotificationKind::CountUpdate)
        }
    }

    #[must_use]
    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }

    #[must_use]
    pub const fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Unread count carried by the event, whatever its kind.
    #[must_use]
    pub const fn unread_count(&self) -> Option<u64> {
        self.count
    }
}
