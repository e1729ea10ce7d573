//! Domain entity definitions.

mod credential;
mod notification;
mod token;

pub use credential::{ADMIN_ROLE, Credential, DEFAULT_TIER, TokenGrant, UserProfile};
pub use notification::{Notification, NotificationEvent, NotificationKind};
pub use token::AccessToken;
