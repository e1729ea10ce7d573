//! Stockwire - networking core for a stock-market viewer.
//!
//! This crate keeps an access credential, renews it at most once at a time,
//! replays requests rejected with 401, and holds a reconnecting server-sent
//! event stream of notifications.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing services, use cases, and DTOs.
pub mod application;
/// Facade bundling the networking core for callers.
pub mod client;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

pub use client::{NotificationOptions, SetupError, StockwireClient};

/// Current version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = "stockwire";
