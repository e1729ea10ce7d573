//! HTTP adapters for the backend API.

mod auth_client;
mod dto;
mod transport;

use std::time::Duration;

use reqwest::Client;

use crate::domain::errors::ApiError;

pub use auth_client::{HttpAuthClient, LOGIN_PATH, REFRESH_PATH};
pub use transport::ReqwestTransport;

const USER_AGENT: &str = concat!("stockwire/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by the transport and the auth client.
///
/// The cookie store carries the refresh cookie issued at login.
///
/// # Errors
/// Returns error if the TLS backend cannot be initialised.
pub fn build_client(timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .cookie_store(true)
        .build()
        .map_err(|e| ApiError::invalid_request(format!("failed to create HTTP client: {e}")))
}
