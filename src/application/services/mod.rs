//! Credential and request services shared by every caller.

mod credential_store;
mod refresh_coordinator;
mod request_pipeline;

pub use credential_store::{CREDENTIAL_KEYS, CredentialStore};
pub use refresh_coordinator::RefreshCoordinator;
pub use request_pipeline::RequestPipeline;
