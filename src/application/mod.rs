//! Application layer with credential services, use cases, and DTOs.

/// Data transfer objects.
pub mod dto;
/// Credential store, renewal coordinator, and request pipeline.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::{LoginRequest, LoginResponse};
pub use services::{CredentialStore, RefreshCoordinator, RequestPipeline};
pub use use_cases::LoginUseCase;
