//! Domain error types.

mod api_error;
mod auth_error;
mod stream_error;

pub use api_error::{ApiError, ApiResult};
pub use auth_error::AuthError;
pub use stream_error::{StreamError, StreamResult};
