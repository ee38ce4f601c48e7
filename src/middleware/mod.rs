//! HTTP middleware
//!
//! - `AuthUser` extractor for routes acting on the session's own account
//! - `ObservabilityLayer` for request IDs and HTTP metrics
//! - JSON normalization of framework error responses

pub mod auth;
pub mod error_response;
pub mod metrics;

pub use auth::{AuthError, AuthUser};
pub use error_response::normalize_error_response;
pub use metrics::ObservabilityLayer;
