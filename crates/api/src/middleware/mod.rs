//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions) - added in `main`
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Request ID (add unique ID to each request)
//!
//! Bearer authentication is an extractor ([`RequireUser`]) rather than a
//! layer, so public and protected routes share one router.

pub mod auth;
pub mod request_id;

pub use auth::{RequireUser, bearer_token};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
