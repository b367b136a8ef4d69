//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (store ping)
//!
//! # Auth
//! GET  /auth/                           - Auth index
//! POST /auth/create-account             - Register (JSON)
//! POST /auth/login                      - Access + refresh token (JSON)
//! POST /auth/login-form                 - Access token (form: username, password)
//! GET  /auth/refresh                    - New access token (bearer)
//!
//! # Orders (bearer)
//! GET  /orders/                         - Orders index
//! POST /orders/order                    - Create order
//! POST /orders/order/cancel/{order_id}  - Cancel order (owner or admin)
//! GET  /orders/list                     - All orders (admin)
//! POST /orders/order/add-item/{order_id}   - Add item (owner or admin)
//! POST /orders/order/remove-item/{item_id} - Remove item (owner or admin)
//! ```

pub mod auth;
pub mod health;
pub mod orders;

use axum::{
    Router,
    http::{Request, Response},
    middleware,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::db::Store;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Body of responses that only carry a message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Create the auth routes router.
pub fn auth_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/auth/", get(auth::index))
        .route("/auth/create-account", post(auth::create_account::<S>))
        .route("/auth/login", post(auth::login::<S>))
        .route("/auth/login-form", post(auth::login_form::<S>))
        .route("/auth/refresh", get(auth::refresh::<S>))
}

/// Create the order routes router.
pub fn order_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/orders/", get(orders::index))
        .route("/orders/order", post(orders::create_order::<S>))
        .route(
            "/orders/order/cancel/{order_id}",
            post(orders::cancel_order::<S>),
        )
        .route("/orders/list", get(orders::list_orders::<S>))
        .route(
            "/orders/order/add-item/{order_id}",
            post(orders::add_item::<S>),
        )
        .route(
            "/orders/order/remove-item/{item_id}",
            post(orders::remove_item::<S>),
        )
}

/// Create the full application router with tracing and request IDs.
///
/// Sentry layers are added by the binary on top of this.
pub fn router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness::<S>))
        .merge(auth_routes())
        .merge(order_routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
