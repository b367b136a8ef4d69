//! Order Desk API library.
//!
//! Account registration, bearer-token authentication and order management
//! over HTTP. The binary in `main.rs` wires configuration, tracing and Sentry
//! around [`routes::router`]; tests drive the same router over
//! [`db::MemoryStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
