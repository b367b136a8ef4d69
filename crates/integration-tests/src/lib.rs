//! Integration tests for Order Desk.
//!
//! These tests need real infrastructure and are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Store and service tests against PostgreSQL (migrations are applied)
//! ORDERS_TEST_DATABASE_URL=postgres://localhost/order_desk_test \
//!     cargo test -p order-desk-integration-tests -- --ignored
//!
//! # HTTP tests against a running server
//! ORDERS_BASE_URL=http://127.0.0.1:8000 \
//!     cargo test -p order-desk-integration-tests --test live_server -- --ignored
//! ```
//!
//! Tests share one database and run in parallel, so every test registers
//! accounts with [`unique_email`] and never assumes specific ids.

use order_desk_api::config::PasswordHashConfig;
use order_desk_api::db::{self, MIGRATOR, PgStore, PgUnitOfWork, Store, UnitOfWork, UserStore};
use order_desk_api::models::{NewUser, User};
use order_desk_api::services::auth::PasswordHasher;
use order_desk_core::Email;
use secrecy::SecretString;

/// Connection string for the test database.
pub const DATABASE_URL_ENV: &str = "ORDERS_TEST_DATABASE_URL";

/// Base URL of a running API server.
pub const BASE_URL_ENV: &str = "ORDERS_BASE_URL";

/// Password given to every account these tests register.
pub const PASSWORD: &str = "correct horse battery";

/// Connect to the test database and bring its schema up to date.
///
/// # Panics
///
/// Panics if `ORDERS_TEST_DATABASE_URL` is unset or the database is unreachable.
pub async fn test_store() -> PgStore {
    let url = std::env::var(DATABASE_URL_ENV)
        .unwrap_or_else(|_| panic!("{DATABASE_URL_ENV} must be set for database tests"));

    let pool = db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database");
    MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    PgStore::new(pool)
}

/// Base URL of the server under test, without a trailing slash.
#[must_use]
pub fn base_url() -> String {
    std::env::var(BASE_URL_ENV)
        .unwrap_or_else(|_| "http://127.0.0.1:8000".to_owned())
        .trim_end_matches('/')
        .to_owned()
}

/// An email address no other test run has used.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", uuid::Uuid::new_v4().simple())
}

/// Argon2 with minimal cost; enough to exercise the real code path.
///
/// # Panics
///
/// Never with these parameters.
#[must_use]
pub fn cheap_hasher() -> PasswordHasher {
    PasswordHasher::new(&PasswordHashConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .expect("valid argon2 parameters")
}

/// Insert and commit an account with a fresh email.
///
/// # Panics
///
/// Panics on any database error.
pub async fn seed_user(store: &PgStore, is_admin: bool) -> User {
    let mut unit: PgUnitOfWork = store.begin().await.expect("begin");
    let user = unit
        .insert_user(NewUser {
            name: "Integration".to_owned(),
            email: Email::parse(&unique_email("seed")).expect("valid email"),
            password_hash: cheap_hasher().hash(PASSWORD).expect("hash"),
            active: true,
            is_admin,
        })
        .await
        .expect("insert user");
    unit.commit().await.expect("commit");
    user
}
