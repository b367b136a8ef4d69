//! Persistence for accounts and orders.
//!
//! Every request works through exactly one [`UnitOfWork`] obtained from a
//! [`Store`]. Changes become visible only after [`UnitOfWork::commit`];
//! dropping a unit without committing discards them, so an early return or
//! `?` anywhere in a handler leaves the store untouched.
//!
//! # Backends
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx. A unit of work is a transaction.
//! - [`MemoryStore`] - in-process tables for development and tests. A unit
//!   of work holds the store lock and edits a private copy of the tables.
//!
//! # Tables
//!
//! - `users` - Accounts (email unique, normalized)
//! - `orders` - Orders owned by a user
//! - `order_items` - Line items, deleted with their order
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/`, embedded as
//! [`MIGRATOR`], and run via:
//! ```bash
//! cargo run -p order-desk-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use order_desk_core::{Email, OrderId, OrderItemId, OrderStatus, Price, UserId};

use crate::models::{NewOrderItem, NewUser, Order, OrderItem, User};

pub use memory::{MemoryStore, MemoryUnit};
pub use postgres::{PgStore, PgUnitOfWork};

/// Schema migrations for the `PostgreSQL` backend.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// A source of units of work.
///
/// Cloning a store is cheap and yields a handle to the same data.
pub trait Store: Clone + Send + Sync + 'static {
    /// The unit of work type handed out by [`Store::begin`].
    type Unit: UnitOfWork;

    /// Start a new unit of work.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if no connection can be acquired.
    fn begin(&self) -> impl Future<Output = Result<Self::Unit, RepositoryError>> + Send;

    /// Check that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the store does not answer.
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// One request's scoped handle to the store.
///
/// Reads see the unit's own uncommitted writes. Dropping the unit without
/// calling [`commit`](UnitOfWork::commit) rolls everything back.
pub trait UnitOfWork: UserStore + OrderStore + Send + Sized {
    /// Make all writes of this unit durable and visible.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the commit fails; nothing is
    /// persisted in that case.
    fn commit(self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Account lookups and registration.
pub trait UserStore {
    /// Find a user by (normalized) email.
    fn find_user_by_email(
        &mut self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Find a user by id.
    fn find_user_by_id(
        &mut self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Insert a new user.
    ///
    /// Returns `RepositoryError::Conflict` if the email is already taken.
    fn insert_user(
        &mut self,
        user: NewUser,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;
}

/// Orders and their line items.
pub trait OrderStore {
    /// Insert a `PENDING` order with a zero total.
    fn insert_order(
        &mut self,
        owner: UserId,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// Find an order by id.
    fn find_order(
        &mut self,
        id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Find an order by id and hold it against concurrent mutation until
    /// the unit of work ends.
    fn lock_order(
        &mut self,
        id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// All orders, ordered by id ascending.
    fn list_orders(&mut self) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;

    /// Set an order's status. Returns `RepositoryError::NotFound` if the order is gone.
    fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// Store a recomputed total. Returns `RepositoryError::NotFound` if the order is gone.
    fn update_order_total(
        &mut self,
        id: OrderId,
        total: Price,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// Delete an order together with all of its items.
    ///
    /// Returns `false` if the order did not exist.
    fn delete_order(
        &mut self,
        id: OrderId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Add a line item to an order.
    fn insert_item(
        &mut self,
        order_id: OrderId,
        item: NewOrderItem,
    ) -> impl Future<Output = Result<OrderItem, RepositoryError>> + Send;

    /// Find a line item by id.
    fn find_item(
        &mut self,
        id: OrderItemId,
    ) -> impl Future<Output = Result<Option<OrderItem>, RepositoryError>> + Send;

    /// Delete a line item. Returns `false` if it did not exist.
    fn delete_item(
        &mut self,
        id: OrderItemId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// The items of an order, ordered by id ascending.
    fn find_items_by_order(
        &mut self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<Vec<OrderItem>, RepositoryError>> + Send;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
