//! Domain models for accounts and orders.
//!
//! These are validated domain objects, separate from database row types.

pub mod order;
pub mod user;

pub use order::{NewOrderItem, Order, OrderItem, order_total};
pub use user::{NewUser, User};
