//! Account domain types.

use chrono::{DateTime, Utc};

use order_desk_core::{Email, UserId};

/// A registered account (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Normalized email address, unique across accounts.
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Whether the account is active.
    pub active: bool,
    /// Admins may act on any order and list all orders.
    pub is_admin: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Data for inserting a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub active: bool,
    pub is_admin: bool,
}

impl User {
    /// Whether this user may act on an order owned by `owner`.
    #[must_use]
    pub fn can_manage(&self, owner: UserId) -> bool {
        self.is_admin || self.id == owner
    }
}
