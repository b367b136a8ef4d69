//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, password login, bearer tokens
//! - `orders` - Order mutation with ownership checks and total recomputation
//!
//! Services borrow the request's unit of work and never commit it; the
//! caller commits once the whole operation has succeeded.

pub mod auth;
pub mod orders;
