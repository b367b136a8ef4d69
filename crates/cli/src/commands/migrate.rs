//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! od-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ORDERS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ORDERS_SECRET_KEY` - Required because the full server configuration is loaded
//!
//! Migrations live in `crates/api/migrations/`.

use order_desk_api::db::{MIGRATOR, Store};

use super::CliError;

/// Run all pending migrations.
///
/// # Errors
///
/// Returns `CliError` if configuration is invalid, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let state = super::connect().await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(state.store().pool()).await?;

    state.store().ping().await?;
    tracing::info!("Migrations complete!");
    Ok(())
}
