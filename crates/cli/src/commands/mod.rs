//! Subcommand implementations.

pub mod migrate;
pub mod user;

use order_desk_api::config::{ApiConfig, ConfigError, StoreConfig};
use order_desk_api::db::{self, PgStore, RepositoryError};
use order_desk_api::services::auth::AuthError;
use order_desk_api::state::{AppState, StateError};
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Required environment variable is missing: {0}")]
    MissingEnvVar(&'static str),

    #[error("ORDERS_STORE=memory has no database to manage")]
    MemoryStore,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Application state error: {0}")]
    State(#[from] StateError),

    #[error("Account error: {0}")]
    Auth(#[from] AuthError),
}

/// Load the server configuration and connect to its database.
async fn connect() -> Result<AppState<PgStore>, CliError> {
    let config = ApiConfig::from_env()?;

    let StoreConfig::Postgres { database_url } = &config.store else {
        return Err(CliError::MemoryStore);
    };

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(database_url).await?;

    Ok(AppState::new(config, PgStore::new(pool))?)
}
