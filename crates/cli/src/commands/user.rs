//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! ORDERS_CLI_PASSWORD='...' od-cli user create -e admin@example.com -n "Admin Name" --admin
//! ```
//!
//! The password is read from `ORDERS_CLI_PASSWORD` so it never lands in
//! shell history.

use order_desk_api::db::{Store, UnitOfWork};
use order_desk_api::services::auth::{AuthService, Registration};
use order_desk_core::UserId;
use secrecy::{ExposeSecret, SecretString};

use super::CliError;

const PASSWORD_ENV: &str = "ORDERS_CLI_PASSWORD";

/// Account details collected from the command line.
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub admin: bool,
    pub active: bool,
}

/// Create an account through the same registration path as the API.
///
/// # Errors
///
/// Returns `CliError::MissingEnvVar` if no password was supplied, or
/// `CliError::Auth` if the email is taken or the input is invalid.
pub async fn create(account: NewAccount) -> Result<UserId, CliError> {
    let password = std::env::var(PASSWORD_ENV)
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar(PASSWORD_ENV))?;

    let state = super::connect().await?;
    let mut unit = state.store().begin().await?;

    tracing::info!("Creating account: {}", account.email);

    let user = AuthService::new(&mut unit, state.hasher(), state.tokens())
        .register(Registration {
            name: account.name,
            email: account.email,
            password: password.expose_secret().to_owned(),
            active: account.active,
            is_admin: account.admin,
        })
        .await?;

    unit.commit().await?;

    tracing::info!(
        "Account created successfully! ID: {}, Email: {}, Admin: {}",
        user.id,
        user.email,
        user.is_admin
    );
    if !user.active {
        tracing::warn!("Account is inactive");
    }

    Ok(user.id)
}
