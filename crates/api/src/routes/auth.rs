//! Authentication route handlers.
//!
//! Handles registration, password login (JSON and form), and access token
//! refresh.

use axum::{
    Form, Json,
    extract::{
        State,
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::db::{Store, UnitOfWork};
use crate::error::{Result, set_sentry_user};
use crate::middleware::RequireUser;
use crate::models::User;
use crate::services::auth::{AuthService, Registration};
use crate::state::AppState;

/// Token type reported alongside every issued token.
const TOKEN_TYPE: &str = "Bearer";

// =============================================================================
// Request Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub admin: bool,
}

const fn default_active() -> bool {
    true
}

/// JSON login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Form login body. `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// Index response.
#[derive(Debug, Serialize)]
pub struct AuthIndexResponse {
    pub message: String,
    pub authenticated: bool,
}

/// Access and refresh token pair.
#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

/// A single access token.
#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Auth index.
pub async fn index() -> Json<AuthIndexResponse> {
    Json(AuthIndexResponse {
        message: "Auth routes: create-account, login, login-form, refresh".to_string(),
        authenticated: false,
    })
}

/// Register a new account.
pub async fn create_account<S: Store>(
    State(state): State<AppState<S>>,
    payload: std::result::Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let Json(body) = payload?;

    let mut unit = state.store().begin().await?;
    let user = AuthService::new(&mut unit, state.hasher(), state.tokens())
        .register(Registration {
            name: body.name,
            email: body.email,
            password: body.password,
            active: body.active,
            is_admin: body.admin,
        })
        .await?;
    unit.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Account created for {}", user.email),
        }),
    ))
}

/// Log in with a JSON body and receive an access and a refresh token.
pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPairResponse>> {
    let Json(body) = payload?;
    let user = check_credentials(&state, &body.email, &body.password).await?;

    Ok(Json(TokenPairResponse {
        access_token: state.tokens().issue_access(user.id)?,
        refresh_token: state.tokens().issue_refresh(user.id)?,
        token_type: TOKEN_TYPE,
    }))
}

/// Log in with form fields `username` and `password` and receive an access token.
pub async fn login_form<S: Store>(
    State(state): State<AppState<S>>,
    payload: std::result::Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<AccessTokenResponse>> {
    let Form(form) = payload?;
    let user = check_credentials(&state, &form.username, &form.password).await?;

    Ok(Json(AccessTokenResponse {
        access_token: state.tokens().issue_access(user.id)?,
        token_type: TOKEN_TYPE,
    }))
}

/// Exchange a valid bearer token for a fresh access token.
pub async fn refresh<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(user): RequireUser,
) -> Result<Json<AccessTokenResponse>> {
    tracing::debug!(user_id = %user.id, "access token refreshed");

    Ok(Json(AccessTokenResponse {
        access_token: state.tokens().issue_access(user.id)?,
        token_type: TOKEN_TYPE,
    }))
}

async fn check_credentials<S: Store>(
    state: &AppState<S>,
    email: &str,
    password: &str,
) -> Result<User> {
    let mut unit = state.store().begin().await?;
    let user = AuthService::new(&mut unit, state.hasher(), state.tokens())
        .authenticate_credentials(email, password)
        .await?;
    drop(unit);

    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "login succeeded");
    Ok(user)
}
