//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response has a JSON body `{"kind": ..., "message": ...}` where
//! `kind` is a stable machine-readable tag.

use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, PathRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::orders::OrderError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl AppError {
    /// Whether this is a server-side failure.
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Auth(
                    AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenSigning(_)
                )
                | Self::Order(OrderError::Repository(_))
        )
    }

    /// Status, stable kind and client-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        // Don't expose internal error details to clients
        match self {
            Self::Auth(err) => match err {
                AuthError::EmailExists => (
                    StatusCode::CONFLICT,
                    "email_exists",
                    "An account with this email already exists".to_string(),
                ),
                AuthError::InvalidCredentials => (
                    StatusCode::BAD_REQUEST,
                    "invalid_credentials",
                    "Incorrect email or password".to_string(),
                ),
                AuthError::MissingToken | AuthError::InvalidToken | AuthError::UnknownUser => {
                    (StatusCode::UNAUTHORIZED, "unauthorized", err.to_string())
                }
                AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) => {
                    (StatusCode::BAD_REQUEST, "bad_request", err.to_string())
                }
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenSigning(_) => {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal",
                        "Internal server error".to_string(),
                    )
                }
            },
            Self::Order(err) => match err {
                OrderError::OrderNotFound(_)
                | OrderError::ItemNotFound(_)
                | OrderError::OwnerNotFound(_) => {
                    (StatusCode::NOT_FOUND, "not_found", err.to_string())
                }
                OrderError::Forbidden | OrderError::AdminOnly => {
                    (StatusCode::FORBIDDEN, "forbidden", err.to_string())
                }
                OrderError::TotalOutOfRange(_) => {
                    (StatusCode::BAD_REQUEST, "bad_request", err.to_string())
                }
                OrderError::Repository(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error".to_string(),
                ),
            },
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message.clone()),
            Self::Database(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, kind, message) = self.parts();
        let body = Json(ErrorBody { kind, message });

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use order_desk_core::{OrderId, OrderItemId, PriceError};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AuthError::EmailExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AuthError::InvalidToken.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::UnknownUser.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(OrderError::Forbidden.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(OrderError::AdminOnly.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(OrderError::OrderNotFound(OrderId::new(1)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(OrderError::ItemNotFound(OrderItemId::new(1)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(OrderError::TotalOutOfRange(PriceError::Overflow).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = AppError::from(AuthError::MissingToken).into_response();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let (_, kind, message) = AppError::Internal("secret detail".to_string()).parts();
        assert_eq!(kind, "internal");
        assert!(!message.contains("secret detail"));
    }

    #[test]
    fn test_kinds_are_stable() {
        let (_, kind, _) = AppError::from(AuthError::EmailExists).parts();
        assert_eq!(kind, "email_exists");
        let (_, kind, _) = AppError::from(AuthError::InvalidCredentials).parts();
        assert_eq!(kind, "invalid_credentials");
        let (_, kind, message) = AppError::from(AuthError::UnknownUser).parts();
        assert_eq!(kind, "unauthorized");
        assert_eq!(message, "no such user");
    }
}
