//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error body is JSON: `{"detail": "<message>"}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::permissions::PermissionDenied;
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

    /// Order placement or status change failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::MissingReference(_) => StatusCode::BAD_REQUEST,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InactiveAccount => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidField(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Order(err) => match err {
                OrderError::NotCustomer | OrderError::NotOrderStore => StatusCode::FORBIDDEN,
                OrderError::NotFound => StatusCode::NOT_FOUND,
                OrderError::Conflict => StatusCode::CONFLICT,
                OrderError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
                OrderError::Repository(RepositoryError::MissingReference(_)) => {
                    StatusCode::BAD_REQUEST
                }
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                OrderError::Invalid(_)
                | OrderError::EmptyOrder
                | OrderError::DuplicateFood(_)
                | OrderError::InvalidQuantity(_)
                | OrderError::FoodNotFound(_)
                | OrderError::FoodUnavailable(_)
                | OrderError::WrongStore { .. }
                | OrderError::StoreUnavailable(_)
                | OrderError::PaymentMethodUnavailable(_)
                | OrderError::Money(_)
                | OrderError::Transition(_) => StatusCode::BAD_REQUEST,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients.
    fn detail(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found.".to_string(),
            Self::Database(
                RepositoryError::Conflict(msg) | RepositoryError::MissingReference(msg),
            ) => msg.clone(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid username or password".to_string(),
                AuthError::InactiveAccount => "This account has been disabled".to_string(),
                AuthError::UserAlreadyExists => {
                    "A user with that username already exists".to_string()
                }
                AuthError::WeakPassword(msg) | AuthError::InvalidField(msg) => msg.clone(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_string()
                }
            },
            Self::Order(OrderError::Repository(
                RepositoryError::Conflict(msg) | RepositoryError::MissingReference(msg),
            )) => msg.clone(),
            Self::Order(err) if !self.status().is_server_error() => err.to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::RateLimited => "Too many requests, slow down".to_string(),
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Order(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

impl From<PermissionDenied> for AppError {
    fn from(err: PermissionDenied) -> Self {
        Self::Forbidden(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::NotFound(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use foodloc_core::{FoodId, OrderStatus, TransitionError};
    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("food 12".to_string());
        assert_eq!(err.to_string(), "Not found: food 12");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_map_to_client_statuses() {
        assert_eq!(
            AppError::from(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(RepositoryError::Conflict("tag already exists".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(RepositoryError::DataCorruption("bad".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_order_errors() {
        let illegal = OrderError::Transition(TransitionError {
            from: OrderStatus::Pending,
            to: OrderStatus::Succeeded,
        });
        assert_eq!(AppError::from(illegal).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(OrderError::NotOrderStore).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(OrderError::NotCustomer).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::from(OrderError::Conflict).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::from(OrderError::FoodUnavailable(FoodId::new(1))).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::UserAlreadyExists).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(AuthError::WeakPassword("short".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_body_is_json_detail() {
        let (status, body) = body_json(AppError::from(OrderError::EmptyOrder)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "order must contain at least one item");
    }

    #[tokio::test]
    async fn test_missing_reference_is_bad_request() {
        let (status, body) = body_json(AppError::from(RepositoryError::MissingReference(
            "tag does not exist".into(),
        )))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "tag does not exist");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (status, body) =
            body_json(AppError::Internal("connection string leaked".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Internal server error");
    }

    #[test]
    fn test_permission_denied_is_forbidden() {
        let err = AppError::from(PermissionDenied("nope"));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.detail(), "nope");
    }
}
