use std::sync::OnceLock;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    config::AppEnvironment,
    response::{ApiResponse, Meta},
};

static ENVIRONMENT: OnceLock<AppEnvironment> = OnceLock::new();

/// Record the running environment once at startup. Store and driver detail is
/// only attached to error bodies in development.
pub fn set_environment(env: AppEnvironment) {
    let _ = ENVIRONMENT.set(env);
}

fn expose_details() -> bool {
    matches!(ENVIRONMENT.get(), Some(AppEnvironment::Development))
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Format(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("Verification code expired")]
    ExpiredCode,

    #[error("Forbidden")]
    Forbidden,

    #[error("Could not deliver verification code")]
    Delivery(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::Format(_)
            | AppError::InvalidCode
            | AppError::ExpiredCode => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) | AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials
            | AppError::MissingToken
            | AppError::InvalidToken
            | AppError::ExpiredToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Delivery(_) => StatusCode::BAD_GATEWAY,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            AppError::Delivery(detail) => Some(detail.clone()),
            AppError::DbError(err) => Some(err.to_string()),
            AppError::OrmError(err) => Some(err.to_string()),
            AppError::Internal(err) => Some(format!("{err:#}")),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let details = if expose_details() { self.details() } else { None };

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData {
                error: message,
                details,
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// True when the store rejected a write because of a UNIQUE constraint.
pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

/// A write referenced a row that no longer exists, e.g. a user deleted while
/// their token is still valid.
pub fn missing_reference(err: sea_orm::DbErr, what: &str) -> AppError {
    match err.sql_err() {
        Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(_)) => AppError::not_found(what),
        _ => AppError::OrmError(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_rest_statuses() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Format("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Duplicate("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::not_found("Dish").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::ExpiredToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::MissingToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_names_the_resource() {
        assert_eq!(AppError::not_found("Order").to_string(), "Order not found");
    }
}
