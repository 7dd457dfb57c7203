use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::db::DatabaseError;
use crate::enrollment::{GateError, Rejection, RejectionKind};
use crate::i18n::I18n;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A business-rule rejection with its already-localized message.
    #[error("Rejected: {rejection}")]
    Rejected { rejection: Rejection, message: String },
}

impl AppError {
    /// Converts a gate failure, localizing rejections for the request language.
    pub fn from_gate(err: GateError, i18n: &I18n) -> Self {
        match err {
            GateError::Rejected(rejection) => Self::rejected(rejection, i18n),
            GateError::Internal(db_err) => AppError::Database(db_err),
        }
    }

    pub fn rejected(rejection: Rejection, i18n: &I18n) -> Self {
        let message = i18n.rejection(&rejection);
        AppError::Rejected { rejection, message }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(DatabaseError::from(err))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

pub fn rejection_status(kind: RejectionKind) -> StatusCode {
    match kind {
        RejectionKind::Unauthorized => StatusCode::UNAUTHORIZED,
        RejectionKind::NotFound => StatusCode::NOT_FOUND,
        RejectionKind::Forbidden => StatusCode::FORBIDDEN,
        RejectionKind::Conflict => StatusCode::CONFLICT,
        RejectionKind::InvalidState | RejectionKind::InvalidInput => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Database(err) => match err {
                DatabaseError::NotFound => (StatusCode::NOT_FOUND, "not_found", "Resource not found"),
                DatabaseError::Duplicate => (StatusCode::CONFLICT, "conflict", "Resource already exists"),
                DatabaseError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input", "Invalid input data"),
                _ => {
                    tracing::error!(error = %err, "request failed on the database");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal",
                        "An internal server error occurred",
                    )
                }
            },
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, "unauthorized", "Authentication failed"),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, "forbidden", "Access denied"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_input", "Validation error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", "Resource not found"),
            AppError::Rejected { rejection, message } => {
                (rejection_status(rejection.kind()), rejection.code(), message.as_str())
            }
        };

        let details = match &self {
            AppError::Validation(details) => Some(details.clone()),
            _ => None,
        };

        let body = Json(json!({
            "ok": false,
            "error": message,
            "code": code,
            "details": details,
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
