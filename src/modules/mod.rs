use axum::{extract::rejection::JsonRejection, Json};

use crate::error::{AppError, AppResult};

pub mod enrollments;
pub mod entitlements;
pub mod notifications;
pub mod sessions;

/// Unwraps a JSON body, turning malformed payloads into a 400 in the API error shape.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}
