use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::db::{EnrollmentRepository, TrainingEnrollment};
use crate::enrollment::{AdmissionStatus, AttendanceOutcome, CancelOutcome, EnrollmentRequest};
use crate::error::{AppError, AppResult};
use crate::i18n::I18n;
use crate::modules::json_body;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollBody {
    pub session_id: Uuid,
    pub student_user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBody {
    pub enrollment_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceBody {
    pub outcome: AttendanceOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateResponse {
    pub ok: bool,
    pub enrollment_id: Uuid,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub late_cancellation: Option<bool>,
}

/// POST /api/enrollments
pub async fn request_enrollment(
    State(state): State<AppState>,
    user: CurrentUser,
    i18n: I18n,
    payload: Result<Json<EnrollBody>, JsonRejection>,
) -> AppResult<Json<GateResponse>> {
    let payload = json_body(payload)?;
    let admission = state
        .gate
        .request_enrollment(
            user.user_id,
            EnrollmentRequest {
                session_id: payload.session_id,
                student_id: payload.student_user_id,
            },
        )
        .await
        .map_err(|err| AppError::from_gate(err, &i18n))?;

    let status = match admission.status {
        AdmissionStatus::Created => "created",
        AdmissionStatus::Reactivated => "reactivated",
    };
    Ok(Json(GateResponse {
        ok: true,
        enrollment_id: admission.enrollment.id,
        status,
        late_cancellation: None,
    }))
}

/// POST /api/enrollments/cancel
pub async fn cancel_enrollment(
    State(state): State<AppState>,
    user: CurrentUser,
    i18n: I18n,
    payload: Result<Json<CancelBody>, JsonRejection>,
) -> AppResult<Json<GateResponse>> {
    let payload = json_body(payload)?;
    let outcome = state
        .gate
        .cancel_enrollment(user.user_id, payload.enrollment_id, payload.reason)
        .await
        .map_err(|err| AppError::from_gate(err, &i18n))?;

    let response = match outcome {
        CancelOutcome::Cancelled { enrollment, late } => GateResponse {
            ok: true,
            enrollment_id: enrollment.id,
            status: "cancelled",
            late_cancellation: Some(late),
        },
        CancelOutcome::AlreadyCancelled { enrollment } => GateResponse {
            ok: true,
            enrollment_id: enrollment.id,
            status: "already_cancelled",
            late_cancellation: None,
        },
    };
    Ok(Json(response))
}

/// POST /api/enrollments/{id}/attendance
pub async fn record_attendance(
    State(state): State<AppState>,
    user: CurrentUser,
    i18n: I18n,
    Path(enrollment_id): Path<Uuid>,
    payload: Result<Json<AttendanceBody>, JsonRejection>,
) -> AppResult<Json<TrainingEnrollment>> {
    let payload = json_body(payload)?;
    let enrollment = state
        .gate
        .record_attendance(user.user_id, enrollment_id, payload.outcome)
        .await
        .map_err(|err| AppError::from_gate(err, &i18n))?;
    Ok(Json(enrollment))
}

/// GET /api/enrollments/mine
pub async fn my_enrollments(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<TrainingEnrollment>>> {
    let enrollments = EnrollmentRepository::list_enrollments_for_student(&state.db, user.user_id).await?;
    Ok(Json(enrollments))
}
