use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::db::{
    EnrollmentRepository, NewTrainingSession, SessionRepository, TrainingEnrollment, TrainingSession,
    UpdateTrainingSession, UserRole,
};
use crate::enrollment::Rejection;
use crate::error::{AppError, AppResult};
use crate::i18n::I18n;
use crate::modules::json_body;

/// POST /api/sessions
pub async fn create_session(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<NewTrainingSession>, JsonRejection>,
) -> AppResult<(StatusCode, Json<TrainingSession>)> {
    user.require_assign_privilege()?;
    let payload = json_body(payload)?;
    payload.validate()?;
    payload
        .validate_window()
        .map_err(|err| AppError::Validation(err.to_string()))?;

    let session = SessionRepository::create_session(&state.db, &payload).await?;
    info!(session_id = %session.id, site_id = %session.site_id, "session created");
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/sites/{site_id}/sessions
pub async fn list_site_sessions(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(site_id): Path<Uuid>,
) -> AppResult<Json<Vec<TrainingSession>>> {
    let sessions =
        SessionRepository::list_sessions_for_site(&state.db, site_id, OffsetDateTime::now_utc()).await?;
    Ok(Json(sessions))
}

/// PATCH /api/sessions/{id}
///
/// Capacity is compared with the active count under the session row lock, the same
/// lock admissions take.
pub async fn update_session(
    State(state): State<AppState>,
    user: CurrentUser,
    i18n: I18n,
    Path(session_id): Path<Uuid>,
    payload: Result<Json<UpdateTrainingSession>, JsonRejection>,
) -> AppResult<Json<TrainingSession>> {
    user.require_assign_privilege()?;
    let payload = json_body(payload)?;
    payload.validate()?;

    let mut tx = state.db.begin().await?;
    let current = SessionRepository::lock_session(&mut tx, session_id)
        .await?
        .ok_or_else(|| AppError::rejected(Rejection::SessionNotFound, &i18n))?;
    payload
        .validate_window(&current)
        .map_err(|err| AppError::Validation(err.to_string()))?;

    if let Some(capacity) = payload.capacity {
        let active = EnrollmentRepository::count_active_enrollments(&mut tx, session_id).await?;
        if i64::from(capacity) < active {
            return Err(AppError::rejected(Rejection::CapacityBelowActive, &i18n));
        }
    }

    let session = SessionRepository::update_session(&mut tx, session_id, &payload).await?;
    tx.commit().await?;
    info!(session_id = %session.id, capacity = session.capacity, "session updated");
    Ok(Json(session))
}

/// DELETE /api/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    user: CurrentUser,
    i18n: I18n,
    Path(session_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_assign_privilege()?;

    let mut tx = state.db.begin().await?;
    SessionRepository::lock_session(&mut tx, session_id)
        .await?
        .ok_or_else(|| AppError::rejected(Rejection::SessionNotFound, &i18n))?;
    if EnrollmentRepository::count_enrollments(&mut tx, session_id).await? > 0 {
        return Err(AppError::rejected(Rejection::SessionHasEnrollments, &i18n));
    }
    SessionRepository::delete_session(&mut tx, session_id).await?;
    tx.commit().await?;

    info!(session_id = %session_id, "session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/sessions/{id}/enrollments
pub async fn session_roster(
    State(state): State<AppState>,
    user: CurrentUser,
    i18n: I18n,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<Vec<TrainingEnrollment>>> {
    let session = SessionRepository::get_session_by_id(&state.db, session_id)
        .await?
        .ok_or_else(|| AppError::rejected(Rejection::SessionNotFound, &i18n))?;

    let assigned_instructor =
        user.role == UserRole::Instructor && session.instructor_id == Some(user.user_id);
    if !user.role.can_assign() && !assigned_instructor {
        return Err(AppError::rejected(Rejection::NotPermitted, &i18n));
    }

    let roster = EnrollmentRepository::list_enrollments_for_session(&state.db, session_id).await?;
    Ok(Json(roster))
}
