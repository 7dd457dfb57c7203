use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::db::{Notification, NotificationRepository};
use crate::error::{AppError, AppResult};

const DEFAULT_PAGE: i64 = 50;
const MAX_PAGE: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
    let notifications =
        NotificationRepository::list_notifications_for_user(&state.db, user.user_id, limit).await?;
    Ok(Json(notifications))
}

/// POST /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<Notification>> {
    NotificationRepository::mark_notification_read(
        &state.db,
        notification_id,
        user.user_id,
        OffsetDateTime::now_utc(),
    )
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound(format!("notification {notification_id}")))
}
