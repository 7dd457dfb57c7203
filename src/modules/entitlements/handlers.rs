use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::db::{Entitlement, EntitlementRepository, NewEntitlement};
use crate::error::{AppError, AppResult};
use crate::modules::json_body;

/// POST /api/entitlements
///
/// Called once a purchase completes; grants the user booking rights at the site.
pub async fn create_entitlement(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<NewEntitlement>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Entitlement>)> {
    user.require_assign_privilege()?;
    let payload = json_body(payload)?;
    payload.validate()?;
    payload
        .validate_window()
        .map_err(|err| AppError::Validation(err.to_string()))?;

    let entitlement = EntitlementRepository::create_entitlement(&state.db, &payload).await?;
    info!(
        entitlement_id = %entitlement.id,
        user_id = %entitlement.user_id,
        site_id = %entitlement.site_id,
        "entitlement recorded"
    );
    Ok((StatusCode::CREATED, Json(entitlement)))
}

/// GET /api/entitlements/mine
pub async fn my_entitlements(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Entitlement>>> {
    let entitlements = EntitlementRepository::list_entitlements_for_user(&state.db, user.user_id).await?;
    Ok(Json(entitlements))
}
