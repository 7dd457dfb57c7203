use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{create_entitlement, my_entitlements};
use crate::app_state::AppState;

pub fn entitlement_routes() -> Router<AppState> {
    Router::new()
        .route("/entitlements", post(create_entitlement))
        .route("/entitlements/mine", get(my_entitlements))
}
