use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{list_notifications, mark_read};
use crate::app_state::AppState;

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/read", post(mark_read))
}
