use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers::{create_session, delete_session, list_site_sessions, session_roster, update_session};
use crate::app_state::AppState;

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", patch(update_session).delete(delete_session))
        .route("/sessions/{id}/enrollments", get(session_roster))
        .route("/sites/{site_id}/sessions", get(list_site_sessions))
}
