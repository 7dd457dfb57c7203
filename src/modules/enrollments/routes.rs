use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{cancel_enrollment, my_enrollments, record_attendance, request_enrollment};
use crate::app_state::AppState;

pub fn enrollment_routes() -> Router<AppState> {
    Router::new()
        .route("/enrollments", post(request_enrollment))
        .route("/enrollments/cancel", post(cancel_enrollment))
        .route("/enrollments/mine", get(my_enrollments))
        .route("/enrollments/{id}/attendance", post(record_attendance))
}
