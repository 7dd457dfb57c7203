use axum::{extract::State, middleware, routing::get, Json, Router};
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    app_state::AppState,
    middleware::{language::language_middleware, tracing::observability_middleware},
    modules::{
        enrollments::routes::enrollment_routes, entitlements::routes::entitlement_routes,
        notifications::routes::notification_routes, sessions::routes::session_routes,
    },
    websocket::websocket_routes,
};

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(enrollment_routes())
        .merge(session_routes())
        .merge(entitlement_routes())
        .merge(notification_routes());

    let static_dir = state.env.app.static_dir.clone();

    Router::new()
        .route("/health", get(health_check))
        .merge(websocket_routes())
        .nest("/api", api)
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(middleware::from_fn(observability_middleware))
        .layer(middleware::from_fn(language_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "healthy",
        Err(e) => {
            tracing::info!(error = %e, "Database health check failed");
            "unhealthy"
        }
    };

    let telemetry_health = crate::telemetry::telemetry_health_check();

    Json(json!({
        "status": "ok",
        "timestamp": OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status,
            "telemetry": telemetry_health
        }
    }))
}
