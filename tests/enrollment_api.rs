use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use time::{Duration, OffsetDateTime};
use tokio::sync::broadcast;
use tower::ServiceExt;
use uuid::Uuid;

use school_backend::app::create_router;
use school_backend::app_state::AppState;
use school_backend::config::Config;
use school_backend::db::{Entitlement, Profile, SessionCategory, TrainingSession, UserRole};
use school_backend::enrollment::memory::MemoryStore;
use school_backend::enrollment::{EnrollmentGate, SystemClock};
use school_backend::i18n::{init_i18n, Localizer, SupportedLanguage};

struct TestApp {
    router: Router,
    store: MemoryStore,
    localizer: Arc<Localizer>,
    site_id: Uuid,
}

impl TestApp {
    fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/unused".to_string()),
            _ => None,
        })
        .expect("test config");
        // Never connected: the enrollment endpoints only touch the in-memory store.
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .expect("lazy pool");

        let store = MemoryStore::new();
        let localizer = Arc::new(init_i18n(None).expect("embedded locales"));
        let gate = EnrollmentGate::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            localizer.clone(),
            Arc::new(SystemClock),
        );
        let (live_tx, _) = broadcast::channel(16);
        let state = AppState::from_parts(
            pool,
            config,
            live_tx,
            localizer.clone(),
            Arc::new(gate),
            Arc::new(store.clone()),
        );

        Self {
            router: create_router(state),
            store,
            localizer,
            site_id: Uuid::new_v4(),
        }
    }

    /// Registers a user at the site and returns its bearer token.
    async fn user(&self, role: UserRole, entitled: bool) -> (Uuid, String) {
        let now = OffsetDateTime::now_utc();
        let id = Uuid::new_v4();
        self.store
            .add_profile(Profile {
                id,
                full_name: "Test User".to_string(),
                email: format!("{id}@school.test"),
                role,
                created_at: now,
            })
            .await;
        self.store.add_student_site(self.site_id, id).await;
        if entitled {
            self.store
                .add_entitlement(Entitlement {
                    id: Uuid::new_v4(),
                    user_id: id,
                    site_id: self.site_id,
                    product_id: None,
                    starts_at: now - Duration::days(1),
                    expires_at: now + Duration::days(30),
                    created_at: now,
                })
                .await;
        }
        let token = format!("token-{id}");
        self.store.issue_token(id, &token, now + Duration::hours(1)).await;
        (id, token)
    }

    async fn session(&self, capacity: i32, starts_in: Duration) -> Uuid {
        let now = OffsetDateTime::now_utc();
        let id = Uuid::new_v4();
        self.store
            .add_session(TrainingSession {
                id,
                site_id: self.site_id,
                category: SessionCategory::Theory,
                starts_at: now + starts_in,
                ends_at: now + starts_in + Duration::hours(1),
                capacity,
                location: None,
                instructor_id: None,
                created_at: now,
                updated_at: now,
            })
            .await;
        id
    }

    async fn post(&self, uri: &str, token: Option<&str>, language: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(language) = language {
            request = request.header("X-Language", language);
        }
        let request = request.body(Body::from(body.to_string())).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[tokio::test]
async fn enrollment_succeeds_with_entitlement() {
    let app = TestApp::new();
    let (student_id, token) = app.user(UserRole::Student, true).await;
    let session_id = app.session(4, Duration::days(2)).await;

    let (status, body) = app
        .post("/api/enrollments", Some(&token), None, json!({ "sessionId": session_id }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["status"], json!("created"));

    let enrollments = app.store.enrollments().await;
    assert_eq!(enrollments.len(), 1);
    assert_eq!(enrollments[0].student_id, student_id);
    assert_eq!(body["enrollmentId"], json!(enrollments[0].id));
}

#[tokio::test]
async fn missing_or_unknown_credential_is_unauthorized() {
    let app = TestApp::new();
    let session_id = app.session(4, Duration::days(2)).await;

    let (status, body) = app
        .post("/api/enrollments", None, None, json!({ "sessionId": session_id }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ok"], json!(false));
    assert_eq!(body["code"], json!("unauthorized"));

    let (status, _) = app
        .post("/api/enrollments", Some("forged"), None, json!({ "sessionId": session_id }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn full_session_is_conflict_with_localized_message() {
    let app = TestApp::new();
    let (_, first) = app.user(UserRole::Student, true).await;
    let (_, second) = app.user(UserRole::Student, true).await;
    let session_id = app.session(1, Duration::days(2)).await;

    let (status, _) = app
        .post("/api/enrollments", Some(&first), None, json!({ "sessionId": session_id }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/api/enrollments", Some(&second), Some("fr"), json!({ "sessionId": session_id }))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["ok"], json!(false));
    assert_eq!(body["code"], json!("session_full"));
    assert_eq!(
        body["error"],
        json!(app
            .localizer
            .get_string_for_language(&SupportedLanguage::French, "rejection-session-full"))
    );
}

#[tokio::test]
async fn rejections_map_to_statuses() {
    let app = TestApp::new();
    let (_, unentitled) = app.user(UserRole::Student, false).await;
    let (_, entitled) = app.user(UserRole::Student, true).await;
    let future = app.session(4, Duration::days(2)).await;
    let started = app.session(4, -Duration::minutes(5)).await;

    let (status, body) = app
        .post("/api/enrollments", Some(&unentitled), None, json!({ "sessionId": future }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("no_active_entitlement"));

    let (status, body) = app
        .post("/api/enrollments", Some(&entitled), None, json!({ "sessionId": Uuid::new_v4() }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("session_not_found"));

    let (status, body) = app
        .post("/api/enrollments", Some(&entitled), None, json!({ "sessionId": started }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("session_started"));
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = TestApp::new();
    let (_, token) = app.user(UserRole::Student, true).await;

    let (status, body) = app
        .post("/api/enrollments", Some(&token), None, json!({ "sessionId": "not-a-uuid" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("invalid_input"));
}

#[tokio::test]
async fn manager_assigns_student_without_entitlement() {
    let app = TestApp::new();
    let (_, manager) = app.user(UserRole::Manager, false).await;
    let (student_id, _) = app.user(UserRole::Student, false).await;
    let session_id = app.session(4, Duration::days(2)).await;

    let (status, body) = app
        .post(
            "/api/enrollments",
            Some(&manager),
            None,
            json!({ "sessionId": session_id, "studentUserId": student_id }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("created"));
    assert_eq!(app.store.enrollments().await[0].student_id, student_id);
}

#[tokio::test]
async fn late_cancel_then_repeat_cancel() {
    let app = TestApp::new();
    let (_, token) = app.user(UserRole::Student, true).await;
    let session_id = app.session(4, Duration::hours(6)).await;

    let (_, body) = app
        .post("/api/enrollments", Some(&token), None, json!({ "sessionId": session_id }))
        .await;
    let enrollment_id = body["enrollmentId"].clone();

    let (status, body) = app
        .post(
            "/api/enrollments/cancel",
            Some(&token),
            None,
            json!({ "enrollmentId": enrollment_id, "reason": "train delayed" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("cancelled"));
    assert_eq!(body["lateCancellation"], json!(true));

    let (status, body) = app
        .post(
            "/api/enrollments/cancel",
            Some(&token),
            None,
            json!({ "enrollmentId": enrollment_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("already_cancelled"));
    assert_eq!(app.store.penalties().await.len(), 1);
}

#[tokio::test]
async fn cancelling_someone_elses_enrollment_is_forbidden() {
    let app = TestApp::new();
    let (_, owner) = app.user(UserRole::Student, true).await;
    let (_, other) = app.user(UserRole::Student, true).await;
    let session_id = app.session(4, Duration::days(3)).await;

    let (_, body) = app
        .post("/api/enrollments", Some(&owner), None, json!({ "sessionId": session_id }))
        .await;

    let (status, body) = app
        .post(
            "/api/enrollments/cancel",
            Some(&other),
            None,
            json!({ "enrollmentId": body["enrollmentId"] }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("not_permitted"));
}
