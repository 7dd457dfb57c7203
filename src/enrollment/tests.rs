use std::sync::Arc;

use pretty_assertions::assert_eq;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::db::{
    EnrollmentStatus, Entitlement, PenaltyType, Profile, SessionCategory, TrainingSession, UserRole,
};
use crate::i18n::init_i18n;

use super::memory::{FixedClock, MemoryStore};
use super::{
    AdmissionStatus, AttendanceOutcome, CancelOutcome, EnrollmentGate, EnrollmentRequest, GateError,
    Rejection, RejectionKind,
};

const NOW: OffsetDateTime = datetime!(2026-11-01 09:00 UTC);

struct Harness {
    store: MemoryStore,
    clock: Arc<FixedClock>,
    gate: Arc<EnrollmentGate>,
    site_id: Uuid,
}

impl Harness {
    fn new() -> Self {
        let clock = Arc::new(FixedClock::new(NOW));
        let store = MemoryStore::with_clock(clock.clone());
        let localizer = Arc::new(init_i18n(None).expect("embedded locales load"));
        let gate = EnrollmentGate::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            localizer,
            clock.clone(),
        );
        Self {
            store,
            clock,
            gate: Arc::new(gate),
            site_id: Uuid::new_v4(),
        }
    }

    async fn profile(&self, role: UserRole) -> Profile {
        let profile = Profile {
            id: Uuid::new_v4(),
            full_name: format!("{} user", role.as_str()),
            email: format!("{}@school.test", Uuid::new_v4()),
            role,
            created_at: NOW - Duration::days(30),
        };
        self.store.add_profile(profile.clone()).await;
        profile
    }

    /// A student registered at the harness site, optionally holding an entitlement.
    async fn student(&self, entitled: bool) -> Profile {
        let student = self.profile(UserRole::Student).await;
        self.store.add_student_site(self.site_id, student.id).await;
        if entitled {
            self.entitle(student.id, NOW + Duration::days(60)).await;
        }
        student
    }

    async fn entitle(&self, user_id: Uuid, expires_at: OffsetDateTime) {
        self.store
            .add_entitlement(Entitlement {
                id: Uuid::new_v4(),
                user_id,
                site_id: self.site_id,
                product_id: None,
                starts_at: NOW - Duration::days(1),
                expires_at,
                created_at: NOW - Duration::days(1),
            })
            .await;
    }

    async fn session(&self, capacity: i32, starts_in: Duration) -> TrainingSession {
        self.session_with_instructor(capacity, starts_in, None).await
    }

    async fn session_with_instructor(
        &self,
        capacity: i32,
        starts_in: Duration,
        instructor_id: Option<Uuid>,
    ) -> TrainingSession {
        let starts_at = NOW + starts_in;
        let session = TrainingSession {
            id: Uuid::new_v4(),
            site_id: self.site_id,
            category: SessionCategory::Practice,
            starts_at,
            ends_at: starts_at + Duration::hours(2),
            capacity,
            location: Some("Track 1".to_string()),
            instructor_id,
            created_at: NOW - Duration::days(7),
            updated_at: NOW - Duration::days(7),
        };
        self.store.add_session(session.clone()).await;
        session
    }

    async fn enroll(&self, requester: &Profile, session: &TrainingSession) -> Result<super::Admission, GateError> {
        self.gate
            .request_enrollment(
                requester.id,
                EnrollmentRequest {
                    session_id: session.id,
                    student_id: None,
                },
            )
            .await
    }

    async fn assign(
        &self,
        manager: &Profile,
        student: &Profile,
        session: &TrainingSession,
    ) -> Result<super::Admission, GateError> {
        self.gate
            .request_enrollment(
                manager.id,
                EnrollmentRequest {
                    session_id: session.id,
                    student_id: Some(student.id),
                },
            )
            .await
    }

    async fn active_count(&self, session_id: Uuid) -> usize {
        self.store
            .enrollments()
            .await
            .iter()
            .filter(|e| e.session_id == session_id && e.status == EnrollmentStatus::Active)
            .count()
    }
}

fn rejection<T: std::fmt::Debug>(result: Result<T, GateError>) -> Rejection {
    match result {
        Err(GateError::Rejected(rejection)) => rejection,
        other => panic!("expected a rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn entitled_student_enrolls_in_future_session() {
    let h = Harness::new();
    let student = h.student(true).await;
    let session = h.session(2, Duration::days(3)).await;

    let admission = h.enroll(&student, &session).await.unwrap();

    assert_eq!(admission.status, AdmissionStatus::Created);
    assert_eq!(admission.enrollment.status, EnrollmentStatus::Active);
    assert_eq!(admission.enrollment.student_id, student.id);
    assert_eq!(admission.enrollment.site_id, h.site_id);
    assert_eq!(h.active_count(session.id).await, 1);

    let notifications = h.store.notifications().await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].user_id, student.id);
    assert_eq!(notifications[0].created_at, NOW);
    assert_eq!(notifications[0].data.0["enrollmentId"], admission.enrollment.id.to_string());
}

#[tokio::test]
async fn full_session_rejects_with_conflict() {
    let h = Harness::new();
    let session = h.session(1, Duration::days(3)).await;
    let first = h.student(true).await;
    let second = h.student(true).await;

    h.enroll(&first, &session).await.unwrap();
    let rejected = rejection(h.enroll(&second, &session).await);

    assert_eq!(rejected, Rejection::SessionFull);
    assert_eq!(rejected.kind(), RejectionKind::Conflict);
    assert_eq!(h.active_count(session.id).await, 1);
}

#[tokio::test]
async fn student_without_entitlement_is_forbidden() {
    let h = Harness::new();
    let student = h.student(false).await;
    let session = h.session(5, Duration::days(3)).await;

    let rejected = rejection(h.enroll(&student, &session).await);

    assert_eq!(rejected, Rejection::NoActiveEntitlement);
    assert_eq!(rejected.kind(), RejectionKind::Forbidden);
    assert!(h.store.enrollments().await.is_empty());
}

#[tokio::test]
async fn entitlement_expiring_now_is_not_active() {
    let h = Harness::new();
    let student = h.student(false).await;
    h.entitle(student.id, NOW).await;
    let session = h.session(5, Duration::days(3)).await;

    assert_eq!(
        rejection(h.enroll(&student, &session).await),
        Rejection::NoActiveEntitlement
    );

    h.entitle(student.id, NOW + Duration::seconds(1)).await;
    assert!(h.enroll(&student, &session).await.is_ok());
}

#[tokio::test]
async fn entitlement_at_another_site_does_not_count() {
    let h = Harness::new();
    let student = h.student(false).await;
    h.store
        .add_entitlement(Entitlement {
            id: Uuid::new_v4(),
            user_id: student.id,
            site_id: Uuid::new_v4(),
            product_id: None,
            starts_at: NOW - Duration::days(1),
            expires_at: NOW + Duration::days(30),
            created_at: NOW - Duration::days(1),
        })
        .await;
    let session = h.session(5, Duration::days(3)).await;

    assert_eq!(
        rejection(h.enroll(&student, &session).await),
        Rejection::NoActiveEntitlement
    );
}

#[tokio::test]
async fn manager_assignment_bypasses_entitlement() {
    let h = Harness::new();
    let manager = h.profile(UserRole::Manager).await;
    let student = h.student(false).await;
    let session = h.session(5, Duration::days(3)).await;

    let admission = h
        .gate
        .request_enrollment(
            manager.id,
            EnrollmentRequest {
                session_id: session.id,
                student_id: Some(student.id),
            },
        )
        .await
        .unwrap();

    assert_eq!(admission.enrollment.student_id, student.id);
    assert_eq!(admission.enrollment.status, EnrollmentStatus::Active);
}

#[tokio::test]
async fn manager_assignment_respects_capacity() {
    let h = Harness::new();
    let manager = h.profile(UserRole::Manager).await;
    let session = h.session(1, Duration::days(3)).await;
    let seated = h.student(true).await;
    let student = h.student(false).await;
    h.enroll(&seated, &session).await.unwrap();

    let rejected = rejection(h.assign(&manager, &student, &session).await);

    assert_eq!(rejected, Rejection::SessionFull);
    assert_eq!(h.active_count(session.id).await, 1);
}

#[tokio::test]
async fn manager_assignment_of_enrolled_student_is_a_duplicate() {
    let h = Harness::new();
    let manager = h.profile(UserRole::Manager).await;
    let student = h.student(false).await;
    let session = h.session(5, Duration::days(3)).await;
    h.assign(&manager, &student, &session).await.unwrap();

    let rejected = rejection(h.assign(&manager, &student, &session).await);

    assert_eq!(rejected, Rejection::AlreadyEnrolled);
    assert_eq!(h.store.enrollments().await.len(), 1);
}

#[tokio::test]
async fn manager_cannot_assign_student_from_another_site() {
    let h = Harness::new();
    let manager = h.profile(UserRole::Manager).await;
    let outsider = h.profile(UserRole::Student).await;
    let session = h.session(5, Duration::days(3)).await;

    let rejected = rejection(h.assign(&manager, &outsider, &session).await);

    assert_eq!(rejected, Rejection::StudentNotAtSite);
    assert!(h.store.enrollments().await.is_empty());
}

#[tokio::test]
async fn student_cannot_enroll_someone_else() {
    let h = Harness::new();
    let student = h.student(true).await;
    let other = h.student(true).await;
    let session = h.session(5, Duration::days(3)).await;

    let result = h
        .gate
        .request_enrollment(
            student.id,
            EnrollmentRequest {
                session_id: session.id,
                student_id: Some(other.id),
            },
        )
        .await;

    assert_eq!(rejection(result), Rejection::NotPermitted);
}

#[tokio::test]
async fn started_or_missing_session_is_rejected() {
    let h = Harness::new();
    let student = h.student(true).await;
    let started = h.session(5, Duration::ZERO).await;

    let rejected = rejection(h.enroll(&student, &started).await);
    assert_eq!(rejected, Rejection::SessionStarted);
    assert_eq!(rejected.kind(), RejectionKind::InvalidState);

    let missing = TrainingSession {
        id: Uuid::new_v4(),
        ..started
    };
    let rejected = rejection(h.enroll(&student, &missing).await);
    assert_eq!(rejected, Rejection::SessionNotFound);
    assert_eq!(rejected.kind(), RejectionKind::NotFound);
}

#[tokio::test]
async fn student_must_be_registered_at_site() {
    let h = Harness::new();
    let outsider = h.profile(UserRole::Student).await;
    h.entitle(outsider.id, NOW + Duration::days(30)).await;
    let session = h.session(5, Duration::days(3)).await;

    assert_eq!(
        rejection(h.enroll(&outsider, &session).await),
        Rejection::StudentNotAtSite
    );
}

#[tokio::test]
async fn unknown_requester_is_rejected() {
    let h = Harness::new();
    let session = h.session(5, Duration::days(3)).await;

    let result = h
        .gate
        .request_enrollment(
            Uuid::new_v4(),
            EnrollmentRequest {
                session_id: session.id,
                student_id: None,
            },
        )
        .await;

    let rejected = rejection(result);
    assert_eq!(rejected, Rejection::UnknownRequester);
    assert_eq!(rejected.kind(), RejectionKind::Unauthorized);
}

#[tokio::test]
async fn second_request_is_a_duplicate() {
    let h = Harness::new();
    let student = h.student(true).await;
    let session = h.session(5, Duration::days(3)).await;

    h.enroll(&student, &session).await.unwrap();
    let rejected = rejection(h.enroll(&student, &session).await);

    assert_eq!(rejected, Rejection::AlreadyEnrolled);
    assert_eq!(rejected.kind(), RejectionKind::Conflict);
    assert_eq!(h.store.enrollments().await.len(), 1);
}

#[tokio::test]
async fn enrolled_student_on_full_session_is_a_duplicate() {
    let h = Harness::new();
    let student = h.student(true).await;
    let session = h.session(1, Duration::days(3)).await;

    h.enroll(&student, &session).await.unwrap();
    let rejected = rejection(h.enroll(&student, &session).await);

    assert_eq!(rejected, Rejection::AlreadyEnrolled);
    assert_eq!(rejected.kind(), RejectionKind::Conflict);
    assert_eq!(h.active_count(session.id).await, 1);
}

#[tokio::test]
async fn cancelled_enrollment_is_reactivated() {
    let h = Harness::new();
    let student = h.student(true).await;
    let session = h.session(5, Duration::days(3)).await;

    let first = h.enroll(&student, &session).await.unwrap();
    h.gate
        .cancel_enrollment(student.id, first.enrollment.id, Some("conflict".to_string()))
        .await
        .unwrap();

    let again = h.enroll(&student, &session).await.unwrap();

    assert_eq!(again.status, AdmissionStatus::Reactivated);
    assert_eq!(again.enrollment.id, first.enrollment.id);
    assert_eq!(again.enrollment.status, EnrollmentStatus::Active);
    assert!(again.enrollment.cancelled_at.is_none());
    assert!(again.enrollment.cancel_reason.is_none());
    assert_eq!(h.store.enrollments().await.len(), 1);
}

#[tokio::test]
async fn reactivation_respects_capacity() {
    let h = Harness::new();
    let session = h.session(1, Duration::days(3)).await;
    let first = h.student(true).await;
    let second = h.student(true).await;

    let admission = h.enroll(&first, &session).await.unwrap();
    h.gate
        .cancel_enrollment(first.id, admission.enrollment.id, None)
        .await
        .unwrap();
    h.enroll(&second, &session).await.unwrap();

    assert_eq!(
        rejection(h.enroll(&first, &session).await),
        Rejection::SessionFull
    );
}

#[tokio::test]
async fn early_cancellation_has_no_penalty() {
    let h = Harness::new();
    let student = h.student(true).await;
    let session = h.session(5, Duration::hours(48)).await;
    let admission = h.enroll(&student, &session).await.unwrap();

    let outcome = h
        .gate
        .cancel_enrollment(student.id, admission.enrollment.id, None)
        .await
        .unwrap();

    match outcome {
        CancelOutcome::Cancelled { enrollment, late } => {
            assert!(!late);
            assert_eq!(enrollment.status, EnrollmentStatus::Cancelled);
            assert_eq!(enrollment.cancelled_at, Some(NOW));
            assert_eq!(enrollment.cancelled_by, Some(student.id));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(h.store.penalties().await.is_empty());
    assert_eq!(h.active_count(session.id).await, 0);
}

#[tokio::test]
async fn late_cancellation_records_one_penalty() {
    let h = Harness::new();
    let student = h.student(true).await;
    let session = h.session(5, Duration::hours(10)).await;
    let admission = h.enroll(&student, &session).await.unwrap();

    let outcome = h
        .gate
        .cancel_enrollment(student.id, admission.enrollment.id, Some("  sick  ".to_string()))
        .await
        .unwrap();

    assert!(matches!(outcome, CancelOutcome::Cancelled { late: true, .. }));
    assert_eq!(outcome.enrollment().cancel_reason.as_deref(), Some("sick"));

    let penalties = h.store.penalties().await;
    assert_eq!(penalties.len(), 1);
    assert_eq!(penalties[0].penalty_type, PenaltyType::LateCancel);
    assert_eq!(penalties[0].student_id, student.id);
    assert_eq!(penalties[0].site_id, h.site_id);
    assert_eq!(penalties[0].session_id, Some(session.id));
}

#[tokio::test]
async fn cancelling_exactly_24_hours_out_is_not_late() {
    let h = Harness::new();
    let student = h.student(true).await;
    let session = h.session(5, Duration::hours(24)).await;
    let admission = h.enroll(&student, &session).await.unwrap();

    let outcome = h
        .gate
        .cancel_enrollment(student.id, admission.enrollment.id, None)
        .await
        .unwrap();

    assert!(matches!(outcome, CancelOutcome::Cancelled { late: false, .. }));
    assert!(h.store.penalties().await.is_empty());
}

#[tokio::test]
async fn repeated_cancellation_is_idempotent() {
    let h = Harness::new();
    let student = h.student(true).await;
    let session = h.session(5, Duration::hours(3)).await;
    let admission = h.enroll(&student, &session).await.unwrap();

    h.gate
        .cancel_enrollment(student.id, admission.enrollment.id, None)
        .await
        .unwrap();
    let second = h
        .gate
        .cancel_enrollment(student.id, admission.enrollment.id, None)
        .await
        .unwrap();

    assert!(matches!(second, CancelOutcome::AlreadyCancelled { .. }));
    assert_eq!(h.store.penalties().await.len(), 1);
}

#[tokio::test]
async fn only_owner_or_staff_may_cancel() {
    let h = Harness::new();
    let student = h.student(true).await;
    let other = h.student(true).await;
    let admin = h.profile(UserRole::Admin).await;
    let session = h.session(5, Duration::days(3)).await;
    let admission = h.enroll(&student, &session).await.unwrap();

    let rejected = rejection(
        h.gate
            .cancel_enrollment(other.id, admission.enrollment.id, None)
            .await,
    );
    assert_eq!(rejected, Rejection::NotPermitted);
    assert_eq!(rejected.kind(), RejectionKind::Forbidden);

    let outcome = h
        .gate
        .cancel_enrollment(admin.id, admission.enrollment.id, None)
        .await
        .unwrap();
    assert_eq!(outcome.enrollment().cancelled_by, Some(admin.id));
}

#[tokio::test]
async fn cancelling_unknown_enrollment_is_not_found() {
    let h = Harness::new();
    let student = h.student(true).await;

    assert_eq!(
        rejection(h.gate.cancel_enrollment(student.id, Uuid::new_v4(), None).await),
        Rejection::EnrollmentNotFound
    );
}

#[tokio::test]
async fn cancelling_after_start_is_rejected() {
    let h = Harness::new();
    let student = h.student(true).await;
    let session = h.session(5, Duration::hours(1)).await;
    let admission = h.enroll(&student, &session).await.unwrap();

    h.clock.advance(Duration::hours(2));

    assert_eq!(
        rejection(
            h.gate
                .cancel_enrollment(student.id, admission.enrollment.id, None)
                .await
        ),
        Rejection::SessionStarted
    );
    assert_eq!(h.active_count(session.id).await, 1);
}

#[tokio::test]
async fn overlong_reason_is_invalid_input() {
    let h = Harness::new();
    let student = h.student(true).await;
    let session = h.session(5, Duration::days(3)).await;
    let admission = h.enroll(&student, &session).await.unwrap();

    let rejected = rejection(
        h.gate
            .cancel_enrollment(student.id, admission.enrollment.id, Some("x".repeat(501)))
            .await,
    );
    assert_eq!(rejected.kind(), RejectionKind::InvalidInput);
}

#[tokio::test]
async fn notification_failure_does_not_change_outcome() {
    let h = Harness::new();
    h.store.fail_notifications(true);
    let student = h.student(true).await;
    let session = h.session(5, Duration::hours(5)).await;

    let admission = h.enroll(&student, &session).await.unwrap();
    let outcome = h
        .gate
        .cancel_enrollment(student.id, admission.enrollment.id, None)
        .await
        .unwrap();

    assert!(matches!(outcome, CancelOutcome::Cancelled { late: true, .. }));
    assert!(h.store.notifications().await.is_empty());
    assert_eq!(h.store.penalties().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_never_exceed_capacity() {
    let h = Harness::new();
    let capacity = 3;
    let session = h.session(capacity, Duration::days(2)).await;

    let mut students = Vec::new();
    for _ in 0..12 {
        students.push(h.student(true).await);
    }

    let mut tasks = JoinSet::new();
    for student in students {
        let gate = Arc::clone(&h.gate);
        let session_id = session.id;
        tasks.spawn(async move {
            gate.request_enrollment(
                student.id,
                EnrollmentRequest {
                    session_id,
                    student_id: None,
                },
            )
            .await
        });
    }

    let mut admitted = 0;
    let mut full = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => admitted += 1,
            Err(GateError::Rejected(Rejection::SessionFull)) => full += 1,
            Err(other) => panic!("unexpected failure {other:?}"),
        }
    }

    assert_eq!(admitted, 3);
    assert_eq!(full, 9);
    assert_eq!(h.active_count(session.id).await, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_requests_admit_once() {
    let h = Harness::new();
    let student = h.student(true).await;
    let session = h.session(10, Duration::days(2)).await;

    let mut tasks = JoinSet::new();
    for _ in 0..6 {
        let gate = Arc::clone(&h.gate);
        let (student_id, session_id) = (student.id, session.id);
        tasks.spawn(async move {
            gate.request_enrollment(
                student_id,
                EnrollmentRequest {
                    session_id,
                    student_id: None,
                },
            )
            .await
        });
    }

    let mut admitted = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => admitted += 1,
            Err(GateError::Rejected(Rejection::AlreadyEnrolled)) => {}
            Err(other) => panic!("unexpected failure {other:?}"),
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(h.store.enrollments().await.len(), 1);
}

#[tokio::test]
async fn assigned_instructor_records_no_show_with_penalty() {
    let h = Harness::new();
    let instructor = h.profile(UserRole::Instructor).await;
    let student = h.student(true).await;
    let session = h
        .session_with_instructor(5, Duration::hours(30), Some(instructor.id))
        .await;
    let admission = h.enroll(&student, &session).await.unwrap();

    let early = h
        .gate
        .record_attendance(instructor.id, admission.enrollment.id, AttendanceOutcome::NoShow)
        .await;
    assert_eq!(rejection(early), Rejection::SessionNotStarted);

    h.clock.advance(Duration::hours(31));
    let enrollment = h
        .gate
        .record_attendance(instructor.id, admission.enrollment.id, AttendanceOutcome::NoShow)
        .await
        .unwrap();

    assert_eq!(enrollment.status, EnrollmentStatus::NoShow);
    let penalties = h.store.penalties().await;
    assert_eq!(penalties.len(), 1);
    assert_eq!(penalties[0].penalty_type, PenaltyType::NoShow);

    let closed = h
        .gate
        .record_attendance(instructor.id, admission.enrollment.id, AttendanceOutcome::Completed)
        .await;
    assert_eq!(rejection(closed), Rejection::EnrollmentClosed);
}

#[tokio::test]
async fn other_instructor_cannot_record_attendance() {
    let h = Harness::new();
    let assigned = h.profile(UserRole::Instructor).await;
    let other = h.profile(UserRole::Instructor).await;
    let student = h.student(true).await;
    let session = h
        .session_with_instructor(5, Duration::hours(30), Some(assigned.id))
        .await;
    let admission = h.enroll(&student, &session).await.unwrap();
    h.clock.advance(Duration::hours(31));

    let result = h
        .gate
        .record_attendance(other.id, admission.enrollment.id, AttendanceOutcome::Completed)
        .await;

    assert_eq!(rejection(result), Rejection::NotPermitted);
}

#[tokio::test]
async fn completed_enrollment_blocks_reenrollment_and_has_no_penalty() {
    let h = Harness::new();
    let manager = h.profile(UserRole::Manager).await;
    let student = h.student(true).await;
    let session = h.session(5, Duration::hours(30)).await;
    let admission = h.enroll(&student, &session).await.unwrap();

    h.clock.advance(Duration::hours(31));
    let enrollment = h
        .gate
        .record_attendance(manager.id, admission.enrollment.id, AttendanceOutcome::Completed)
        .await
        .unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Completed);
    assert!(h.store.penalties().await.is_empty());

    assert_eq!(
        rejection(
            h.gate
                .cancel_enrollment(student.id, admission.enrollment.id, None)
                .await
        ),
        Rejection::EnrollmentClosed
    );
}

#[tokio::test]
async fn cancelled_enrollment_cannot_be_marked_attended() {
    let h = Harness::new();
    let manager = h.profile(UserRole::Manager).await;
    let student = h.student(true).await;
    let session = h.session(5, Duration::days(3)).await;
    let admission = h.enroll(&student, &session).await.unwrap();
    h.gate
        .cancel_enrollment(student.id, admission.enrollment.id, None)
        .await
        .unwrap();

    h.clock.set(session.starts_at + Duration::minutes(30));
    let result = h
        .gate
        .record_attendance(manager.id, admission.enrollment.id, AttendanceOutcome::NoShow)
        .await;

    assert_eq!(rejection(result), Rejection::EnrollmentCancelled);
}
