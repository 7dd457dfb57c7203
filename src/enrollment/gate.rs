use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::{
    DatabaseError, EnrollmentStatus, EnrollmentTransition, NewPenalty, NewTrainingEnrollment,
    PenaltyType, Profile, TrainingEnrollment, TrainingSession,
};
use crate::fluent_args;
use crate::i18n::{format_datetime, Localizer};

use super::clock::Clock;
use super::policy::{self, Target};
use super::rejection::{GateError, Rejection};
use super::store::{EnrollmentStore, EnrollmentTx, EntitlementStore, Notifier, ProfileStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionStatus {
    Created,
    Reactivated,
}

#[derive(Debug, Clone)]
pub struct Admission {
    pub enrollment: TrainingEnrollment,
    pub status: AdmissionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentRequest {
    pub session_id: Uuid,
    /// Honored only for admins and managers; everyone else enrolls themselves.
    pub student_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub enum CancelOutcome {
    Cancelled {
        enrollment: TrainingEnrollment,
        late: bool,
    },
    /// The enrollment was already cancelled; nothing changed.
    AlreadyCancelled { enrollment: TrainingEnrollment },
}

impl CancelOutcome {
    pub fn enrollment(&self) -> &TrainingEnrollment {
        match self {
            CancelOutcome::Cancelled { enrollment, .. } => enrollment,
            CancelOutcome::AlreadyCancelled { enrollment } => enrollment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceOutcome {
    NoShow,
    Completed,
}

/// Decides and persists enrollment state changes.
///
/// Holds no state of its own: every collaborator is injected and every decision is
/// made against the store inside one unit of work.
pub struct EnrollmentGate {
    profiles: Arc<dyn ProfileStore>,
    entitlements: Arc<dyn EntitlementStore>,
    enrollments: Arc<dyn EnrollmentStore>,
    notifier: Arc<dyn Notifier>,
    localizer: Arc<Localizer>,
    clock: Arc<dyn Clock>,
}

impl EnrollmentGate {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        entitlements: Arc<dyn EntitlementStore>,
        enrollments: Arc<dyn EnrollmentStore>,
        notifier: Arc<dyn Notifier>,
        localizer: Arc<Localizer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            entitlements,
            enrollments,
            notifier,
            localizer,
            clock,
        }
    }

    pub async fn request_enrollment(
        &self,
        requester_id: Uuid,
        request: EnrollmentRequest,
    ) -> Result<Admission, GateError> {
        let result = self.admit_request(requester_id, request).await;
        match &result {
            Ok(admission) => info!(
                session_id = %request.session_id,
                student_id = %admission.enrollment.student_id,
                enrollment_id = %admission.enrollment.id,
                status = ?admission.status,
                "enrollment admitted"
            ),
            Err(err) => log_failure("enrollment", request.session_id, err),
        }

        let admission = result?;
        self.notify_enrollment(
            &admission.enrollment,
            "notification-enrollment-confirmed-title",
            "notification-enrollment-confirmed-body",
        )
        .await;
        Ok(admission)
    }

    async fn admit_request(&self, requester_id: Uuid, request: EnrollmentRequest) -> Result<Admission, GateError> {
        let now = self.clock.now();
        let requester = self.requester(requester_id).await?;

        let session = self
            .enrollments
            .get_session(request.session_id)
            .await?
            .ok_or(Rejection::SessionNotFound)?;
        if session.has_started(now) {
            return Err(Rejection::SessionStarted.into());
        }

        let target = policy::resolve_target(&requester, request.student_id)?;

        if !self
            .profiles
            .has_site_record(session.site_id, target.student_id)
            .await?
        {
            return Err(Rejection::StudentNotAtSite.into());
        }

        if target.requires_entitlement()
            && !self
                .entitlements
                .has_active_entitlement(target.student_id, session.site_id, now)
                .await?
        {
            return Err(Rejection::NoActiveEntitlement.into());
        }

        self.admit(session.id, target, now).await
    }

    /// Duplicate check, capacity check and write under the session lock.
    async fn admit(&self, session_id: Uuid, target: Target, now: OffsetDateTime) -> Result<Admission, GateError> {
        let mut tx = self.enrollments.begin().await?;

        // Re-read under the lock: capacity or start time may have changed since the first read.
        let session = tx
            .lock_session(session_id)
            .await?
            .ok_or(Rejection::SessionNotFound)?;
        if session.has_started(now) {
            return Err(Rejection::SessionStarted.into());
        }

        // An existing live or closed row needs no seat, so it is judged before capacity.
        let existing = tx.find_enrollment(session.id, target.student_id).await?;
        match existing.as_ref().map(|enrollment| enrollment.status) {
            Some(EnrollmentStatus::Active) => return Err(Rejection::AlreadyEnrolled.into()),
            Some(status) if status.is_closed() => return Err(Rejection::EnrollmentClosed.into()),
            _ => {}
        }

        let active = tx.count_active_enrollments(session.id).await?;
        if active >= i64::from(session.capacity) {
            return Err(Rejection::SessionFull.into());
        }

        let admission = match existing {
            // Only a cancelled row reaches this point.
            Some(enrollment) => {
                let enrollment = tx
                    .update_enrollment_status(enrollment.id, EnrollmentTransition::Reactivate)
                    .await
                    .map_err(admission_conflict)?;
                Admission {
                    enrollment,
                    status: AdmissionStatus::Reactivated,
                }
            }
            None => {
                let enrollment = tx
                    .insert_enrollment(NewTrainingEnrollment {
                        session_id: session.id,
                        student_id: target.student_id,
                        site_id: session.site_id,
                        created_at: now,
                    })
                    .await
                    .map_err(admission_conflict)?;
                Admission {
                    enrollment,
                    status: AdmissionStatus::Created,
                }
            }
        };

        tx.commit().await.map_err(admission_conflict)?;
        Ok(admission)
    }

    /// Cancels an enrollment. Cancelling an already-cancelled enrollment is a no-op.
    pub async fn cancel_enrollment(
        &self,
        requester_id: Uuid,
        enrollment_id: Uuid,
        reason: Option<String>,
    ) -> Result<CancelOutcome, GateError> {
        let result = self.cancel(requester_id, enrollment_id, reason).await;
        match &result {
            Ok(CancelOutcome::Cancelled { enrollment, late }) => info!(
                session_id = %enrollment.session_id,
                student_id = %enrollment.student_id,
                enrollment_id = %enrollment.id,
                late = *late,
                "enrollment cancelled"
            ),
            Ok(CancelOutcome::AlreadyCancelled { enrollment }) => info!(
                enrollment_id = %enrollment.id,
                "enrollment already cancelled"
            ),
            Err(err) => log_failure("cancellation", enrollment_id, err),
        }

        let outcome = result?;
        if let CancelOutcome::Cancelled { enrollment, late } = &outcome {
            let body_key = if *late {
                "notification-enrollment-cancelled-late-body"
            } else {
                "notification-enrollment-cancelled-body"
            };
            self.notify_enrollment(enrollment, "notification-enrollment-cancelled-title", body_key)
                .await;
        }
        Ok(outcome)
    }

    async fn cancel(
        &self,
        requester_id: Uuid,
        enrollment_id: Uuid,
        reason: Option<String>,
    ) -> Result<CancelOutcome, GateError> {
        let now = self.clock.now();
        let requester = self.requester(requester_id).await?;
        let reason = policy::normalize_reason(reason)?;

        let enrollment = self
            .enrollments
            .get_enrollment(enrollment_id)
            .await?
            .ok_or(Rejection::EnrollmentNotFound)?;
        if !policy::can_cancel(&requester, &enrollment) {
            return Err(Rejection::NotPermitted.into());
        }

        let mut tx = self.enrollments.begin().await?;
        let (session, enrollment) = lock_session_and_enrollment(tx.as_mut(), &enrollment).await?;

        match enrollment.status {
            EnrollmentStatus::Cancelled => return Ok(CancelOutcome::AlreadyCancelled { enrollment }),
            EnrollmentStatus::NoShow | EnrollmentStatus::Completed => {
                return Err(Rejection::EnrollmentClosed.into())
            }
            EnrollmentStatus::Active => {}
        }
        if session.has_started(now) {
            return Err(Rejection::SessionStarted.into());
        }

        let late = policy::is_late_cancellation(session.starts_at, now);
        let enrollment = tx
            .update_enrollment_status(
                enrollment.id,
                EnrollmentTransition::Cancel {
                    at: now,
                    by: requester.id,
                    reason,
                },
            )
            .await?;

        if late {
            tx.insert_penalty(NewPenalty {
                site_id: enrollment.site_id,
                student_id: enrollment.student_id,
                session_id: Some(session.id),
                penalty_type: PenaltyType::LateCancel,
                created_at: now,
            })
            .await?;
        }

        tx.commit().await?;
        Ok(CancelOutcome::Cancelled { enrollment, late })
    }

    /// Closes an active enrollment of a started session as no-show or completed.
    pub async fn record_attendance(
        &self,
        requester_id: Uuid,
        enrollment_id: Uuid,
        outcome: AttendanceOutcome,
    ) -> Result<TrainingEnrollment, GateError> {
        let result = self.attendance(requester_id, enrollment_id, outcome).await;
        match &result {
            Ok(enrollment) => info!(
                session_id = %enrollment.session_id,
                student_id = %enrollment.student_id,
                enrollment_id = %enrollment.id,
                outcome = ?outcome,
                "attendance recorded"
            ),
            Err(err) => log_failure("attendance", enrollment_id, err),
        }

        let enrollment = result?;
        if outcome == AttendanceOutcome::NoShow {
            self.notify_enrollment(&enrollment, "notification-no-show-title", "notification-no-show-body")
                .await;
        }
        Ok(enrollment)
    }

    async fn attendance(
        &self,
        requester_id: Uuid,
        enrollment_id: Uuid,
        outcome: AttendanceOutcome,
    ) -> Result<TrainingEnrollment, GateError> {
        let now = self.clock.now();
        let requester = self.requester(requester_id).await?;

        let enrollment = self
            .enrollments
            .get_enrollment(enrollment_id)
            .await?
            .ok_or(Rejection::EnrollmentNotFound)?;

        let mut tx = self.enrollments.begin().await?;
        let (session, enrollment) = lock_session_and_enrollment(tx.as_mut(), &enrollment).await?;

        if !policy::can_record_attendance(&requester, &session) {
            return Err(Rejection::NotPermitted.into());
        }
        if !session.has_started(now) {
            return Err(Rejection::SessionNotStarted.into());
        }
        match enrollment.status {
            EnrollmentStatus::Active => {}
            EnrollmentStatus::Cancelled => return Err(Rejection::EnrollmentCancelled.into()),
            EnrollmentStatus::NoShow | EnrollmentStatus::Completed => {
                return Err(Rejection::EnrollmentClosed.into())
            }
        }

        let transition = match outcome {
            AttendanceOutcome::NoShow => EnrollmentTransition::NoShow,
            AttendanceOutcome::Completed => EnrollmentTransition::Complete,
        };
        let enrollment = tx.update_enrollment_status(enrollment.id, transition).await?;

        if outcome == AttendanceOutcome::NoShow {
            tx.insert_penalty(NewPenalty {
                site_id: enrollment.site_id,
                student_id: enrollment.student_id,
                session_id: Some(session.id),
                penalty_type: PenaltyType::NoShow,
                created_at: now,
            })
            .await?;
        }

        tx.commit().await?;
        Ok(enrollment)
    }

    async fn requester(&self, requester_id: Uuid) -> Result<Profile, GateError> {
        self.profiles
            .get_profile(requester_id)
            .await?
            .ok_or_else(|| Rejection::UnknownRequester.into())
    }

    /// Notification failures are logged and never change the decision.
    async fn notify_enrollment(&self, enrollment: &TrainingEnrollment, title_key: &str, body_key: &str) {
        let language = self.localizer.default_language();
        let starts_at = match self.enrollments.get_session(enrollment.session_id).await {
            Ok(Some(session)) => format_datetime(session.starts_at),
            Ok(None) => String::new(),
            Err(err) => {
                warn!(enrollment_id = %enrollment.id, error = %err, "notification skipped");
                return;
            }
        };
        let args = fluent_args! { "startsAt" => starts_at };
        let title = self.localizer.get_string_for_language(&language, title_key);
        let body = self
            .localizer
            .get_string_with_args_for_language(&language, body_key, &args);
        let data = serde_json::json!({
            "enrollmentId": enrollment.id,
            "sessionId": enrollment.session_id,
            "status": enrollment.status,
        });

        if let Err(err) = self
            .notifier
            .notify(enrollment.student_id, &title, &body, data)
            .await
        {
            warn!(
                enrollment_id = %enrollment.id,
                user_id = %enrollment.student_id,
                error = %err,
                "notification dispatch failed"
            );
        }
    }
}

async fn lock_session_and_enrollment(
    tx: &mut dyn EnrollmentTx,
    enrollment: &TrainingEnrollment,
) -> Result<(TrainingSession, TrainingEnrollment), GateError> {
    let session = tx
        .lock_session(enrollment.session_id)
        .await?
        .ok_or(Rejection::SessionNotFound)?;
    let enrollment = tx
        .lock_enrollment(enrollment.id)
        .await?
        .ok_or(Rejection::EnrollmentNotFound)?;
    Ok((session, enrollment))
}

/// Constraint violations raised at write time are the same business conflicts the
/// gate checks for; they surface when the checks and the write race.
fn admission_conflict(err: DatabaseError) -> GateError {
    match err {
        DatabaseError::CapacityExceeded => Rejection::SessionFull.into(),
        DatabaseError::Duplicate => Rejection::AlreadyEnrolled.into(),
        other => other.into(),
    }
}

fn log_failure(operation: &str, subject: Uuid, err: &GateError) {
    match err {
        GateError::Rejected(rejection) => info!(
            operation,
            subject = %subject,
            code = rejection.code(),
            "request rejected"
        ),
        GateError::Internal(db_err) => error!(
            operation,
            subject = %subject,
            error = %db_err,
            "store failure"
        ),
    }
}
