use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "enrollment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Cancelled,
    NoShow,
    Completed,
}

impl EnrollmentStatus {
    /// No-show and completed are past outcomes and are never reopened.
    pub fn is_closed(self) -> bool {
        matches!(self, EnrollmentStatus::NoShow | EnrollmentStatus::Completed)
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingEnrollment {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub site_id: Uuid,
    pub status: EnrollmentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub cancelled_at: Option<OffsetDateTime>,
    pub cancelled_by: Option<Uuid>,
    pub cancel_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTrainingEnrollment {
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub site_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// A status transition applied to an existing enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentTransition {
    /// Back to active with the cancellation fields cleared.
    Reactivate,
    Cancel {
        at: OffsetDateTime,
        by: Uuid,
        reason: Option<String>,
    },
    NoShow,
    Complete,
}

impl EnrollmentTransition {
    pub fn target_status(&self) -> EnrollmentStatus {
        match self {
            EnrollmentTransition::Reactivate => EnrollmentStatus::Active,
            EnrollmentTransition::Cancel { .. } => EnrollmentStatus::Cancelled,
            EnrollmentTransition::NoShow => EnrollmentStatus::NoShow,
            EnrollmentTransition::Complete => EnrollmentStatus::Completed,
        }
    }

    /// Applies the transition to an in-memory row.
    pub fn apply(&self, enrollment: &mut TrainingEnrollment) {
        enrollment.status = self.target_status();
        match self {
            EnrollmentTransition::Reactivate => {
                enrollment.cancelled_at = None;
                enrollment.cancelled_by = None;
                enrollment.cancel_reason = None;
            }
            EnrollmentTransition::Cancel { at, by, reason } => {
                enrollment.cancelled_at = Some(*at);
                enrollment.cancelled_by = Some(*by);
                enrollment.cancel_reason = reason.clone();
            }
            EnrollmentTransition::NoShow | EnrollmentTransition::Complete => {}
        }
    }
}
