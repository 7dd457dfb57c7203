//! Pure admission and cancellation rules.

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::db::{Profile, TrainingEnrollment, TrainingSession, UserRole};

use super::rejection::Rejection;

/// Cancelling closer than this to the session start is a late cancellation.
pub const LATE_CANCEL_WINDOW: Duration = Duration::hours(24);

/// Longest accepted cancellation reason, in characters.
pub const MAX_CANCEL_REASON_LEN: usize = 500;

pub fn is_late_cancellation(starts_at: OffsetDateTime, cancelled_at: OffsetDateTime) -> bool {
    starts_at - cancelled_at < LATE_CANCEL_WINDOW
}

/// Who an enrollment request targets and whether it is a staff assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub student_id: Uuid,
    pub staff_assigned: bool,
}

impl Target {
    /// Staff assignment overrides the entitlement requirement.
    pub fn requires_entitlement(&self) -> bool {
        !self.staff_assigned
    }
}

pub fn resolve_target(requester: &Profile, requested_student: Option<Uuid>) -> Result<Target, Rejection> {
    let student_id = requested_student.unwrap_or(requester.id);
    if student_id != requester.id && !requester.role.can_assign() {
        return Err(Rejection::NotPermitted);
    }
    Ok(Target {
        student_id,
        staff_assigned: requester.role.can_assign(),
    })
}

pub fn can_cancel(requester: &Profile, enrollment: &TrainingEnrollment) -> bool {
    requester.id == enrollment.student_id || requester.role.can_assign()
}

/// Admins, managers and the instructor assigned to the session.
pub fn can_record_attendance(requester: &Profile, session: &TrainingSession) -> bool {
    requester.role.can_assign()
        || (requester.role == UserRole::Instructor && session.instructor_id == Some(requester.id))
}

pub fn normalize_reason(reason: Option<String>) -> Result<Option<String>, Rejection> {
    let Some(reason) = reason else {
        return Ok(None);
    };
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_CANCEL_REASON_LEN {
        return Err(Rejection::InvalidInput(format!(
            "reason exceeds {MAX_CANCEL_REASON_LEN} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}
