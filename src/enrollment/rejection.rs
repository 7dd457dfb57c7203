use serde::Serialize;
use thiserror::Error;

use crate::db::DatabaseError;

/// Broad rejection category; decides the HTTP status of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    Unauthorized,
    NotFound,
    Forbidden,
    Conflict,
    InvalidState,
    InvalidInput,
}

/// A business-rule rejection. Expected outcome, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("requester has no profile")]
    UnknownRequester,
    #[error("session not found")]
    SessionNotFound,
    #[error("session already started or past")]
    SessionStarted,
    #[error("session has not started yet")]
    SessionNotStarted,
    #[error("not permitted to act for another student")]
    NotPermitted,
    #[error("student has no record at the session's site")]
    StudentNotAtSite,
    #[error("no active entitlement for the session's site")]
    NoActiveEntitlement,
    #[error("session full")]
    SessionFull,
    #[error("already enrolled")]
    AlreadyEnrolled,
    #[error("enrollment already closed as no-show or completed")]
    EnrollmentClosed,
    #[error("enrollment is cancelled")]
    EnrollmentCancelled,
    #[error("enrollment not found")]
    EnrollmentNotFound,
    #[error("capacity below current active enrollments")]
    CapacityBelowActive,
    #[error("session has enrollment history")]
    SessionHasEnrollments,
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Rejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::UnknownRequester => RejectionKind::Unauthorized,
            Rejection::SessionNotFound
            | Rejection::StudentNotAtSite
            | Rejection::EnrollmentNotFound => RejectionKind::NotFound,
            Rejection::NotPermitted | Rejection::NoActiveEntitlement => RejectionKind::Forbidden,
            Rejection::SessionFull
            | Rejection::AlreadyEnrolled
            | Rejection::EnrollmentClosed
            | Rejection::CapacityBelowActive
            | Rejection::SessionHasEnrollments => RejectionKind::Conflict,
            Rejection::SessionStarted
            | Rejection::SessionNotStarted
            | Rejection::EnrollmentCancelled => RejectionKind::InvalidState,
            Rejection::InvalidInput(_) => RejectionKind::InvalidInput,
        }
    }

    /// Stable machine-readable code, sent alongside the localized message.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::UnknownRequester => "unknown_requester",
            Rejection::SessionNotFound => "session_not_found",
            Rejection::SessionStarted => "session_started",
            Rejection::SessionNotStarted => "session_not_started",
            Rejection::NotPermitted => "not_permitted",
            Rejection::StudentNotAtSite => "student_not_at_site",
            Rejection::NoActiveEntitlement => "no_active_entitlement",
            Rejection::SessionFull => "session_full",
            Rejection::AlreadyEnrolled => "already_enrolled",
            Rejection::EnrollmentClosed => "enrollment_closed",
            Rejection::EnrollmentCancelled => "enrollment_cancelled",
            Rejection::EnrollmentNotFound => "enrollment_not_found",
            Rejection::CapacityBelowActive => "capacity_below_active",
            Rejection::SessionHasEnrollments => "session_has_enrollments",
            Rejection::InvalidInput(_) => "invalid_input",
        }
    }

    /// Fluent message id of the user-facing text.
    pub fn message_key(&self) -> String {
        format!("rejection-{}", self.code().replace('_', "-"))
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("store failure: {0}")]
    Internal(#[from] DatabaseError),
}

impl GateError {
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            GateError::Rejected(rejection) => Some(rejection),
            GateError::Internal(_) => None,
        }
    }
}
