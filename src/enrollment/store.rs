//! Collaborator contracts consumed by the enrollment gate.
//!
//! The gate only sees these traits; Postgres and in-memory implementations live in
//! sibling modules.

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{
    DatabaseError, EnrollmentTransition, NewPenalty, NewTrainingEnrollment, Penalty, Profile,
    TrainingEnrollment, TrainingSession,
};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, DatabaseError>;

    async fn has_site_record(&self, site_id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// True when at least one entitlement for (user, site) expires strictly after `now`.
    async fn has_active_entitlement(
        &self,
        user_id: Uuid,
        site_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    async fn get_session(&self, session_id: Uuid) -> Result<Option<TrainingSession>, DatabaseError>;

    async fn get_enrollment(&self, enrollment_id: Uuid) -> Result<Option<TrainingEnrollment>, DatabaseError>;

    async fn begin(&self) -> Result<Box<dyn EnrollmentTx>, DatabaseError>;
}

/// A unit of work over sessions, enrollments and penalties.
///
/// Dropping the handle without `commit` discards every write. Locks are always taken
/// session first, enrollment second.
#[async_trait]
pub trait EnrollmentTx: Send {
    /// Reads a session and excludes concurrent admissions to it until the unit ends.
    async fn lock_session(&mut self, session_id: Uuid) -> Result<Option<TrainingSession>, DatabaseError>;

    async fn lock_enrollment(&mut self, enrollment_id: Uuid) -> Result<Option<TrainingEnrollment>, DatabaseError>;

    async fn count_active_enrollments(&mut self, session_id: Uuid) -> Result<i64, DatabaseError>;

    async fn find_enrollment(
        &mut self,
        session_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<TrainingEnrollment>, DatabaseError>;

    async fn insert_enrollment(
        &mut self,
        new_enrollment: NewTrainingEnrollment,
    ) -> Result<TrainingEnrollment, DatabaseError>;

    async fn update_enrollment_status(
        &mut self,
        enrollment_id: Uuid,
        transition: EnrollmentTransition,
    ) -> Result<TrainingEnrollment, DatabaseError>;

    async fn insert_penalty(&mut self, new_penalty: NewPenalty) -> Result<Penalty, DatabaseError>;

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;
}

/// Best-effort delivery of in-app and live notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<(), DatabaseError>;
}
