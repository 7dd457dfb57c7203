//! Postgres-backed implementations of the gate's collaborators.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use tokio::sync::broadcast;
use uuid::Uuid;
use validator::Validate;

use crate::db::{
    DatabaseError, EnrollmentRepository, EnrollmentTransition, EntitlementRepository, NewNotification,
    NewPenalty, NewTrainingEnrollment, NotificationRepository, Penalty, PenaltyRepository, Profile,
    ProfileRepository, SessionRepository, TrainingEnrollment, TrainingSession,
};
use crate::websocket::LiveEvent;

use super::store::{EnrollmentStore, EnrollmentTx, EntitlementStore, Notifier, ProfileStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        Ok(ProfileRepository::get_profile_by_id(&self.pool, user_id).await?)
    }

    async fn has_site_record(&self, site_id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        Ok(ProfileRepository::has_site_record(&self.pool, site_id, user_id).await?)
    }
}

#[async_trait]
impl EntitlementStore for PgStore {
    async fn has_active_entitlement(
        &self,
        user_id: Uuid,
        site_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<bool, DatabaseError> {
        Ok(EntitlementRepository::has_active_entitlement(&self.pool, user_id, site_id, now).await?)
    }
}

#[async_trait]
impl EnrollmentStore for PgStore {
    async fn get_session(&self, session_id: Uuid) -> Result<Option<TrainingSession>, DatabaseError> {
        Ok(SessionRepository::get_session_by_id(&self.pool, session_id).await?)
    }

    async fn get_enrollment(&self, enrollment_id: Uuid) -> Result<Option<TrainingEnrollment>, DatabaseError> {
        Ok(EnrollmentRepository::get_enrollment_by_id(&self.pool, enrollment_id).await?)
    }

    async fn begin(&self) -> Result<Box<dyn EnrollmentTx>, DatabaseError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionError(e.to_string()))?;
        Ok(Box::new(PgEnrollmentTx { tx }))
    }
}

/// Rolls back on drop unless committed.
pub struct PgEnrollmentTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl EnrollmentTx for PgEnrollmentTx {
    async fn lock_session(&mut self, session_id: Uuid) -> Result<Option<TrainingSession>, DatabaseError> {
        Ok(SessionRepository::lock_session(&mut self.tx, session_id).await?)
    }

    async fn lock_enrollment(&mut self, enrollment_id: Uuid) -> Result<Option<TrainingEnrollment>, DatabaseError> {
        Ok(EnrollmentRepository::lock_enrollment(&mut self.tx, enrollment_id).await?)
    }

    async fn count_active_enrollments(&mut self, session_id: Uuid) -> Result<i64, DatabaseError> {
        Ok(EnrollmentRepository::count_active_enrollments(&mut self.tx, session_id).await?)
    }

    async fn find_enrollment(
        &mut self,
        session_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<TrainingEnrollment>, DatabaseError> {
        Ok(EnrollmentRepository::find_enrollment(&mut self.tx, session_id, student_id).await?)
    }

    async fn insert_enrollment(
        &mut self,
        new_enrollment: NewTrainingEnrollment,
    ) -> Result<TrainingEnrollment, DatabaseError> {
        Ok(EnrollmentRepository::insert_enrollment(&mut self.tx, &new_enrollment).await?)
    }

    async fn update_enrollment_status(
        &mut self,
        enrollment_id: Uuid,
        transition: EnrollmentTransition,
    ) -> Result<TrainingEnrollment, DatabaseError> {
        Ok(EnrollmentRepository::update_enrollment_status(&mut self.tx, enrollment_id, &transition).await?)
    }

    async fn insert_penalty(&mut self, new_penalty: NewPenalty) -> Result<Penalty, DatabaseError> {
        Ok(PenaltyRepository::insert_penalty(&mut self.tx, &new_penalty).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        Ok(self.tx.commit().await?)
    }
}

/// Persists an in-app notification, then pushes it to connected websocket clients.
pub struct PgNotifier {
    pool: PgPool,
    live_tx: broadcast::Sender<LiveEvent>,
}

impl PgNotifier {
    pub fn new(pool: PgPool, live_tx: broadcast::Sender<LiveEvent>) -> Self {
        Self { pool, live_tx }
    }
}

#[async_trait]
impl Notifier for PgNotifier {
    async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<(), DatabaseError> {
        let new_notification = NewNotification {
            user_id,
            title: title.to_string(),
            body: body.to_string(),
            data,
        };
        new_notification
            .validate()
            .map_err(|e| DatabaseError::InvalidInput(e.to_string()))?;

        let notification = NotificationRepository::create_notification(&self.pool, &new_notification).await?;

        // No subscribers is the normal case when the user is offline.
        let _ = self.live_tx.send(LiveEvent::from(&notification));
        Ok(())
    }
}
