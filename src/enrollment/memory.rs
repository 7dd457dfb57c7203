//! In-memory collaborators for the enrollment gate.
//!
//! A unit of work holds the store mutex for its whole lifetime and edits a private
//! copy of the state, so concurrent admissions are serialized the same way the
//! session row lock serializes them in Postgres. Writes enforce the same constraints
//! the schema does.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use time::{Duration, OffsetDateTime};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::auth::{hash_token, IdentityResolver};
use crate::db::{
    DatabaseError, EnrollmentStatus, EnrollmentTransition, Entitlement, Identity, NewPenalty,
    NewTrainingEnrollment, Notification, Penalty, Profile, TrainingEnrollment, TrainingSession,
};

use super::clock::{Clock, SystemClock};
use super::store::{EnrollmentStore, EnrollmentTx, EntitlementStore, Notifier, ProfileStore};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    profiles: HashMap<Uuid, Profile>,
    tokens: HashMap<String, (Uuid, OffsetDateTime)>,
    student_sites: HashSet<(Uuid, Uuid)>,
    sessions: HashMap<Uuid, TrainingSession>,
    enrollments: Vec<TrainingEnrollment>,
    entitlements: Vec<Entitlement>,
    penalties: Vec<Penalty>,
    notifications: Vec<Notification>,
}

impl MemoryState {
    fn active_count(&self, session_id: Uuid, excluding: Option<Uuid>) -> i64 {
        let count = self
            .enrollments
            .iter()
            .filter(|e| e.session_id == session_id && e.status == EnrollmentStatus::Active)
            .filter(|e| Some(e.id) != excluding)
            .count();
        i64::try_from(count).unwrap_or(i64::MAX)
    }

    fn over_capacity(&self, session_id: Uuid, excluding: Option<Uuid>) -> bool {
        match self.sessions.get(&session_id) {
            Some(session) => self.active_count(session_id, excluding) >= i64::from(session.capacity),
            None => false,
        }
    }
}

#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_notifications: Arc<AtomicBool>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notification and token timestamps are read from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::default(),
            fail_notifications: Arc::default(),
            clock,
        }
    }

    pub async fn add_profile(&self, profile: Profile) {
        self.state.lock().await.profiles.insert(profile.id, profile);
    }

    /// Registers a bearer credential for `user_id` valid until `expires_at`.
    pub async fn issue_token(&self, user_id: Uuid, token: &str, expires_at: OffsetDateTime) {
        self.state
            .lock()
            .await
            .tokens
            .insert(hash_token(token), (user_id, expires_at));
    }

    pub async fn add_student_site(&self, site_id: Uuid, user_id: Uuid) {
        self.state.lock().await.student_sites.insert((site_id, user_id));
    }

    pub async fn add_session(&self, session: TrainingSession) {
        self.state.lock().await.sessions.insert(session.id, session);
    }

    pub async fn add_entitlement(&self, entitlement: Entitlement) {
        self.state.lock().await.entitlements.push(entitlement);
    }

    pub async fn enrollments(&self) -> Vec<TrainingEnrollment> {
        self.state.lock().await.enrollments.clone()
    }

    pub async fn penalties(&self) -> Vec<Penalty> {
        self.state.lock().await.penalties.clone()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.lock().await.notifications.clone()
    }

    pub fn fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        Ok(self.state.lock().await.profiles.get(&user_id).cloned())
    }

    async fn has_site_record(&self, site_id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.state.lock().await.student_sites.contains(&(site_id, user_id)))
    }
}

#[async_trait]
impl EntitlementStore for MemoryStore {
    async fn has_active_entitlement(
        &self,
        user_id: Uuid,
        site_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<bool, DatabaseError> {
        Ok(self
            .state
            .lock()
            .await
            .entitlements
            .iter()
            .any(|e| e.user_id == user_id && e.site_id == site_id && e.is_active(now)))
    }
}

#[async_trait]
impl EnrollmentStore for MemoryStore {
    async fn get_session(&self, session_id: Uuid) -> Result<Option<TrainingSession>, DatabaseError> {
        Ok(self.state.lock().await.sessions.get(&session_id).cloned())
    }

    async fn get_enrollment(&self, enrollment_id: Uuid) -> Result<Option<TrainingEnrollment>, DatabaseError> {
        Ok(self
            .state
            .lock()
            .await
            .enrollments
            .iter()
            .find(|e| e.id == enrollment_id)
            .cloned())
    }

    async fn begin(&self) -> Result<Box<dyn EnrollmentTx>, DatabaseError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl EnrollmentTx for MemoryTx {
    async fn lock_session(&mut self, session_id: Uuid) -> Result<Option<TrainingSession>, DatabaseError> {
        Ok(self.working.sessions.get(&session_id).cloned())
    }

    async fn lock_enrollment(&mut self, enrollment_id: Uuid) -> Result<Option<TrainingEnrollment>, DatabaseError> {
        Ok(self
            .working
            .enrollments
            .iter()
            .find(|e| e.id == enrollment_id)
            .cloned())
    }

    async fn count_active_enrollments(&mut self, session_id: Uuid) -> Result<i64, DatabaseError> {
        Ok(self.working.active_count(session_id, None))
    }

    async fn find_enrollment(
        &mut self,
        session_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<TrainingEnrollment>, DatabaseError> {
        Ok(self
            .working
            .enrollments
            .iter()
            .find(|e| e.session_id == session_id && e.student_id == student_id)
            .cloned())
    }

    async fn insert_enrollment(
        &mut self,
        new_enrollment: NewTrainingEnrollment,
    ) -> Result<TrainingEnrollment, DatabaseError> {
        let duplicate = self
            .working
            .enrollments
            .iter()
            .any(|e| e.session_id == new_enrollment.session_id && e.student_id == new_enrollment.student_id);
        if duplicate {
            return Err(DatabaseError::Duplicate);
        }
        if !self.working.sessions.contains_key(&new_enrollment.session_id) {
            return Err(DatabaseError::InvalidInput("unknown session".to_string()));
        }
        if self.working.over_capacity(new_enrollment.session_id, None) {
            return Err(DatabaseError::CapacityExceeded);
        }

        let enrollment = TrainingEnrollment {
            id: Uuid::now_v7(),
            session_id: new_enrollment.session_id,
            student_id: new_enrollment.student_id,
            site_id: new_enrollment.site_id,
            status: EnrollmentStatus::Active,
            created_at: new_enrollment.created_at,
            cancelled_at: None,
            cancelled_by: None,
            cancel_reason: None,
        };
        self.working.enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn update_enrollment_status(
        &mut self,
        enrollment_id: Uuid,
        transition: EnrollmentTransition,
    ) -> Result<TrainingEnrollment, DatabaseError> {
        let index = self
            .working
            .enrollments
            .iter()
            .position(|e| e.id == enrollment_id)
            .ok_or(DatabaseError::NotFound)?;

        let current = &self.working.enrollments[index];
        if transition.target_status() == EnrollmentStatus::Active
            && current.status != EnrollmentStatus::Active
            && self.working.over_capacity(current.session_id, Some(current.id))
        {
            return Err(DatabaseError::CapacityExceeded);
        }

        let enrollment = &mut self.working.enrollments[index];
        transition.apply(enrollment);
        Ok(enrollment.clone())
    }

    async fn insert_penalty(&mut self, new_penalty: NewPenalty) -> Result<Penalty, DatabaseError> {
        let penalty = Penalty {
            id: Uuid::now_v7(),
            site_id: new_penalty.site_id,
            student_id: new_penalty.student_id,
            session_id: new_penalty.session_id,
            penalty_type: new_penalty.penalty_type,
            created_at: new_penalty.created_at,
        };
        self.working.penalties.push(penalty.clone());
        Ok(penalty)
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl Notifier for MemoryStore {
    async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<(), DatabaseError> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(DatabaseError::Unknown("notification delivery unavailable".to_string()));
        }
        self.state.lock().await.notifications.push(Notification {
            id: Uuid::now_v7(),
            user_id,
            title: title.to_string(),
            body: body.to_string(),
            data: sqlx::types::Json(data),
            is_read: false,
            created_at: self.clock.now(),
            read_at: None,
        });
        Ok(())
    }
}

#[async_trait]
impl IdentityResolver for MemoryStore {
    async fn resolve(&self, credential: &SecretString) -> Result<Option<Identity>, DatabaseError> {
        let state = self.state.lock().await;
        let Some((user_id, expires_at)) = state.tokens.get(&hash_token(credential.expose_secret())) else {
            return Ok(None);
        };
        if *expires_at <= self.clock.now() {
            return Ok(None);
        }
        Ok(state.profiles.get(user_id).map(|profile| Identity {
            user_id: profile.id,
            role: profile.role,
        }))
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: StdMutex<OffsetDateTime>,
}

impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: StdMutex::new(now),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
