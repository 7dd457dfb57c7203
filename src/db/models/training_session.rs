use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "session_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionCategory {
    Theory,
    Practice,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSession {
    pub id: Uuid,
    pub site_id: Uuid,
    pub category: SessionCategory,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
    pub capacity: i32,
    pub location: Option<String>,
    pub instructor_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TrainingSession {
    pub fn has_started(&self, now: OffsetDateTime) -> bool {
        self.starts_at <= now
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTrainingSession {
    pub site_id: Uuid,
    pub category: SessionCategory,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: i32,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
    pub instructor_id: Option<Uuid>,
}

impl NewTrainingSession {
    pub fn validate_window(&self) -> Result<(), ValidationError> {
        check_window(self.starts_at, self.ends_at)
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrainingSession {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub starts_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub ends_at: Option<OffsetDateTime>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<i32>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
    pub instructor_id: Option<Uuid>,
}

impl UpdateTrainingSession {
    /// Validates the window that results from applying this update to `current`.
    pub fn validate_window(&self, current: &TrainingSession) -> Result<(), ValidationError> {
        check_window(
            self.starts_at.unwrap_or(current.starts_at),
            self.ends_at.unwrap_or(current.ends_at),
        )
    }
}

fn check_window(starts_at: OffsetDateTime, ends_at: OffsetDateTime) -> Result<(), ValidationError> {
    if ends_at <= starts_at {
        let mut err = ValidationError::new("session_window");
        err.message = Some("End time must be after start time".into());
        return Err(err);
    }
    Ok(())
}
