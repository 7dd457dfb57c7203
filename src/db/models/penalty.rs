use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "penalty_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PenaltyType {
    LateCancel,
    NoShow,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Penalty {
    pub id: Uuid,
    pub site_id: Uuid,
    pub student_id: Uuid,
    pub session_id: Option<Uuid>,
    pub penalty_type: PenaltyType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPenalty {
    pub site_id: Uuid,
    pub student_id: Uuid,
    pub session_id: Option<Uuid>,
    pub penalty_type: PenaltyType,
    pub created_at: OffsetDateTime,
}
