use sqlx::{Error, Postgres, Transaction};
use uuid::Uuid;

use crate::db::models::{NewPenalty, Penalty};

pub struct PenaltyRepository;

impl PenaltyRepository {
    pub async fn insert_penalty(
        tx: &mut Transaction<'_, Postgres>,
        new_penalty: &NewPenalty,
    ) -> Result<Penalty, Error> {
        sqlx::query_as::<_, Penalty>(
            r#"
            INSERT INTO penalties (id, site_id, student_id, session_id, penalty_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, site_id, student_id, session_id, penalty_type, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_penalty.site_id)
        .bind(new_penalty.student_id)
        .bind(new_penalty.session_id)
        .bind(new_penalty.penalty_type)
        .bind(new_penalty.created_at)
        .fetch_one(&mut **tx)
        .await
    }
}
