use sqlx::{Error, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::{NewTrainingSession, TrainingSession, UpdateTrainingSession};

pub struct SessionRepository;

impl SessionRepository {
    pub async fn create_session(
        pool: &PgPool,
        new_session: &NewTrainingSession,
    ) -> Result<TrainingSession, Error> {
        sqlx::query_as::<_, TrainingSession>(
            r#"
            INSERT INTO sessions (id, site_id, category, starts_at, ends_at, capacity, location, instructor_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, site_id, category, starts_at, ends_at, capacity, location, instructor_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_session.site_id)
        .bind(new_session.category)
        .bind(new_session.starts_at)
        .bind(new_session.ends_at)
        .bind(new_session.capacity)
        .bind(&new_session.location)
        .bind(new_session.instructor_id)
        .fetch_one(pool)
        .await
    }

    pub async fn get_session_by_id(pool: &PgPool, session_id: Uuid) -> Result<Option<TrainingSession>, Error> {
        sqlx::query_as::<_, TrainingSession>(
            r#"
            SELECT id, site_id, category, starts_at, ends_at, capacity, location, instructor_id, created_at, updated_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(pool)
        .await
    }

    /// Reads the session and holds its row lock until the transaction ends.
    ///
    /// Every admission takes this lock first, so admissions to one session are serialized.
    pub async fn lock_session(
        tx: &mut Transaction<'_, Postgres>,
        session_id: Uuid,
    ) -> Result<Option<TrainingSession>, Error> {
        sqlx::query_as::<_, TrainingSession>(
            r#"
            SELECT id, site_id, category, starts_at, ends_at, capacity, location, instructor_id, created_at, updated_at
            FROM sessions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(session_id)
        .fetch_optional(&mut **tx)
        .await
    }

    pub async fn update_session(
        tx: &mut Transaction<'_, Postgres>,
        session_id: Uuid,
        update: &UpdateTrainingSession,
    ) -> Result<TrainingSession, Error> {
        sqlx::query_as::<_, TrainingSession>(
            r#"
            UPDATE sessions
            SET
                starts_at = COALESCE($1, starts_at),
                ends_at = COALESCE($2, ends_at),
                capacity = COALESCE($3, capacity),
                location = COALESCE($4, location),
                instructor_id = COALESCE($5, instructor_id),
                updated_at = NOW()
            WHERE id = $6
            RETURNING id, site_id, category, starts_at, ends_at, capacity, location, instructor_id, created_at, updated_at
            "#,
        )
        .bind(update.starts_at)
        .bind(update.ends_at)
        .bind(update.capacity)
        .bind(&update.location)
        .bind(update.instructor_id)
        .bind(session_id)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn delete_session(tx: &mut Transaction<'_, Postgres>, session_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Sessions of a site ending after `from`, soonest first.
    pub async fn list_sessions_for_site(
        pool: &PgPool,
        site_id: Uuid,
        from: OffsetDateTime,
    ) -> Result<Vec<TrainingSession>, Error> {
        sqlx::query_as::<_, TrainingSession>(
            r#"
            SELECT id, site_id, category, starts_at, ends_at, capacity, location, instructor_id, created_at, updated_at
            FROM sessions
            WHERE site_id = $1 AND ends_at > $2
            ORDER BY starts_at ASC
            "#,
        )
        .bind(site_id)
        .bind(from)
        .fetch_all(pool)
        .await
    }
}
