use sqlx::{Error, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db::models::{
    EnrollmentStatus, EnrollmentTransition, NewTrainingEnrollment, TrainingEnrollment,
};

pub struct EnrollmentRepository;

impl EnrollmentRepository {
    pub async fn count_active_enrollments(
        tx: &mut Transaction<'_, Postgres>,
        session_id: Uuid,
    ) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM enrollments WHERE session_id = $1 AND status = $2",
        )
        .bind(session_id)
        .bind(EnrollmentStatus::Active)
        .fetch_one(&mut **tx)
        .await
    }

    /// Counts rows of any status; used to block session deletion.
    pub async fn count_enrollments(
        tx: &mut Transaction<'_, Postgres>,
        session_id: Uuid,
    ) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM enrollments WHERE session_id = $1")
            .bind(session_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_enrollment(
        tx: &mut Transaction<'_, Postgres>,
        session_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<TrainingEnrollment>, Error> {
        sqlx::query_as::<_, TrainingEnrollment>(
            r#"
            SELECT id, session_id, student_id, site_id, status, created_at, cancelled_at, cancelled_by, cancel_reason
            FROM enrollments
            WHERE session_id = $1 AND student_id = $2
            "#,
        )
        .bind(session_id)
        .bind(student_id)
        .fetch_optional(&mut **tx)
        .await
    }

    pub async fn get_enrollment_by_id(
        pool: &PgPool,
        enrollment_id: Uuid,
    ) -> Result<Option<TrainingEnrollment>, Error> {
        sqlx::query_as::<_, TrainingEnrollment>(
            r#"
            SELECT id, session_id, student_id, site_id, status, created_at, cancelled_at, cancelled_by, cancel_reason
            FROM enrollments
            WHERE id = $1
            "#,
        )
        .bind(enrollment_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn lock_enrollment(
        tx: &mut Transaction<'_, Postgres>,
        enrollment_id: Uuid,
    ) -> Result<Option<TrainingEnrollment>, Error> {
        sqlx::query_as::<_, TrainingEnrollment>(
            r#"
            SELECT id, session_id, student_id, site_id, status, created_at, cancelled_at, cancelled_by, cancel_reason
            FROM enrollments
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(enrollment_id)
        .fetch_optional(&mut **tx)
        .await
    }

    pub async fn insert_enrollment(
        tx: &mut Transaction<'_, Postgres>,
        new_enrollment: &NewTrainingEnrollment,
    ) -> Result<TrainingEnrollment, Error> {
        sqlx::query_as::<_, TrainingEnrollment>(
            r#"
            INSERT INTO enrollments (id, session_id, student_id, site_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, session_id, student_id, site_id, status, created_at, cancelled_at, cancelled_by, cancel_reason
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_enrollment.session_id)
        .bind(new_enrollment.student_id)
        .bind(new_enrollment.site_id)
        .bind(EnrollmentStatus::Active)
        .bind(new_enrollment.created_at)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn update_enrollment_status(
        tx: &mut Transaction<'_, Postgres>,
        enrollment_id: Uuid,
        transition: &EnrollmentTransition,
    ) -> Result<TrainingEnrollment, Error> {
        let (cancelled_at, cancelled_by, cancel_reason) = match transition {
            EnrollmentTransition::Cancel { at, by, reason } => (Some(*at), Some(*by), reason.clone()),
            _ => (None, None, None),
        };
        // Only a cancellation writes the cancellation fields; reactivation clears them.
        let touch_cancellation = matches!(
            transition,
            EnrollmentTransition::Cancel { .. } | EnrollmentTransition::Reactivate
        );

        sqlx::query_as::<_, TrainingEnrollment>(
            r#"
            UPDATE enrollments
            SET
                status = $1,
                cancelled_at = CASE WHEN $2 THEN $3 ELSE cancelled_at END,
                cancelled_by = CASE WHEN $2 THEN $4 ELSE cancelled_by END,
                cancel_reason = CASE WHEN $2 THEN $5 ELSE cancel_reason END
            WHERE id = $6
            RETURNING id, session_id, student_id, site_id, status, created_at, cancelled_at, cancelled_by, cancel_reason
            "#,
        )
        .bind(transition.target_status())
        .bind(touch_cancellation)
        .bind(cancelled_at)
        .bind(cancelled_by)
        .bind(cancel_reason)
        .bind(enrollment_id)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn list_enrollments_for_session(
        pool: &PgPool,
        session_id: Uuid,
    ) -> Result<Vec<TrainingEnrollment>, Error> {
        sqlx::query_as::<_, TrainingEnrollment>(
            r#"
            SELECT id, session_id, student_id, site_id, status, created_at, cancelled_at, cancelled_by, cancel_reason
            FROM enrollments
            WHERE session_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_enrollments_for_student(
        pool: &PgPool,
        student_id: Uuid,
    ) -> Result<Vec<TrainingEnrollment>, Error> {
        sqlx::query_as::<_, TrainingEnrollment>(
            r#"
            SELECT e.id, e.session_id, e.student_id, e.site_id, e.status, e.created_at,
                   e.cancelled_at, e.cancelled_by, e.cancel_reason
            FROM enrollments e
            JOIN sessions s ON s.id = e.session_id
            WHERE e.student_id = $1
            ORDER BY s.starts_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(pool)
        .await
    }
}
