use sqlx::{Error, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::{Identity, Profile};

pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn get_profile_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<Profile>, Error> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, full_name, email, role, created_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Looks up an unexpired auth token by the SHA-256 digest of its bearer value.
    pub async fn resolve_token(
        pool: &PgPool,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<Identity>, Error> {
        sqlx::query_as::<_, Identity>(
            r#"
            SELECT p.id AS user_id, p.role
            FROM auth_tokens t
            JOIN profiles p ON p.id = t.user_id
            WHERE t.token_hash = $1 AND t.expires_at > $2
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(pool)
        .await
    }

    pub async fn has_site_record(pool: &PgPool, site_id: Uuid, user_id: Uuid) -> Result<bool, Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM student_sites
                WHERE site_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(site_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
