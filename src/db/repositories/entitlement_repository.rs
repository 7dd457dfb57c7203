use sqlx::{Error, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::{Entitlement, NewEntitlement};

pub struct EntitlementRepository;

impl EntitlementRepository {
    pub async fn has_active_entitlement(
        pool: &PgPool,
        user_id: Uuid,
        site_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<bool, Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM entitlements
                WHERE user_id = $1 AND site_id = $2 AND expires_at > $3
            )
            "#,
        )
        .bind(user_id)
        .bind(site_id)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn create_entitlement(
        pool: &PgPool,
        new_entitlement: &NewEntitlement,
    ) -> Result<Entitlement, Error> {
        sqlx::query_as::<_, Entitlement>(
            r#"
            INSERT INTO entitlements (id, user_id, site_id, product_id, starts_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, site_id, product_id, starts_at, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_entitlement.user_id)
        .bind(new_entitlement.site_id)
        .bind(new_entitlement.product_id)
        .bind(new_entitlement.starts_at)
        .bind(new_entitlement.expires_at)
        .fetch_one(pool)
        .await
    }

    pub async fn list_entitlements_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Entitlement>, Error> {
        sqlx::query_as::<_, Entitlement>(
            r#"
            SELECT id, user_id, site_id, product_id, starts_at, expires_at, created_at
            FROM entitlements
            WHERE user_id = $1
            ORDER BY expires_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
