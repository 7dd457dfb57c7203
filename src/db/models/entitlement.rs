use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use validator::{Validate, ValidationError};

/// A paid access window at a site.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub site_id: Uuid,
    pub product_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Entitlement {
    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEntitlement {
    pub user_id: Uuid,
    pub site_id: Uuid,
    pub product_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl NewEntitlement {
    pub fn validate_window(&self) -> Result<(), ValidationError> {
        if self.expires_at <= self.starts_at {
            let mut err = ValidationError::new("entitlement_window");
            err.message = Some("Expiry must be after start".into());
            return Err(err);
        }
        Ok(())
    }
}
