//! Bearer credential resolution.
//!
//! Credentials are opaque tokens issued by the managed auth provider; only their
//! SHA-256 digest is stored.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::{DatabaseError, Identity, ProfileRepository, UserRole};
use crate::error::AppError;

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `None` when the credential is unknown or expired.
    async fn resolve(&self, credential: &SecretString) -> Result<Option<Identity>, DatabaseError>;
}

/// Hex-encoded SHA-256 digest of a bearer credential.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub struct PgIdentityResolver {
    pool: PgPool,
}

impl PgIdentityResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityResolver for PgIdentityResolver {
    async fn resolve(&self, credential: &SecretString) -> Result<Option<Identity>, DatabaseError> {
        let token_hash = hash_token(credential.expose_secret());
        Ok(ProfileRepository::resolve_token(&self.pool, &token_hash, OffsetDateTime::now_utc()).await?)
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn require_assign_privilege(&self) -> Result<(), AppError> {
        if self.role.can_assign() {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "role {} cannot manage sessions",
                self.role.as_str()
            )))
        }
    }
}

fn bearer_credential(parts: &Parts) -> Option<SecretString> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return None;
    }
    Some(SecretString::from(token.trim().to_string()))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credential = bearer_credential(parts)
            .ok_or_else(|| AppError::Authentication("missing bearer credential".to_string()))?;

        let identity = state
            .identity
            .resolve(&credential)
            .await?
            .ok_or_else(|| AppError::Authentication("unknown or expired credential".to_string()))?;

        Ok(CurrentUser {
            user_id: identity.user_id,
            role: identity.role,
        })
    }
}
