//! User and API key repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// User profile
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// API key as seen by the auth middleware
#[derive(Debug, Clone, FromRow)]
pub struct ApiKeyRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub is_active: bool,
}

/// Outcome of a profile sync
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// First sync: the profile was filled in
    Created(User),
    /// Profile already existed; last login refreshed
    Synced(User),
}

/// SHA-256 hex digest of a raw API key. Only this digest is stored.
pub fn hash_api_key(raw_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Repository for users and their API keys
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, picture, last_login_at, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find a user by email, creating an unsynced profile if missing
    pub async fn find_or_create_by_email(&self, email: &str) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id, email, name, picture, last_login_at, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email.trim().to_lowercase())
        .fetch_one(&self.pool)
        .await
    }

    /// Fill in a profile on first sync, or refresh last login afterwards.
    ///
    /// A profile counts as synced once it has a name.
    pub async fn sync_profile(
        &self,
        user_id: Uuid,
        name: Option<&str>,
        picture: Option<&str>,
    ) -> Result<Option<SyncOutcome>, sqlx::Error> {
        let Some(existing) = self.find(user_id).await? else {
            return Ok(None);
        };

        let first_sync = existing.name.is_none();
        let name = name
            .map(str::to_string)
            .or_else(|| first_sync.then(|| default_display_name(&existing.email)));

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                picture = COALESCE($3, picture),
                last_login_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, picture, last_login_at, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(picture)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(if first_sync {
            SyncOutcome::Created(user)
        } else {
            SyncOutcome::Synced(user)
        }))
    }

    /// Look up an API key by its raw value
    pub async fn find_api_key(&self, raw_key: &str) -> Result<Option<ApiKeyRecord>, sqlx::Error> {
        sqlx::query_as::<_, ApiKeyRecord>(
            r#"
            SELECT id, user_id, name, is_active
            FROM api_keys
            WHERE key_hash = $1
            "#,
        )
        .bind(hash_api_key(raw_key))
        .fetch_optional(&self.pool)
        .await
    }

    /// Store a new API key for a user. The raw key itself is not persisted.
    pub async fn insert_api_key(
        &self,
        user_id: Uuid,
        name: &str,
        raw_key: &str,
    ) -> Result<Uuid, sqlx::Error> {
        let id = Uuid::new_v4();
        let prefix: String = raw_key.chars().take(8).collect();

        sqlx::query(
            r#"
            INSERT INTO api_keys (id, user_id, name, key_hash, key_prefix, is_active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .bind(hash_api_key(raw_key))
        .bind(prefix)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }
}

/// Local part of an email address, used as a name until the user sets one
pub fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_api_key_is_sha256_hex() {
        let hash = hash_api_key("test_key_123");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash_api_key("test_key_123"));
        assert_ne!(hash, hash_api_key("test_key_124"));
    }

    #[test]
    fn test_default_display_name() {
        assert_eq!(default_display_name("priya@example.com"), "priya");
        assert_eq!(default_display_name("no-at-sign"), "no-at-sign");
    }
}
