//! Database repository for refresh credentials.
//!
//! Stores only one-way hashes of issued refresh tokens. The write paths take a
//! generic executor so the session manager can revoke the consumed credential
//! and insert its replacement inside one transaction.

use crate::database::models::{CreateRefreshCredential, RefreshCredential};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteExecutor;

const CREDENTIAL_COLUMNS: &str =
    "id, user_id, token_hash, expires_at, is_revoked, revoked_at, created_at";

/// Repository for refresh credential database operations.
pub struct RefreshTokenRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> RefreshTokenRepository<'a> {
    /// Creates a new RefreshTokenRepository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a credential using the pool.
    pub async fn create_credential(
        &self,
        credential: CreateRefreshCredential,
    ) -> Result<RefreshCredential> {
        Self::insert(self.pool, credential).await
    }

    /// Inserts a credential on the given executor (pool, connection or transaction).
    pub async fn insert<'e, E>(
        executor: E,
        credential: CreateRefreshCredential,
    ) -> Result<RefreshCredential>
    where
        E: SqliteExecutor<'e>,
    {
        let credential = sqlx::query_as::<_, RefreshCredential>(&format!(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, is_revoked, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            RETURNING {CREDENTIAL_COLUMNS}
            "#
        ))
        .bind(&credential.id)
        .bind(&credential.user_id)
        .bind(&credential.token_hash)
        .bind(credential.expires_at)
        .bind(Utc::now())
        .fetch_one(executor)
        .await?;

        Ok(credential)
    }

    /// Retrieves the credentials of a user that are neither revoked nor expired
    /// at `now`, oldest first.
    pub async fn get_active_for_user(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<RefreshCredential>> {
        let credentials = sqlx::query_as::<_, RefreshCredential>(&format!(
            r#"
            SELECT {CREDENTIAL_COLUMNS} FROM refresh_tokens
            WHERE user_id = ? AND is_revoked = 0 AND expires_at > ?
            ORDER BY created_at ASC
            "#
        ))
        .bind(user_id)
        .bind(now)
        .fetch_all(self.pool)
        .await?;

        Ok(credentials
            .into_iter()
            .filter(|credential| credential.is_usable_at(now))
            .collect())
    }

    /// Retrieves a credential by id regardless of state.
    pub async fn get_credential_by_id(&self, id: &str) -> Result<Option<RefreshCredential>> {
        let credential = sqlx::query_as::<_, RefreshCredential>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM refresh_tokens WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(credential)
    }

    /// Marks a credential revoked if it is still unrevoked.
    ///
    /// # Returns
    /// `true` only for the caller whose update flipped the flag; concurrent
    /// callers racing on the same row observe `false`.
    pub async fn revoke<'e, E>(executor: E, id: &str, now: DateTime<Utc>) -> Result<bool>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET is_revoked = 1, revoked_at = ? WHERE id = ? AND is_revoked = 0",
        )
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Revokes every live credential of a user, returning how many were revoked.
    pub async fn revoke_all_for_user(&self, user_id: &str, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET is_revoked = 1, revoked_at = ? WHERE user_id = ? AND is_revoked = 0",
        )
        .bind(now)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes credentials that can never authorize a refresh again.
    pub async fn delete_stale(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE is_revoked = 1 OR expires_at <= ?")
            .bind(now)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
