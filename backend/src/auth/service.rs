//! Core business logic for the authentication system.
//!
//! Issues paired access/refresh tokens, rotates refresh tokens one time each,
//! revokes sessions at logout and authenticates access tokens.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::auth::models::*;
use crate::config::Config;
use crate::database::models::{CreateRefreshCredential, RefreshCredential, Role, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::refresh_token_repository::RefreshTokenRepository;
use crate::repositories::user_repository::UserRepository;
use crate::services::user_service::UserService;
use crate::utils::hashing::{hash_refresh_secret, verify_refresh_secret};
use crate::utils::jwt::JwtUtils;
use crate::utils::validation::validate_input;

/// Authentication service for handling login, token generation and rotation
pub struct AuthService<'a> {
    pool: &'a SqlitePool,
    jwt_utils: JwtUtils,
    user_service: UserService<'a>,
    config: &'a Config,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService instance
    pub fn new(pool: &'a SqlitePool, config: &'a Config) -> ServiceResult<Self> {
        let jwt_utils = JwtUtils::new(config)?;
        let user_service = UserService::new(pool, config);

        Ok(AuthService {
            pool,
            jwt_utils,
            user_service,
            config,
        })
    }

    /// Authenticate user credentials and issue a token pair
    pub async fn login(&self, login_request: LoginRequest) -> ServiceResult<LoginResponse> {
        validate_input(&login_request)?;

        let user = self
            .user_service
            .authenticate_user(&login_request.email, &login_request.password)
            .await?;

        let tokens = self.issue_tokens(&user).await?;
        info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(LoginResponse {
            tokens,
            user: UserInfo::from(&user),
        })
    }

    /// Sign a new access/refresh pair for the identity and persist the hash
    /// of the refresh token.
    pub async fn issue_tokens(&self, user: &User) -> ServiceResult<TokenPair> {
        let (tokens, credential) = self.sign_pair(user)?;

        RefreshTokenRepository::new(self.pool)
            .create_credential(credential)
            .await?;

        Ok(tokens)
    }

    /// Exchange a refresh token for a new pair, revoking the presented one.
    ///
    /// # Errors
    /// `Unauthorized` if the token fails signature or expiry checks, the
    /// identity is missing or deactivated, no live credential matches, or a
    /// concurrent rotation consumed the credential first.
    pub async fn rotate_refresh(&self, presented: &str) -> ServiceResult<TokenPair> {
        let claims = self.jwt_utils.validate_refresh_token(presented)?;

        let user = UserRepository::new(self.pool)
            .get_user_by_id(claims.user_id())
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| ServiceError::unauthorized("Invalid authentication"))?;

        let now = Utc::now();
        let matched = self
            .find_matching_credential(&user.id, presented, now)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %user.id, "Refresh token did not match a live credential");
                ServiceError::unauthorized("Invalid refresh token")
            })?;

        let (tokens, replacement) = self.sign_pair(&user)?;

        if !self.swap_credential(&matched.id, replacement, now).await? {
            warn!(user_id = %user.id, credential_id = %matched.id, "Refresh credential already consumed");
            return Err(ServiceError::unauthorized("Invalid refresh token"));
        }

        info!(user_id = %user.id, "Refresh token rotated");
        Ok(tokens)
    }

    /// Revoke the session belonging to a refresh token.
    ///
    /// Unknown, expired, already revoked or malformed tokens are ignored.
    pub async fn revoke_session(&self, presented: &str) -> ServiceResult<()> {
        let claims = match self.jwt_utils.validate_refresh_token(presented) {
            Ok(claims) => claims,
            Err(error) => {
                debug!("Ignoring unverifiable refresh token at logout: {}", error);
                return Ok(());
            }
        };

        let now = Utc::now();
        if let Some(credential) = self
            .find_matching_credential(claims.user_id(), presented, now)
            .await?
        {
            RefreshTokenRepository::revoke(self.pool, &credential.id, now).await?;
            info!(user_id = %credential.user_id, "Session revoked");
        }

        Ok(())
    }

    /// Check an access token's signature and expiry. No storage lookup.
    pub fn verify_access(&self, access_token: &str) -> ServiceResult<AuthenticatedUser> {
        let claims = self.jwt_utils.validate_access_token(access_token)?;
        let role = claims.role();
        Ok(AuthenticatedUser {
            id: claims.sub,
            role,
        })
    }

    /// Verify an access token and require its identity to still exist and be active
    pub async fn authenticate(&self, access_token: &str) -> ServiceResult<AuthenticatedUser> {
        let verified = self.verify_access(access_token)?;

        let user = UserRepository::new(self.pool)
            .get_user_by_id(&verified.id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| ServiceError::unauthorized("Invalid authentication"))?;

        Ok(AuthenticatedUser {
            id: user.id,
            role: user.role,
        })
    }

    /// Fail with `Forbidden` unless the user holds one of the allowed roles
    pub fn require_role(user: &AuthenticatedUser, allowed: &[Role]) -> ServiceResult<()> {
        if allowed.contains(&user.role) {
            Ok(())
        } else {
            Err(ServiceError::forbidden("Forbidden"))
        }
    }

    /// Delete credentials that are revoked or expired
    pub async fn purge_expired_sessions(&self) -> ServiceResult<u64> {
        let removed = RefreshTokenRepository::new(self.pool)
            .delete_stale(Utc::now())
            .await?;
        debug!(removed, "Purged stale refresh credentials");
        Ok(removed)
    }

    fn sign_pair(&self, user: &User) -> ServiceResult<(TokenPair, CreateRefreshCredential)> {
        let access = self.jwt_utils.generate_access_token(&user.id, user.role)?;
        let refresh = self.jwt_utils.generate_refresh_token(&user.id, user.role)?;

        let credential = CreateRefreshCredential {
            id: uuid::Uuid::now_v7().to_string(),
            user_id: user.id.clone(),
            token_hash: hash_refresh_secret(&refresh.token)?,
            expires_at: refresh.expires_at,
        };

        let tokens = TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in: self.config.access_token_ttl_seconds(),
            refresh_expires_at: refresh.expires_at,
        };

        Ok((tokens, credential))
    }

    /// Revokes `consumed_id` and stores its replacement in one write
    /// transaction. Returns `false`, with nothing written, when the credential
    /// was already revoked.
    ///
    /// `BEGIN IMMEDIATE` takes the write lock before the conditional update
    /// reads the row, so a competing rotation waits for this one to finish and
    /// then sees the committed revoke.
    async fn swap_credential(
        &self,
        consumed_id: &str,
        replacement: CreateRefreshCredential,
        now: chrono::DateTime<Utc>,
    ) -> ServiceResult<bool> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let outcome = async {
            if !RefreshTokenRepository::revoke(&mut *conn, consumed_id, now).await? {
                return Ok(false);
            }
            RefreshTokenRepository::insert(&mut *conn, replacement).await?;
            Ok::<bool, anyhow::Error>(true)
        }
        .await;

        let finish = if matches!(outcome, Ok(true)) { "COMMIT" } else { "ROLLBACK" };
        sqlx::query(finish).execute(&mut *conn).await?;

        Ok(outcome?)
    }

    // O(n) in the user's live sessions: only hashes are stored, so each one
    // has to be verified against the presented token.
    async fn find_matching_credential(
        &self,
        user_id: &str,
        presented: &str,
        now: chrono::DateTime<Utc>,
    ) -> ServiceResult<Option<RefreshCredential>> {
        let candidates = RefreshTokenRepository::new(self.pool)
            .get_active_for_user(user_id, now)
            .await?;

        Ok(candidates
            .into_iter()
            .find(|credential| verify_refresh_secret(presented, &credential.token_hash)))
    }
}
