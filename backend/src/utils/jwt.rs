//! JWT token utilities for authentication and authorization.
//!
//! Provides token creation, validation, and claims management for access and
//! refresh tokens. The two kinds are signed with different secrets, so a
//! refresh token is never accepted where an access token is expected.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::database::models::Role;
use crate::errors::{ServiceError, ServiceResult};

/// JWT Claims structure binding an identity to its role
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// User role
    pub role: Role,
    /// Unique token identifier
    pub jti: String,
    /// Token expiration timestamp
    pub exp: i64,
    /// Token issued at timestamp
    pub iat: i64,
}

/// A signed token together with its expiry instant.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    fn new(secret: &str, ttl: std::time::Duration) -> ServiceResult<Self> {
        let ttl = Duration::from_std(ttl)
            .map_err(|e| ServiceError::internal_error(format!("Invalid token lifetime: {}", e)))?;

        Ok(TokenKeys {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }
}

/// JWT token utility for creating and validating tokens
pub struct JwtUtils {
    access: TokenKeys,
    refresh: TokenKeys,
    validation: Validation,
}

impl JwtUtils {
    /// Create a new JwtUtils instance with keys from the given configuration
    pub fn new(config: &Config) -> ServiceResult<Self> {
        let access = TokenKeys::new(&config.jwt_access_secret, config.access_token_ttl)?;
        let refresh = TokenKeys::new(&config.jwt_refresh_secret, config.refresh_token_ttl)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(JwtUtils {
            access,
            refresh,
            validation,
        })
    }

    /// Generate a short-lived access token
    pub fn generate_access_token(&self, user_id: &str, role: Role) -> ServiceResult<SignedToken> {
        Self::sign(&self.access, user_id, role, Utc::now())
    }

    /// Generate a long-lived refresh token
    pub fn generate_refresh_token(&self, user_id: &str, role: Role) -> ServiceResult<SignedToken> {
        Self::sign(&self.refresh, user_id, role, Utc::now())
    }

    /// Validate and decode an access token
    pub fn validate_access_token(&self, token: &str) -> ServiceResult<Claims> {
        self.verify(&self.access, token)
    }

    /// Validate and decode a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> ServiceResult<Claims> {
        self.verify(&self.refresh, token)
    }

    #[cfg(test)]
    pub(crate) fn generate_access_token_at(
        &self,
        user_id: &str,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> ServiceResult<SignedToken> {
        Self::sign(&self.access, user_id, role, issued_at)
    }

    #[cfg(test)]
    pub(crate) fn generate_refresh_token_at(
        &self,
        user_id: &str,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> ServiceResult<SignedToken> {
        Self::sign(&self.refresh, user_id, role, issued_at)
    }

    fn sign(
        keys: &TokenKeys,
        user_id: &str,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> ServiceResult<SignedToken> {
        let expires_at = issued_at + keys.ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            jti: uuid::Uuid::new_v4().to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &keys.encoding_key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {}", e)))?;

        Ok(SignedToken { token, expires_at })
    }

    fn verify(&self, keys: &TokenKeys, token: &str) -> ServiceResult<Claims> {
        decode::<Claims>(token, &keys.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| ServiceError::unauthorized(format!("Token validation failed: {}", e)))
    }
}

impl Claims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    pub fn role(&self) -> Role {
        self.role
    }
}
