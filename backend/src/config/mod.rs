//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, pool sizing, token signing secrets and token lifetimes.
//! The resulting [`Config`] is passed explicitly into every service.

use anyhow::{Context, Result, bail};
use std::env;
use std::time::Duration;

/// Minimum accepted length for a token signing secret.
const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub jwt_access_secret: String,
    pub jwt_refresh_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let jwt_access_secret =
            env::var("JWT_ACCESS_SECRET").context("JWT_ACCESS_SECRET not set")?;

        let jwt_refresh_secret =
            env::var("JWT_REFRESH_SECRET").context("JWT_REFRESH_SECRET not set")?;

        let access_token_ttl = humantime::parse_duration(
            &env::var("ACCESS_TOKEN_TTL").unwrap_or_else(|_| "15m".to_string()),
        )
        .context("ACCESS_TOKEN_TTL must be a duration such as 15m")?;

        let refresh_token_ttl = humantime::parse_duration(
            &env::var("REFRESH_TOKEN_TTL").unwrap_or_else(|_| "7d".to_string()),
        )
        .context("REFRESH_TOKEN_TTL must be a duration such as 7d")?;

        let bcrypt_cost = env::var("BCRYPT_COST")
            .unwrap_or_else(|_| bcrypt::DEFAULT_COST.to_string())
            .parse::<u32>()
            .context("BCRYPT_COST must be a valid number")?;

        let config = Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            jwt_access_secret,
            jwt_refresh_secret,
            access_token_ttl,
            refresh_token_ttl,
            bcrypt_cost,
        };
        config.validate()?;

        Ok(config)
    }

    /// Checks invariants that the environment parser cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.jwt_access_secret.len() < MIN_SECRET_LENGTH {
            bail!("JWT_ACCESS_SECRET must be at least {MIN_SECRET_LENGTH} characters");
        }
        if self.jwt_refresh_secret.len() < MIN_SECRET_LENGTH {
            bail!("JWT_REFRESH_SECRET must be at least {MIN_SECRET_LENGTH} characters");
        }
        if self.jwt_access_secret == self.jwt_refresh_secret {
            bail!("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ");
        }
        if self.access_token_ttl.is_zero() || self.refresh_token_ttl.is_zero() {
            bail!("token lifetimes must be greater than zero");
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31");
        }
        Ok(())
    }

    /// Access token lifetime in whole seconds, as reported to clients.
    pub fn access_token_ttl_seconds(&self) -> u64 {
        self.access_token_ttl.as_secs()
    }
}
