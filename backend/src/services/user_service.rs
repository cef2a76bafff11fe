//! User business logic service.
//!
//! Handles identity registration, password authentication and soft
//! deactivation.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::Config;
use crate::database::models::{CreateNewUser, CreateUser, Role, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::refresh_token_repository::RefreshTokenRepository;
use crate::repositories::user_repository::UserRepository;
use crate::utils::hashing::{hash_password, verify_password};
use crate::utils::validation::validate_input;

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
    bcrypt_cost: u32,
}

impl<'a> UserService<'a> {
    /// Creates a new UserService instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    /// * `config` - Application configuration (password hashing cost)
    pub fn new(pool: &'a SqlitePool, config: &Config) -> Self {
        Self {
            pool,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Registers a new identity with full validation.
    ///
    /// # Arguments
    /// * `create_user` - User creation data transfer object
    ///
    /// # Returns
    /// The newly created, active User
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Validation failures
    /// - An email that is already registered
    pub async fn register(&self, create_user: CreateNewUser) -> ServiceResult<User> {
        validate_input(&create_user)?;

        let email = create_user.email.trim().to_lowercase();
        let repo = UserRepository::new(self.pool);

        if repo.email_exists(&email).await? {
            return Err(ServiceError::already_exists("User", email));
        }

        let password_hash = hash_password(&create_user.password, self.bcrypt_cost)?;

        let data = CreateUser {
            id: uuid::Uuid::now_v7().to_string(),
            full_name: create_user.full_name.trim().to_string(),
            email,
            password_hash,
            role: create_user.role,
        };

        let user = repo.create_user(data).await?;
        info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Verifies an email/password pair.
    ///
    /// Unknown emails, wrong passwords and deactivated identities all yield
    /// the same `Unauthorized` error.
    pub async fn authenticate_user(&self, email: &str, password: &str) -> ServiceResult<User> {
        let email = email.trim().to_lowercase();
        let user = UserRepository::new(self.pool)
            .get_user_by_email(&email)
            .await?;

        match user {
            Some(user) if user.is_active && verify_password(password, &user.password_hash) => {
                Ok(user)
            }
            _ => {
                warn!("Rejected login attempt");
                Err(ServiceError::unauthorized("Invalid credentials"))
            }
        }
    }

    /// Retrieves a user by ID with existence verification.
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if user doesn't exist
    pub async fn get_user_required(&self, id: &str) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))?;
        Ok(user)
    }

    pub async fn list_users(&self, role: Option<Role>) -> ServiceResult<Vec<User>> {
        Ok(UserRepository::new(self.pool).list_users(role).await?)
    }

    /// Soft-deactivates an identity and revokes all of its live sessions.
    /// Deactivating an inactive identity is a no-op.
    pub async fn deactivate_user(&self, id: &str) -> ServiceResult<User> {
        let user = self.get_user_required(id).await?;
        if !user.is_active {
            return Ok(user);
        }

        UserRepository::new(self.pool).set_active(id, false).await?;
        let revoked = RefreshTokenRepository::new(self.pool)
            .revoke_all_for_user(id, Utc::now())
            .await?;
        info!(user_id = %id, revoked_sessions = revoked, "User deactivated");

        self.get_user_required(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, TEST_PASSWORD};

    fn new_user(full_name: &str, email: &str, role: Role) -> CreateNewUser {
        CreateNewUser {
            full_name: full_name.to_string(),
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_and_hashes() {
        let pool = test_support::test_pool().await;
        let service = UserService::new(&pool, &test_support::test_config());

        let user = service
            .register(new_user("  Grace Hopper ", "Grace@Example.COM", Role::Employee))
            .await
            .unwrap();

        assert_eq!(user.full_name, "Grace Hopper");
        assert_eq!(user.email, "grace@example.com");
        assert_eq!(user.role, Role::Employee);
        assert!(user.is_active);
        assert_ne!(user.password_hash, TEST_PASSWORD);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let pool = test_support::test_pool().await;
        let service = UserService::new(&pool, &test_support::test_config());

        service
            .register(new_user("Grace Hopper", "grace@example.com", Role::Employee))
            .await
            .unwrap();
        let error = service
            .register(new_user("Grace Two", "GRACE@example.com", Role::Client))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), "already_exists");
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let pool = test_support::test_pool().await;
        let service = UserService::new(&pool, &test_support::test_config());

        let error = service
            .register(new_user("G", "grace@example.com", Role::Client))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), "validation_error");
    }

    #[tokio::test]
    async fn test_authenticate_user() {
        let pool = test_support::test_pool().await;
        let service = UserService::new(&pool, &test_support::test_config());
        let user = test_support::create_user(&pool, "Ada Admin", Role::Admin).await;

        let found = service
            .authenticate_user("ADA.ADMIN@example.com", TEST_PASSWORD)
            .await
            .unwrap();
        assert_eq!(found.id, user.id);

        assert!(service
            .authenticate_user(&user.email, "not-the-password")
            .await
            .unwrap_err()
            .is_unauthorized());
    }

    #[tokio::test]
    async fn test_deactivate_user_blocks_login_and_is_idempotent() {
        let pool = test_support::test_pool().await;
        let service = UserService::new(&pool, &test_support::test_config());
        let user = test_support::create_user(&pool, "Eve Employee", Role::Employee).await;

        let deactivated = service.deactivate_user(&user.id).await.unwrap();
        assert!(!deactivated.is_active);
        assert!(service.deactivate_user(&user.id).await.is_ok());

        assert!(service
            .authenticate_user(&user.email, TEST_PASSWORD)
            .await
            .unwrap_err()
            .is_unauthorized());

        assert_eq!(
            service.get_user_required("missing").await.unwrap_err().kind(),
            "not_found"
        );
    }

    #[tokio::test]
    async fn test_list_users_by_role() {
        let pool = test_support::test_pool().await;
        let service = UserService::new(&pool, &test_support::test_config());
        test_support::create_user(&pool, "Ada Admin", Role::Admin).await;
        test_support::create_user(&pool, "Eve Employee", Role::Employee).await;
        test_support::create_user(&pool, "Cal Client", Role::Client).await;

        assert_eq!(service.list_users(None).await.unwrap().len(), 3);
        let employees = service.list_users(Some(Role::Employee)).await.unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].full_name, "Eve Employee");
    }
}
