//! Shared fixtures for unit tests: configuration, an isolated in-memory
//! database and seeding helpers.

use std::path::Path;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::auth::models::AuthenticatedUser;
use crate::config::Config;
use crate::database::Database;
use crate::database::models::{ClientCompany, CreateNewUser, Project, Role, User};
use crate::repositories::company_repository::CompanyRepository;
use crate::repositories::project_repository::ProjectRepository;
use crate::services::user_service::UserService;

pub const TEST_PASSWORD: &str = "password123";

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        max_connections: 1,
        acquire_timeout_seconds: 3,
        jwt_access_secret: "test-access-secret-0123456789abcdef".to_string(),
        jwt_refresh_secret: "test-refresh-secret-0123456789abcdef".to_string(),
        access_token_ttl: Duration::from_secs(15 * 60),
        refresh_token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
        bcrypt_cost: 4,
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A migrated, private in-memory database. A single connection keeps every
/// query on the same in-memory instance.
pub async fn test_pool() -> SqlitePool {
    init_tracing();

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    let database = Database { pool };
    database.migrate().await.unwrap();
    database.pool
}

/// A migrated on-disk database reachable through two connections, for tests
/// that need real write-lock contention.
pub async fn file_pool(path: &Path) -> SqlitePool {
    init_tracing();

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10));
    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .unwrap();

    let database = Database { pool };
    database.migrate().await.unwrap();
    database.pool
}

pub async fn create_user(pool: &SqlitePool, full_name: &str, role: Role) -> User {
    let email = format!("{}@example.com", full_name.to_lowercase().replace(' ', "."));
    UserService::new(pool, &test_config())
        .register(CreateNewUser {
            full_name: full_name.to_string(),
            email,
            password: TEST_PASSWORD.to_string(),
            role,
        })
        .await
        .unwrap()
}

pub async fn create_company(pool: &SqlitePool, name: &str, contact: &User) -> ClientCompany {
    CompanyRepository::new(pool)
        .create_company(&uuid::Uuid::now_v7().to_string(), name, &contact.id)
        .await
        .unwrap()
}

pub async fn create_project(pool: &SqlitePool, name: &str, company: &ClientCompany) -> Project {
    ProjectRepository::new(pool)
        .create_project(&uuid::Uuid::now_v7().to_string(), name, None, &company.id)
        .await
        .unwrap()
}

pub async fn assign(pool: &SqlitePool, project: &Project, employee: &User, admin: &User) {
    ProjectRepository::new(pool)
        .create_assignment(
            &uuid::Uuid::now_v7().to_string(),
            &project.id,
            &employee.id,
            &admin.id,
        )
        .await
        .unwrap();
}

pub fn authenticated(user: &User) -> AuthenticatedUser {
    AuthenticatedUser {
        id: user.id.clone(),
        role: user.role,
    }
}
