//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Request DTOs carry `validator` rules and are checked by
//! the services before anything is written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// The three mutually exclusive identity roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Employee,
    Client,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Employee => write!(f, "EMPLOYEE"),
            Role::Client => write!(f, "CLIENT"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "EMPLOYEE" => Ok(Role::Employee),
            "CLIENT" => Ok(Role::Client),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateNewUser {
    #[validate(length(
        min = 2,
        max = 255,
        message = "Full name must be between 2-255 characters"
    ))]
    pub full_name: String,

    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Stored form of an issued refresh token. Only the hash is persisted.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshCredential {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RefreshCredential {
    /// A credential can authorize a refresh only while unrevoked and unexpired.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && self.expires_at > now
    }
}

#[derive(Debug, Clone)]
pub struct CreateRefreshCredential {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientCompany {
    pub id: String,
    pub company_name: String,
    pub contact_user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateClientCompany {
    #[validate(length(
        min = 2,
        max = 255,
        message = "Company name must be between 2-255 characters"
    ))]
    pub company_name: String,

    #[validate(custom(function = "validate_uuid"))]
    pub contact_user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub client_company_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProject {
    #[validate(length(
        min = 2,
        max = 255,
        message = "Project name must be between 2-255 characters"
    ))]
    pub name: String,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_uuid"))]
    pub client_company_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectAssignment {
    pub id: String,
    pub project_id: String,
    pub employee_user_id: String,
    pub assigned_by_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub project_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(custom(function = "validate_uuid"))]
    pub receiver_id: String,

    #[validate(custom(function = "validate_message_content"))]
    pub content: String,

    #[validate(custom(function = "validate_uuid"))]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub project_id: Option<String>,
    pub content: String,
}

/// Minimal identity projection used for recipient pickers and message views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: String,
    pub full_name: String,
    pub role: Role,
}

// View models with joined data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageWithParticipants {
    pub message: Message,
    pub sender: UserSummary,
    pub receiver: UserSummary,
}

/// Longest accepted message body, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 1500;

fn validate_uuid(value: &str) -> Result<(), validator::ValidationError> {
    if uuid::Uuid::parse_str(value).is_err() {
        return Err(validator::ValidationError::new("invalid_uuid")
            .with_message("Must be a valid identifier".into()));
    }
    Ok(())
}

fn validate_message_content(content: &str) -> Result<(), validator::ValidationError> {
    let length = content.trim().chars().count();
    if length == 0 {
        return Err(validator::ValidationError::new("empty_content")
            .with_message("Message content is required".into()));
    }
    if length > MAX_MESSAGE_LENGTH {
        return Err(validator::ValidationError::new("content_too_long")
            .with_message(format!("Message must be at most {MAX_MESSAGE_LENGTH} characters").into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send_request(receiver_id: &str, content: &str) -> SendMessageRequest {
        SendMessageRequest {
            receiver_id: receiver_id.to_string(),
            content: content.to_string(),
            project_id: None,
        }
    }

    #[test]
    fn test_role_round_trips_through_text() {
        for role in [Role::Admin, Role::Employee, Role::Client] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("Admin".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Employee).unwrap(), "\"EMPLOYEE\"");
    }

    #[test]
    fn test_send_message_validation() {
        let receiver = uuid::Uuid::now_v7().to_string();
        assert!(send_request(&receiver, "hello").validate().is_ok());
        assert!(send_request(&receiver, "   ").validate().is_err());
        assert!(send_request("not-a-uuid", "hello").validate().is_err());

        let long = "x".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(send_request(&receiver, &long).validate().is_err());
        let exact = "x".repeat(MAX_MESSAGE_LENGTH);
        assert!(send_request(&receiver, &exact).validate().is_ok());

        let mut with_project = send_request(&receiver, "hello");
        with_project.project_id = Some("bogus".to_string());
        assert!(with_project.validate().is_err());
    }

    #[test]
    fn test_refresh_credential_usability() {
        let now = Utc::now();
        let mut credential = RefreshCredential {
            id: "c".to_string(),
            user_id: "u".to_string(),
            token_hash: "h".to_string(),
            expires_at: now + chrono::Duration::minutes(5),
            is_revoked: false,
            revoked_at: None,
            created_at: now,
        };
        assert!(credential.is_usable_at(now));
        assert!(!credential.is_usable_at(now + chrono::Duration::minutes(6)));
        credential.is_revoked = true;
        assert!(!credential.is_usable_at(now));
    }
}
