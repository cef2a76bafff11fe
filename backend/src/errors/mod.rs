//! Global application error types.
//!
//! This module defines the error taxonomy shared by the session token manager,
//! the messaging authorization engine and the administration services, so
//! callers get one consistent set of failure kinds to map onto their transport.

use thiserror::Error;

/// Generic service error that can be used across all entities
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad, expired, reused or missing credential.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Authenticated but not permitted.
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    /// Schema or shape violation on provided fields.
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{entity} already exists: {identifier}")]
    AlreadyExists { entity: String, identifier: String },

    #[error("Database error: {source}")]
    Database {
        #[from]
        source: anyhow::Error,
    },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    // Helper constructors for common patterns

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn already_exists(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Machine-readable error category for callers that translate errors
    /// into status codes.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Unauthorized { .. } => "unauthorized",
            ServiceError::Forbidden { .. } => "forbidden",
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::Validation { .. } => "validation_error",
            ServiceError::AlreadyExists { .. } => "already_exists",
            ServiceError::Database { .. } => "database_error",
            ServiceError::InternalError { .. } => "internal_error",
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServiceError::Unauthorized { .. })
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, ServiceError::Forbidden { .. })
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(error: sqlx::Error) -> Self {
        ServiceError::Database {
            source: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ServiceError::unauthorized("x").kind(), "unauthorized");
        assert_eq!(ServiceError::forbidden("x").kind(), "forbidden");
        assert_eq!(ServiceError::not_found("User", "1").kind(), "not_found");
        assert_eq!(ServiceError::validation("x").kind(), "validation_error");
        assert_eq!(
            ServiceError::already_exists("User", "a@b.c").kind(),
            "already_exists"
        );
    }

    #[test]
    fn test_error_messages() {
        let error = ServiceError::not_found("Project", "abc");
        assert_eq!(error.to_string(), "Project not found: abc");

        let error = ServiceError::forbidden("Messaging not allowed for this user pair");
        assert!(error.is_forbidden());
        assert!(!error.is_unauthorized());
    }
}
