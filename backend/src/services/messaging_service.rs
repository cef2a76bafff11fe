//! Messaging authorization and message storage.
//!
//! Who may message whom is decided from roles and project assignments, read
//! fresh from the database on every call. Nothing here caches identities,
//! roles or assignments.

use std::collections::HashMap;

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::auth::models::AuthenticatedUser;
use crate::database::models::{
    CreateMessage, Message, MessageWithParticipants, Role, SendMessageRequest, UserSummary,
};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::company_repository::CompanyRepository;
use crate::repositories::message_repository::MessageRepository;
use crate::repositories::project_repository::ProjectRepository;
use crate::repositories::user_repository::UserRepository;
use crate::utils::validation::validate_input;

/// Number of messages returned by [`MessagingService::conversations`].
pub const RECENT_MESSAGES_LIMIT: i64 = 100;

/// Outcome of the role-only part of the messaging rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRule {
    Allowed,
    /// Allowed only when the employee is assigned to a project of the
    /// company whose contact is the client.
    RequiresAssignment,
    Denied,
}

/// Role-level eligibility for an unordered pair.
///
/// Administrator pairs fall through to `Denied`: no rule covers them.
pub fn pair_rule(first: Role, second: Role) -> PairRule {
    match (first, second) {
        (Role::Admin, Role::Employee | Role::Client) => PairRule::Allowed,
        (Role::Employee | Role::Client, Role::Admin) => PairRule::Allowed,
        (Role::Client, Role::Employee) | (Role::Employee, Role::Client) => {
            PairRule::RequiresAssignment
        }
        (Role::Admin, Role::Admin)
        | (Role::Employee, Role::Employee)
        | (Role::Client, Role::Client) => PairRule::Denied,
    }
}

pub struct MessagingService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> MessagingService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Whether `sender_id` may message `receiver_id`. Fails closed when
    /// either identity is missing. The answer is symmetric.
    pub async fn can_message(&self, sender_id: &str, receiver_id: &str) -> ServiceResult<bool> {
        if sender_id == receiver_id {
            return Ok(false);
        }

        let users = UserRepository::new(self.pool);
        let (Some(sender), Some(receiver)) = (
            users.get_user_by_id(sender_id).await?,
            users.get_user_by_id(receiver_id).await?,
        ) else {
            return Ok(false);
        };

        match pair_rule(sender.role, receiver.role) {
            PairRule::Allowed => Ok(true),
            PairRule::Denied => Ok(false),
            PairRule::RequiresAssignment => {
                let (client_id, employee_id) = if sender.role == Role::Client {
                    (&sender.id, &receiver.id)
                } else {
                    (&receiver.id, &sender.id)
                };
                self.is_linked(client_id, employee_id).await
            }
        }
    }

    /// Identities the caller may pick as recipients, filtered by role.
    ///
    /// Deduplicated by id and sorted by full name (byte order).
    pub async fn recipients_for(
        &self,
        user: &AuthenticatedUser,
        role_filter: Option<Role>,
    ) -> ServiceResult<Vec<UserSummary>> {
        let Some(wanted) = role_filter else {
            return Ok(Vec::new());
        };

        let users = UserRepository::new(self.pool);
        let projects = ProjectRepository::new(self.pool);

        let candidates = match (user.role, wanted) {
            (Role::Admin, Role::Employee) => users.get_active_users_by_role(Role::Employee).await?,
            (Role::Admin, Role::Client) => CompanyRepository::new(self.pool).get_contacts().await?,
            (Role::Client, Role::Admin) | (Role::Employee, Role::Admin) => {
                users.get_active_users_by_role(Role::Admin).await?
            }
            (Role::Client, Role::Employee) => {
                match CompanyRepository::new(self.pool)
                    .get_company_by_contact(&user.id)
                    .await?
                {
                    Some(company) => projects.get_employees_for_company(&company.id).await?,
                    None => Vec::new(),
                }
            }
            (Role::Employee, Role::Client) => {
                projects.get_client_contacts_for_employee(&user.id).await?
            }
            (Role::Admin, Role::Admin)
            | (Role::Employee, Role::Employee)
            | (Role::Client, Role::Client) => Vec::new(),
        };

        debug!(user_id = %user.id, role = %wanted, count = candidates.len(), "Resolved recipients");
        Ok(dedup_and_sort(candidates))
    }

    /// Validates and stores a message after re-checking eligibility.
    pub async fn send_message(
        &self,
        sender: &AuthenticatedUser,
        request: SendMessageRequest,
    ) -> ServiceResult<Message> {
        validate_input(&request)?;

        if !self.can_message(&sender.id, &request.receiver_id).await? {
            warn!(sender_id = %sender.id, receiver_id = %request.receiver_id, "Messaging refused for user pair");
            return Err(ServiceError::forbidden(
                "Messaging not allowed for this user pair",
            ));
        }

        if let Some(project_id) = request.project_id.as_deref() {
            if ProjectRepository::new(self.pool)
                .get_project_by_id(project_id)
                .await?
                .is_none()
            {
                return Err(ServiceError::not_found("Project", project_id));
            }
        }

        let message = MessageRepository::new(self.pool)
            .create_message(CreateMessage {
                id: uuid::Uuid::now_v7().to_string(),
                sender_id: sender.id.clone(),
                receiver_id: request.receiver_id,
                project_id: request.project_id,
                content: request.content,
            })
            .await?;

        info!(message_id = %message.id, sender_id = %message.sender_id, receiver_id = %message.receiver_id, "Message sent");
        Ok(message)
    }

    /// Messages between the caller and another user, oldest first.
    pub async fn conversation_with(
        &self,
        user: &AuthenticatedUser,
        other_user_id: &str,
    ) -> ServiceResult<Vec<Message>> {
        if !self.can_message(&user.id, other_user_id).await? {
            return Err(ServiceError::forbidden(
                "Messaging not allowed for this user pair",
            ));
        }

        Ok(MessageRepository::new(self.pool)
            .get_conversation(&user.id, other_user_id)
            .await?)
    }

    /// The caller's most recent messages in either direction, newest first.
    pub async fn conversations(
        &self,
        user: &AuthenticatedUser,
    ) -> ServiceResult<Vec<MessageWithParticipants>> {
        Ok(MessageRepository::new(self.pool)
            .get_recent_for_user(&user.id, RECENT_MESSAGES_LIMIT)
            .await?)
    }

    async fn is_linked(&self, client_id: &str, employee_id: &str) -> ServiceResult<bool> {
        let Some(company) = CompanyRepository::new(self.pool)
            .get_company_by_contact(client_id)
            .await?
        else {
            return Ok(false);
        };

        Ok(ProjectRepository::new(self.pool)
            .is_employee_assigned_to_company(employee_id, &company.id)
            .await?)
    }
}

fn dedup_and_sort(candidates: Vec<UserSummary>) -> Vec<UserSummary> {
    let mut unique: Vec<UserSummary> = candidates
        .into_iter()
        .map(|summary| (summary.id.clone(), summary))
        .collect::<HashMap<_, _>>()
        .into_values()
        .collect();
    unique.sort_by(|a, b| a.full_name.cmp(&b.full_name).then_with(|| a.id.cmp(&b.id)));
    unique
}
