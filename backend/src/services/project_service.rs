//! Client company and project administration.
//!
//! These operations maintain the company, project and assignment records that
//! the messaging rules read. Every operation requires an Administrator.

use sqlx::SqlitePool;
use tracing::info;

use crate::auth::models::AuthenticatedUser;
use crate::auth::service::AuthService;
use crate::database::models::{
    ClientCompany, CreateClientCompany, CreateProject, Project, ProjectAssignment, Role,
};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::company_repository::CompanyRepository;
use crate::repositories::project_repository::ProjectRepository;
use crate::repositories::user_repository::UserRepository;
use crate::utils::validation::validate_input;

pub struct ProjectService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> ProjectService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Registers a company whose contact must be an existing Client identity
    /// that is not already the contact of another company.
    pub async fn create_client_company(
        &self,
        actor: &AuthenticatedUser,
        request: CreateClientCompany,
    ) -> ServiceResult<ClientCompany> {
        AuthService::require_role(actor, &[Role::Admin])?;
        validate_input(&request)?;

        let contact = UserRepository::new(self.pool)
            .get_user_by_id(&request.contact_user_id)
            .await?;
        if !matches!(contact, Some(ref user) if user.role == Role::Client) {
            return Err(ServiceError::validation(
                "Contact user must be a client user",
            ));
        }

        let companies = CompanyRepository::new(self.pool);
        if companies
            .get_company_by_contact(&request.contact_user_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists(
                "Client company contact",
                &request.contact_user_id,
            ));
        }

        let company = companies
            .create_company(
                &uuid::Uuid::now_v7().to_string(),
                request.company_name.trim(),
                &request.contact_user_id,
            )
            .await?;

        info!(company_id = %company.id, contact_user_id = %company.contact_user_id, "Client company created");
        Ok(company)
    }

    pub async fn list_client_companies(
        &self,
        actor: &AuthenticatedUser,
    ) -> ServiceResult<Vec<ClientCompany>> {
        AuthService::require_role(actor, &[Role::Admin])?;
        Ok(CompanyRepository::new(self.pool).list_companies().await?)
    }

    pub async fn create_project(
        &self,
        actor: &AuthenticatedUser,
        request: CreateProject,
    ) -> ServiceResult<Project> {
        AuthService::require_role(actor, &[Role::Admin])?;
        validate_input(&request)?;

        if CompanyRepository::new(self.pool)
            .get_company_by_id(&request.client_company_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found(
                "Client company",
                &request.client_company_id,
            ));
        }

        let project = ProjectRepository::new(self.pool)
            .create_project(
                &uuid::Uuid::now_v7().to_string(),
                request.name.trim(),
                request.description.as_deref(),
                &request.client_company_id,
            )
            .await?;

        info!(project_id = %project.id, company_id = %project.client_company_id, "Project created");
        Ok(project)
    }

    /// Assigns an active Employee to a project.
    ///
    /// # Errors
    /// - `NotFound` if the project does not exist
    /// - `Validation` if the identity is not an active Employee
    /// - `AlreadyExists` if the employee is already assigned
    pub async fn assign_employee(
        &self,
        actor: &AuthenticatedUser,
        project_id: &str,
        employee_user_id: &str,
    ) -> ServiceResult<ProjectAssignment> {
        AuthService::require_role(actor, &[Role::Admin])?;

        let projects = ProjectRepository::new(self.pool);
        if projects.get_project_by_id(project_id).await?.is_none() {
            return Err(ServiceError::not_found("Project", project_id));
        }

        let employee = UserRepository::new(self.pool)
            .get_user_by_id(employee_user_id)
            .await?;
        if !matches!(employee, Some(ref user) if user.role == Role::Employee && user.is_active) {
            return Err(ServiceError::validation(
                "Assignee must be an active employee",
            ));
        }

        if projects
            .get_assignment(project_id, employee_user_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists(
                "Assignment",
                format!("{}/{}", project_id, employee_user_id),
            ));
        }

        let assignment = projects
            .create_assignment(
                &uuid::Uuid::now_v7().to_string(),
                project_id,
                employee_user_id,
                &actor.id,
            )
            .await?;

        info!(project_id, employee_user_id, "Employee assigned to project");
        Ok(assignment)
    }

    pub async fn unassign_employee(
        &self,
        actor: &AuthenticatedUser,
        project_id: &str,
        employee_user_id: &str,
    ) -> ServiceResult<()> {
        AuthService::require_role(actor, &[Role::Admin])?;

        let removed = ProjectRepository::new(self.pool)
            .delete_assignment(project_id, employee_user_id)
            .await?;
        if !removed {
            return Err(ServiceError::not_found(
                "Assignment",
                format!("{}/{}", project_id, employee_user_id),
            ));
        }

        info!(project_id, employee_user_id, "Employee unassigned from project");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn test_admin_builds_company_project_and_assignment() {
        let pool = test_support::test_pool().await;
        let admin = test_support::create_user(&pool, "Ada Admin", Role::Admin).await;
        let client = test_support::create_user(&pool, "Cal Client", Role::Client).await;
        let employee = test_support::create_user(&pool, "Eve Employee", Role::Employee).await;
        let actor = test_support::authenticated(&admin);
        let service = ProjectService::new(&pool);

        let company = service
            .create_client_company(
                &actor,
                CreateClientCompany {
                    company_name: "Acme".to_string(),
                    contact_user_id: client.id.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(company.contact_user_id, client.id);

        let project = service
            .create_project(
                &actor,
                CreateProject {
                    name: "Website".to_string(),
                    description: Some("Marketing site".to_string()),
                    client_company_id: company.id.clone(),
                },
            )
            .await
            .unwrap();

        let assignment = service
            .assign_employee(&actor, &project.id, &employee.id)
            .await
            .unwrap();
        assert_eq!(assignment.assigned_by_id, admin.id);

        let duplicate = service
            .assign_employee(&actor, &project.id, &employee.id)
            .await
            .unwrap_err();
        assert_eq!(duplicate.kind(), "already_exists");

        service
            .unassign_employee(&actor, &project.id, &employee.id)
            .await
            .unwrap();
        let missing = service
            .unassign_employee(&actor, &project.id, &employee.id)
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), "not_found");

        assert_eq!(service.list_client_companies(&actor).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let pool = test_support::test_pool().await;
        let employee = test_support::create_user(&pool, "Eve Employee", Role::Employee).await;
        let client = test_support::create_user(&pool, "Cal Client", Role::Client).await;
        let service = ProjectService::new(&pool);

        let error = service
            .create_client_company(
                &test_support::authenticated(&employee),
                CreateClientCompany {
                    company_name: "Acme".to_string(),
                    contact_user_id: client.id.clone(),
                },
            )
            .await
            .unwrap_err();
        assert!(error.is_forbidden());

        let error = service
            .list_client_companies(&test_support::authenticated(&client))
            .await
            .unwrap_err();
        assert!(error.is_forbidden());
    }

    #[tokio::test]
    async fn test_company_contact_must_be_client() {
        let pool = test_support::test_pool().await;
        let admin = test_support::create_user(&pool, "Ada Admin", Role::Admin).await;
        let employee = test_support::create_user(&pool, "Eve Employee", Role::Employee).await;
        let service = ProjectService::new(&pool);

        let error = service
            .create_client_company(
                &test_support::authenticated(&admin),
                CreateClientCompany {
                    company_name: "Acme".to_string(),
                    contact_user_id: employee.id.clone(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(error.kind(), "validation_error");
    }

    #[tokio::test]
    async fn test_client_contact_owns_at_most_one_company() {
        let pool = test_support::test_pool().await;
        let admin = test_support::create_user(&pool, "Ada Admin", Role::Admin).await;
        let client = test_support::create_user(&pool, "Cal Client", Role::Client).await;
        let actor = test_support::authenticated(&admin);
        let service = ProjectService::new(&pool);

        let request = |name: &str| CreateClientCompany {
            company_name: name.to_string(),
            contact_user_id: client.id.clone(),
        };

        service
            .create_client_company(&actor, request("Acme"))
            .await
            .unwrap();
        let error = service
            .create_client_company(&actor, request("Beta"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), "already_exists");
        assert_eq!(service.list_client_companies(&actor).await.unwrap().len(), 1);

        // The schema refuses a second company for the contact as well.
        assert!(CompanyRepository::new(&pool)
            .create_company(&uuid::Uuid::now_v7().to_string(), "Beta", &client.id)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_project_requires_existing_company() {
        let pool = test_support::test_pool().await;
        let admin = test_support::create_user(&pool, "Ada Admin", Role::Admin).await;
        let service = ProjectService::new(&pool);

        let error = service
            .create_project(
                &test_support::authenticated(&admin),
                CreateProject {
                    name: "Website".to_string(),
                    description: None,
                    client_company_id: uuid::Uuid::now_v7().to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(error.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_only_active_employees_can_be_assigned() {
        let pool = test_support::test_pool().await;
        let admin = test_support::create_user(&pool, "Ada Admin", Role::Admin).await;
        let client = test_support::create_user(&pool, "Cal Client", Role::Client).await;
        let employee = test_support::create_user(&pool, "Eve Employee", Role::Employee).await;
        let company = test_support::create_company(&pool, "Acme", &client).await;
        let project = test_support::create_project(&pool, "Website", &company).await;
        let actor = test_support::authenticated(&admin);
        let service = ProjectService::new(&pool);

        let error = service
            .assign_employee(&actor, &project.id, &client.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), "validation_error");

        UserRepository::new(&pool)
            .set_active(&employee.id, false)
            .await
            .unwrap();
        let error = service
            .assign_employee(&actor, &project.id, &employee.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), "validation_error");

        let error = service
            .assign_employee(&actor, "missing-project", &employee.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), "not_found");
    }
}
