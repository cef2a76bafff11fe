//! Database repository for projects and employee assignments.
//!
//! The assignment join is the only structural link between employees and
//! client companies, so the relationship queries used by messaging live here.

use crate::database::models::{Project, ProjectAssignment, UserSummary};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

const PROJECT_COLUMNS: &str = "id, name, description, client_company_id, created_at";
const ASSIGNMENT_COLUMNS: &str = "id, project_id, employee_user_id, assigned_by_id, created_at";

/// Repository for project and assignment database operations.
pub struct ProjectRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> ProjectRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_project(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        client_company_id: &str,
    ) -> Result<Project> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (id, name, description, client_company_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(client_company_id)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(project)
    }

    pub async fn get_project_by_id(&self, id: &str) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(project)
    }

    pub async fn create_assignment(
        &self,
        id: &str,
        project_id: &str,
        employee_user_id: &str,
        assigned_by_id: &str,
    ) -> Result<ProjectAssignment> {
        let assignment = sqlx::query_as::<_, ProjectAssignment>(&format!(
            r#"
            INSERT INTO project_assignments (id, project_id, employee_user_id, assigned_by_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(project_id)
        .bind(employee_user_id)
        .bind(assigned_by_id)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(assignment)
    }

    pub async fn get_assignment(
        &self,
        project_id: &str,
        employee_user_id: &str,
    ) -> Result<Option<ProjectAssignment>> {
        let assignment = sqlx::query_as::<_, ProjectAssignment>(&format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS} FROM project_assignments
            WHERE project_id = ? AND employee_user_id = ?
            "#
        ))
        .bind(project_id)
        .bind(employee_user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(assignment)
    }

    /// Removes an assignment. Returns `true` if one existed.
    pub async fn delete_assignment(&self, project_id: &str, employee_user_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM project_assignments WHERE project_id = ? AND employee_user_id = ?",
        )
        .bind(project_id)
        .bind(employee_user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether the employee is assigned to any project owned by the company.
    pub async fn is_employee_assigned_to_company(
        &self,
        employee_user_id: &str,
        client_company_id: &str,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM project_assignments a
            JOIN projects p ON p.id = a.project_id
            WHERE a.employee_user_id = ? AND p.client_company_id = ?
            "#,
        )
        .bind(employee_user_id)
        .bind(client_company_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Distinct employees assigned to any project of the company.
    pub async fn get_employees_for_company(&self, client_company_id: &str) -> Result<Vec<UserSummary>> {
        let employees = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT DISTINCT u.id, u.full_name, u.role
            FROM project_assignments a
            JOIN projects p ON p.id = a.project_id
            JOIN users u ON u.id = a.employee_user_id
            WHERE p.client_company_id = ?
            "#,
        )
        .bind(client_company_id)
        .fetch_all(self.pool)
        .await?;

        Ok(employees)
    }

    /// Distinct contacts of the companies owning any project the employee is assigned to.
    pub async fn get_client_contacts_for_employee(
        &self,
        employee_user_id: &str,
    ) -> Result<Vec<UserSummary>> {
        let contacts = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT DISTINCT u.id, u.full_name, u.role
            FROM project_assignments a
            JOIN projects p ON p.id = a.project_id
            JOIN client_companies c ON c.id = p.client_company_id
            JOIN users u ON u.id = c.contact_user_id
            WHERE a.employee_user_id = ?
            "#,
        )
        .bind(employee_user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(contacts)
    }
}
