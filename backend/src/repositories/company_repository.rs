//! Database repository for client companies.
//!
//! A company links exactly one Client identity (its contact) to a company record.

use crate::database::models::{ClientCompany, UserSummary};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

const COMPANY_COLUMNS: &str = "id, company_name, contact_user_id, created_at";

/// Repository for client company database operations.
pub struct CompanyRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> CompanyRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a company record.
    pub async fn create_company(
        &self,
        id: &str,
        company_name: &str,
        contact_user_id: &str,
    ) -> Result<ClientCompany> {
        let company = sqlx::query_as::<_, ClientCompany>(&format!(
            r#"
            INSERT INTO client_companies (id, company_name, contact_user_id, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING {COMPANY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(company_name)
        .bind(contact_user_id)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(company)
    }

    pub async fn get_company_by_id(&self, id: &str) -> Result<Option<ClientCompany>> {
        let company = sqlx::query_as::<_, ClientCompany>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM client_companies WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(company)
    }

    /// Retrieves the company whose contact is the given user.
    pub async fn get_company_by_contact(&self, contact_user_id: &str) -> Result<Option<ClientCompany>> {
        let company = sqlx::query_as::<_, ClientCompany>(&format!(
            r#"
            SELECT {COMPANY_COLUMNS} FROM client_companies
            WHERE contact_user_id = ?
            "#
        ))
        .bind(contact_user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(company)
    }

    /// Lists all companies, newest first.
    pub async fn list_companies(&self) -> Result<Vec<ClientCompany>> {
        let companies = sqlx::query_as::<_, ClientCompany>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM client_companies ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(companies)
    }

    /// Distinct contact identities across all companies.
    pub async fn get_contacts(&self) -> Result<Vec<UserSummary>> {
        let contacts = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT DISTINCT u.id, u.full_name, u.role
            FROM client_companies c
            JOIN users u ON u.id = c.contact_user_id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(contacts)
    }
}
