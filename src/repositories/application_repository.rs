use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::job_repository::escape_like;
use super::ApplicationRepository;
use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationFilter, ApplicationPage, ApplicationStatus, NewApplication, Pagination,
};

const APPLICATION_COLUMNS: &str = "id, job_id, applicant_id, first_name, last_name, email, phone, cover_letter, resume_url, resume_artifact_id, status, submitted_at, reviewed_at, notes";

#[derive(Clone)]
pub struct PgApplicationRepository {
    pool: PgPool,
}

impl PgApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Builds the WHERE clause and its text bind values for a filter.
fn filter_clause(filter: &ApplicationFilter) -> (String, Vec<String>) {
    let mut filters = Vec::new();
    let mut args: Vec<String> = Vec::new();

    if let Some(status) = filter.status {
        filters.push(format!("status = ${}", args.len() + 1));
        args.push(status.as_str().to_string());
    }
    if let Some(job_id) = filter.job_id {
        filters.push(format!("job_id = ${}::uuid", args.len() + 1));
        args.push(job_id.to_string());
    }
    if let Some(search) = filter.search.as_deref() {
        let n = args.len() + 1;
        filters.push(format!(
            "(first_name ILIKE ${n} OR last_name ILIKE ${n} OR email ILIKE ${n})"
        ));
        args.push(format!("%{}%", escape_like(search)));
    }

    let where_clause = if filters.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", filters.join(" AND "))
    };
    (where_clause, args)
}

#[async_trait]
impl ApplicationRepository for PgApplicationRepository {
    async fn create(&self, application: NewApplication) -> Result<Application> {
        if application.resume_url.trim().is_empty() {
            return Err(Error::validation("resume", "resume is required"));
        }

        let job_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM jobs WHERE id = $1)")
                .bind(application.job_id)
                .fetch_one(&self.pool)
                .await?;
        if !job_exists {
            return Err(Error::NotFound("job not found".into()));
        }

        // The unique constraint decides races; an empty RETURNING set means
        // another row for this (job, applicant) already won.
        let statement = format!(
            r#"
            INSERT INTO applications (
                id, job_id, applicant_id, first_name, last_name, email, phone,
                cover_letter, resume_url, resume_artifact_id, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending')
            ON CONFLICT ON CONSTRAINT applications_job_applicant_key DO NOTHING
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        let inserted = sqlx::query_as::<_, Application>(&statement)
            .bind(Uuid::new_v4())
            .bind(application.job_id)
            .bind(&application.applicant_id)
            .bind(&application.first_name)
            .bind(&application.last_name)
            .bind(&application.email)
            .bind(&application.phone)
            .bind(&application.cover_letter)
            .bind(&application.resume_url)
            .bind(&application.resume_artifact_id)
            .fetch_optional(&self.pool)
            .await?;

        inserted.ok_or(Error::DuplicateApplication)
    }

    async fn get(&self, id: Uuid) -> Result<Application> {
        let statement = format!("SELECT {} FROM applications WHERE id = $1", APPLICATION_COLUMNS);
        sqlx::query_as::<_, Application>(&statement)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("application not found".into()))
    }

    async fn transition_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<Application> {
        let statement = format!(
            r#"
            UPDATE applications
            SET status = $2, reviewed_at = NOW(), notes = COALESCE($3, notes)
            WHERE id = $1
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        sqlx::query_as::<_, Application>(&statement)
            .bind(id)
            .bind(status.as_str())
            .bind(notes)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("application not found".into()))
    }

    async fn find_by_job_and_applicant(
        &self,
        job_id: Uuid,
        applicant_id: &str,
    ) -> Result<Option<Application>> {
        let statement = format!(
            "SELECT {} FROM applications WHERE job_id = $1 AND applicant_id = $2",
            APPLICATION_COLUMNS
        );
        let found = sqlx::query_as::<_, Application>(&statement)
            .bind(job_id)
            .bind(applicant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found)
    }

    async fn query(
        &self,
        filter: &ApplicationFilter,
        pagination: Pagination,
    ) -> Result<ApplicationPage> {
        let (where_clause, args) = filter_clause(filter);

        let items_query = format!(
            "SELECT {} FROM applications {} ORDER BY submitted_at DESC, id DESC LIMIT ${} OFFSET ${}",
            APPLICATION_COLUMNS,
            where_clause,
            args.len() + 1,
            args.len() + 2
        );
        let total_query = format!("SELECT COUNT(*) FROM applications {}", where_clause);

        let mut items_statement = sqlx::query_as::<_, Application>(&items_query);
        for value in &args {
            items_statement = items_statement.bind(value);
        }
        let items = items_statement
            .bind(pagination.page_size)
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        let mut total_statement = sqlx::query_scalar::<_, i64>(&total_query);
        for value in &args {
            total_statement = total_statement.bind(value);
        }
        let total = total_statement.fetch_one(&self.pool).await?;

        Ok(ApplicationPage {
            items,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
            total_pages: pagination.total_pages(total),
        })
    }

    async fn status_counts(&self) -> Result<BTreeMap<ApplicationStatus, i64>> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM applications GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let raw: String = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            match raw.parse::<ApplicationStatus>() {
                Ok(status) => {
                    counts.insert(status, count);
                }
                Err(e) => tracing::warn!("Skipping unexpected status in counts: {}", e),
            }
        }
        Ok(counts)
    }

    async fn referenced_job_ids(&self) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT DISTINCT job_id FROM applications")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn list_for_applicant(&self, applicant_id: &str) -> Result<Vec<Application>> {
        let statement = format!(
            "SELECT {} FROM applications WHERE applicant_id = $1 ORDER BY submitted_at DESC, id DESC",
            APPLICATION_COLUMNS
        );
        let items = sqlx::query_as::<_, Application>(&statement)
            .bind(applicant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_has_no_where_clause() {
        let (clause, args) = filter_clause(&ApplicationFilter::default());
        assert!(clause.is_empty());
        assert!(args.is_empty());
    }

    #[test]
    fn filters_are_and_combined_with_sequential_placeholders() {
        let job_id = Uuid::new_v4();
        let (clause, args) = filter_clause(&ApplicationFilter {
            status: Some(ApplicationStatus::Pending),
            job_id: Some(job_id),
            search: Some("jane".into()),
        });
        assert_eq!(
            clause,
            "WHERE status = $1 AND job_id = $2::uuid AND (first_name ILIKE $3 OR last_name ILIKE $3 OR email ILIKE $3)"
        );
        assert_eq!(args, vec!["pending".to_string(), job_id.to_string(), "%jane%".to_string()]);
    }
}
