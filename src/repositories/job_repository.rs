use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{JobFilter, JobRepository};
use crate::error::{Error, Result};
use crate::models::job::{Job, JobFields};

const JOB_COLUMNS: &str = "id, title, description, location, employment_type, company, requirements, view_count, application_count, posted_at, updated_at";

#[derive(Clone)]
pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn increment(&self, id: Uuid, column: &'static str) -> Result<i64> {
        let statement = format!(
            "UPDATE jobs SET {col} = {col} + 1 WHERE id = $1 RETURNING {col}",
            col = column
        );
        let value = sqlx::query_scalar::<_, i64>(&statement)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        value.ok_or_else(|| Error::NotFound("job not found".into()))
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn create(&self, fields: JobFields) -> Result<Job> {
        let fields = fields.normalized();
        fields.check()?;

        let statement = format!(
            r#"
            INSERT INTO jobs (id, title, description, location, employment_type, company, requirements)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            JOB_COLUMNS
        );
        let job = sqlx::query_as::<_, Job>(&statement)
            .bind(Uuid::new_v4())
            .bind(&fields.title)
            .bind(&fields.description)
            .bind(&fields.location)
            .bind(fields.employment_type.label())
            .bind(&fields.company)
            .bind(&fields.requirements)
            .fetch_one(&self.pool)
            .await?;

        Ok(job)
    }

    async fn get(&self, id: Uuid) -> Result<Job> {
        let statement = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        sqlx::query_as::<_, Job>(&statement)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("job not found".into()))
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM jobs WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn update(&self, id: Uuid, fields: JobFields) -> Result<Job> {
        let fields = fields.normalized();
        fields.check()?;

        let statement = format!(
            r#"
            UPDATE jobs
            SET
                title = $2,
                description = $3,
                location = $4,
                employment_type = $5,
                company = $6,
                requirements = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            JOB_COLUMNS
        );
        sqlx::query_as::<_, Job>(&statement)
            .bind(id)
            .bind(&fields.title)
            .bind(&fields.description)
            .bind(&fields.location)
            .bind(fields.employment_type.label())
            .bind(&fields.company)
            .bind(&fields.requirements)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("job not found".into()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<i64> {
        self.increment(id, "view_count").await
    }

    async fn increment_application_count(&self, id: Uuid) -> Result<i64> {
        self.increment(id, "application_count").await
    }

    async fn reset_counters(&self, id: Uuid) -> Result<Job> {
        let statement = format!(
            "UPDATE jobs SET view_count = 0, application_count = 0, updated_at = NOW() WHERE id = $1 RETURNING {}",
            JOB_COLUMNS
        );
        sqlx::query_as::<_, Job>(&statement)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("job not found".into()))
    }

    async fn list(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let mut filters = Vec::new();
        let mut args: Vec<String> = Vec::new();

        if let Some(kind) = filter.employment_type {
            filters.push(format!("employment_type = ${}", args.len() + 1));
            args.push(kind.label().to_string());
        }
        if let Some(company) = filter.company.as_deref() {
            filters.push(format!("company ILIKE ${}", args.len() + 1));
            args.push(format!("%{}%", escape_like(company)));
        }

        let where_clause = if filters.is_empty() {
            "".to_string()
        } else {
            format!("WHERE {}", filters.join(" AND "))
        };

        let statement = format!(
            "SELECT {} FROM jobs {} ORDER BY posted_at DESC, id DESC",
            JOB_COLUMNS, where_clause
        );
        let mut query = sqlx::query_as::<_, Job>(&statement);
        for value in &args {
            query = query.bind(value);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn count(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}

/// Escapes `%`, `_` and `\` so user text matches literally inside ILIKE.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("jane"), "jane");
    }
}
