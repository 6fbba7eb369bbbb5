use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::job::{EmploymentType, Job, JobFields};
use crate::repositories::JobFilter;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct JobPayload {
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(length(min = 1, max = 200, message = "location is required"))]
    pub location: String,
    /// One of `Full-time`, `Part-time`, `Contract`, `Internship`.
    pub employment_type: String,
    #[validate(length(min = 1, max = 200, message = "company is required"))]
    pub company: String,
    #[serde(default)]
    pub requirements: Vec<String>,
}

impl JobPayload {
    pub fn into_fields(self) -> Result<JobFields> {
        let employment_type: EmploymentType = self
            .employment_type
            .parse()
            .map_err(|e: String| Error::validation("employment_type", e))?;
        let fields = JobFields {
            title: self.title,
            description: self.description,
            location: self.location,
            employment_type,
            company: self.company,
            requirements: self.requirements,
        }
        .normalized();
        fields.check()?;
        Ok(fields)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub employment_type: EmploymentType,
    pub company: String,
    pub requirements: Vec<String>,
    pub view_count: i64,
    pub application_count: i64,
    pub posted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            title: job.title,
            description: job.description,
            location: job.location,
            employment_type: job.employment_type,
            company: job.company,
            requirements: job.requirements,
            view_count: job.view_count,
            application_count: job.application_count,
            posted_at: job.posted_at,
            updated_at: job.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobListResponse {
    pub items: Vec<JobResponse>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobListQuery {
    pub employment_type: Option<String>,
    pub company: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl JobListQuery {
    pub fn filter(&self) -> Result<JobFilter> {
        let employment_type = match self.employment_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse()
                    .map_err(|e: String| Error::validation("employment_type", e))?,
            ),
        };
        Ok(JobFilter {
            employment_type,
            company: self
                .company
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_employment_type_is_tagged() {
        let payload = JobPayload {
            title: "Engineer".into(),
            description: "Build".into(),
            location: "Remote".into(),
            employment_type: "Gig".into(),
            company: "Acme".into(),
            requirements: vec![],
        };
        match payload.into_fields() {
            Err(Error::Validation { field, .. }) => assert_eq!(field, "employment_type"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn blank_company_filter_is_ignored() {
        let query = JobListQuery {
            company: Some("  ".into()),
            employment_type: Some("part-time".into()),
            ..Default::default()
        };
        let filter = query.filter().unwrap();
        assert!(filter.company.is_none());
        assert_eq!(filter.employment_type, Some(EmploymentType::PartTime));
    }
}
