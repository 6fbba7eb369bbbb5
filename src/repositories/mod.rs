//! Storage seams for jobs, applications and contact messages.
//!
//! Each trait has a Postgres implementation used by the server and an
//! in-memory one with the same constraint semantics for tests and demos.

pub mod application_repository;
pub mod contact_repository;
pub mod job_repository;
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{
    Application, ApplicationFilter, ApplicationPage, ApplicationStatus, NewApplication, Pagination,
};
use crate::models::contact_message::{ContactMessage, NewContactMessage};
use crate::models::job::{EmploymentType, Job, JobFields};

pub use application_repository::PgApplicationRepository;
pub use contact_repository::PgContactRepository;
pub use job_repository::PgJobRepository;

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub employment_type: Option<EmploymentType>,
    /// Case-insensitive substring on the company name.
    pub company: Option<String>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(kind) = self.employment_type {
            if job.employment_type != kind {
                return false;
            }
        }
        if let Some(company) = self.company.as_deref() {
            if !job.company.to_lowercase().contains(&company.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Inserts a job with zeroed counters and `posted_at` set to now.
    async fn create(&self, fields: JobFields) -> Result<Job>;

    async fn get(&self, id: Uuid) -> Result<Job>;

    async fn exists(&self, id: Uuid) -> Result<bool>;

    /// Replaces the content fields, leaving counters untouched.
    async fn update(&self, id: Uuid, fields: JobFields) -> Result<Job>;

    /// Returns whether a row was removed; deleting a missing job is not an
    /// error at this layer.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Atomic add-one; returns the post-increment value.
    async fn increment_view_count(&self, id: Uuid) -> Result<i64>;

    /// Atomic add-one; returns the post-increment value.
    async fn increment_application_count(&self, id: Uuid) -> Result<i64>;

    /// Zeroes both counters. The only operation allowed to lower them.
    async fn reset_counters(&self, id: Uuid) -> Result<Job>;

    /// Newest-first.
    async fn list(&self, filter: &JobFilter) -> Result<Vec<Job>>;

    async fn count(&self) -> Result<i64>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Checks the job exists, then inserts. A second insert for the same
    /// `(job_id, applicant_id)` fails with `Error::DuplicateApplication`,
    /// including when both inserts race.
    async fn create(&self, application: NewApplication) -> Result<Application>;

    async fn get(&self, id: Uuid) -> Result<Application>;

    /// Sets status, stamps `reviewed_at` with now and replaces notes when
    /// given. Any status is accepted regardless of the current one.
    async fn transition_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<Application>;

    async fn find_by_job_and_applicant(
        &self,
        job_id: Uuid,
        applicant_id: &str,
    ) -> Result<Option<Application>>;

    /// Newest submission first.
    async fn query(&self, filter: &ApplicationFilter, pagination: Pagination)
        -> Result<ApplicationPage>;

    /// Counts per status present in the data; absent statuses mean zero.
    async fn status_counts(&self) -> Result<BTreeMap<ApplicationStatus, i64>>;

    /// Distinct job ids referenced by any application.
    async fn referenced_job_ids(&self) -> Result<Vec<Uuid>>;

    /// Newest submission first.
    async fn list_for_applicant(&self, applicant_id: &str) -> Result<Vec<Application>>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, message: NewContactMessage) -> Result<ContactMessage>;

    /// Newest-first.
    async fn list(&self) -> Result<Vec<ContactMessage>>;

    async fn delete(&self, id: Uuid) -> Result<bool>;
}
