use std::sync::Arc;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::job::{Job, JobFields};
use crate::models::principal::Principal;
use crate::repositories::{JobFilter, JobRepository};

/// Administrative job management plus the public read path.
#[derive(Clone)]
pub struct JobService {
    jobs: Arc<dyn JobRepository>,
}

impl JobService {
    pub fn new(jobs: Arc<dyn JobRepository>) -> Self {
        Self { jobs }
    }

    pub async fn create(&self, principal: &Principal, fields: JobFields) -> Result<Job> {
        principal.require_admin()?;
        let job = self.jobs.create(fields).await?;
        tracing::info!(job_id = %job.id, "Job created by {}", principal.id);
        Ok(job)
    }

    pub async fn update(&self, principal: &Principal, id: Uuid, fields: JobFields) -> Result<Job> {
        principal.require_admin()?;
        let job = self.jobs.update(id, fields).await?;
        tracing::info!(job_id = %id, "Job updated by {}", principal.id);
        Ok(job)
    }

    /// Existing applications keep their now-dangling job reference.
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<()> {
        principal.require_admin()?;
        if !self.jobs.delete(id).await? {
            return Err(Error::NotFound("job not found".into()));
        }
        tracing::info!(job_id = %id, "Job deleted by {}", principal.id);
        Ok(())
    }

    pub async fn reset_counters(&self, principal: &Principal, id: Uuid) -> Result<Job> {
        principal.require_admin()?;
        let job = self.jobs.reset_counters(id).await?;
        tracing::info!(job_id = %id, "Job counters reset by {}", principal.id);
        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> Result<Job> {
        self.jobs.get(id).await
    }

    pub async fn list(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        self.jobs.list(filter).await
    }
}
