//! Mutex-guarded in-process repositories.
//!
//! Every mutation happens under a single lock acquisition, so counter
//! increments and the `(job_id, applicant_id)` uniqueness check are atomic
//! with respect to concurrent callers, like their Postgres counterparts.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{ApplicationRepository, ContactRepository, JobFilter, JobRepository};
use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationFilter, ApplicationPage, ApplicationStatus, NewApplication, Pagination,
};
use crate::models::contact_message::{ContactMessage, NewContactMessage};
use crate::models::job::{Job, JobFields};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::Internal("in-memory store lock poisoned".into()))
}

#[derive(Default)]
struct JobState {
    /// Insertion order; later entries are newer.
    jobs: Vec<Job>,
}

#[derive(Clone, Default)]
pub struct MemoryJobRepository {
    inner: Arc<Mutex<JobState>>,
    fail_application_increments: Arc<AtomicBool>,
}

impl MemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `increment_application_count` fail with a transient error,
    /// simulating a storage outage between application insert and counter
    /// update.
    pub fn fail_application_increments(&self, fail: bool) {
        self.fail_application_increments.store(fail, Ordering::SeqCst);
    }

    fn with_job<R>(&self, id: Uuid, f: impl FnOnce(&mut Job) -> R) -> Result<R> {
        let mut state = lock(&self.inner)?;
        let job = state
            .jobs
            .iter_mut()
            .find(|job| job.id == id)
            .ok_or_else(|| Error::NotFound("job not found".into()))?;
        Ok(f(job))
    }
}

#[async_trait]
impl JobRepository for MemoryJobRepository {
    async fn create(&self, fields: JobFields) -> Result<Job> {
        let fields = fields.normalized();
        fields.check()?;

        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            title: fields.title,
            description: fields.description,
            location: fields.location,
            employment_type: fields.employment_type,
            company: fields.company,
            requirements: fields.requirements,
            view_count: 0,
            application_count: 0,
            posted_at: now,
            updated_at: now,
        };
        lock(&self.inner)?.jobs.push(job.clone());
        Ok(job)
    }

    async fn get(&self, id: Uuid) -> Result<Job> {
        self.with_job(id, |job| job.clone())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(lock(&self.inner)?.jobs.iter().any(|job| job.id == id))
    }

    async fn update(&self, id: Uuid, fields: JobFields) -> Result<Job> {
        let fields = fields.normalized();
        fields.check()?;

        self.with_job(id, |job| {
            job.title = fields.title;
            job.description = fields.description;
            job.location = fields.location;
            job.employment_type = fields.employment_type;
            job.company = fields.company;
            job.requirements = fields.requirements;
            job.updated_at = Utc::now();
            job.clone()
        })
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = lock(&self.inner)?;
        let before = state.jobs.len();
        state.jobs.retain(|job| job.id != id);
        Ok(state.jobs.len() != before)
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<i64> {
        self.with_job(id, |job| {
            job.view_count += 1;
            job.view_count
        })
    }

    async fn increment_application_count(&self, id: Uuid) -> Result<i64> {
        if self.fail_application_increments.load(Ordering::SeqCst) {
            return Err(Error::Transient("injected counter failure".into()));
        }
        self.with_job(id, |job| {
            job.application_count += 1;
            job.application_count
        })
    }

    async fn reset_counters(&self, id: Uuid) -> Result<Job> {
        self.with_job(id, |job| {
            job.view_count = 0;
            job.application_count = 0;
            job.updated_at = Utc::now();
            job.clone()
        })
    }

    async fn list(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let state = lock(&self.inner)?;
        let mut jobs: Vec<Job> = state
            .jobs
            .iter()
            .rev()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        Ok(jobs)
    }

    async fn count(&self) -> Result<i64> {
        Ok(lock(&self.inner)?.jobs.len() as i64)
    }
}

#[derive(Clone)]
pub struct MemoryApplicationRepository {
    jobs: MemoryJobRepository,
    /// Insertion order; later entries are newer.
    applications: Arc<Mutex<Vec<Application>>>,
}

impl MemoryApplicationRepository {
    pub fn new(jobs: MemoryJobRepository) -> Self {
        Self {
            jobs,
            applications: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Newest-first snapshot of the rows matching `filter`.
    fn matching(&self, filter: &ApplicationFilter) -> Result<Vec<Application>> {
        let applications = lock(&self.applications)?;
        let mut items: Vec<Application> = applications
            .iter()
            .rev()
            .filter(|application| filter.matches(application))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(items)
    }
}

#[async_trait]
impl ApplicationRepository for MemoryApplicationRepository {
    async fn create(&self, application: NewApplication) -> Result<Application> {
        if application.resume_url.trim().is_empty() {
            return Err(Error::validation("resume", "resume is required"));
        }
        if !self.jobs.exists(application.job_id).await? {
            return Err(Error::NotFound("job not found".into()));
        }

        let mut applications = lock(&self.applications)?;
        let duplicate = applications.iter().any(|existing| {
            existing.job_id == application.job_id
                && existing.applicant_id == application.applicant_id
        });
        if duplicate {
            return Err(Error::DuplicateApplication);
        }

        let created = Application {
            id: Uuid::new_v4(),
            job_id: application.job_id,
            applicant_id: application.applicant_id,
            first_name: application.first_name,
            last_name: application.last_name,
            email: application.email,
            phone: application.phone,
            cover_letter: application.cover_letter,
            resume_url: application.resume_url,
            resume_artifact_id: application.resume_artifact_id,
            status: ApplicationStatus::Pending,
            submitted_at: Utc::now(),
            reviewed_at: None,
            notes: None,
        };
        applications.push(created.clone());
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> Result<Application> {
        lock(&self.applications)?
            .iter()
            .find(|application| application.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound("application not found".into()))
    }

    async fn transition_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<Application> {
        let mut applications = lock(&self.applications)?;
        let application = applications
            .iter_mut()
            .find(|application| application.id == id)
            .ok_or_else(|| Error::NotFound("application not found".into()))?;

        application.status = status;
        application.reviewed_at = Some(Utc::now());
        if notes.is_some() {
            application.notes = notes;
        }
        Ok(application.clone())
    }

    async fn find_by_job_and_applicant(
        &self,
        job_id: Uuid,
        applicant_id: &str,
    ) -> Result<Option<Application>> {
        Ok(lock(&self.applications)?
            .iter()
            .find(|application| {
                application.job_id == job_id && application.applicant_id == applicant_id
            })
            .cloned())
    }

    async fn query(
        &self,
        filter: &ApplicationFilter,
        pagination: Pagination,
    ) -> Result<ApplicationPage> {
        let matching = self.matching(filter)?;
        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.page_size as usize)
            .collect();

        Ok(ApplicationPage {
            items,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
            total_pages: pagination.total_pages(total),
        })
    }

    async fn status_counts(&self) -> Result<BTreeMap<ApplicationStatus, i64>> {
        let mut counts = BTreeMap::new();
        for application in lock(&self.applications)?.iter() {
            *counts.entry(application.status).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn referenced_job_ids(&self) -> Result<Vec<Uuid>> {
        let ids: BTreeSet<Uuid> = lock(&self.applications)?
            .iter()
            .map(|application| application.job_id)
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn list_for_applicant(&self, applicant_id: &str) -> Result<Vec<Application>> {
        let mut items: Vec<Application> = lock(&self.applications)?
            .iter()
            .rev()
            .filter(|application| application.applicant_id == applicant_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(items)
    }
}

#[derive(Clone, Default)]
pub struct MemoryContactRepository {
    messages: Arc<Mutex<Vec<ContactMessage>>>,
}

impl MemoryContactRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactRepository for MemoryContactRepository {
    async fn create(&self, message: NewContactMessage) -> Result<ContactMessage> {
        let created = ContactMessage {
            id: Uuid::new_v4(),
            name: message.name,
            email: message.email,
            subject: message.subject,
            message: message.message,
            created_at: Utc::now(),
        };
        lock(&self.messages)?.push(created.clone());
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<ContactMessage>> {
        let mut items: Vec<ContactMessage> = lock(&self.messages)?.iter().rev().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut messages = lock(&self.messages)?;
        let before = messages.len();
        messages.retain(|message| message.id != id);
        Ok(messages.len() != before)
    }
}
