use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationFilter, ApplicationPage, ApplicationStatus, NewApplication, Pagination,
};
use crate::models::job::Job;
use crate::models::principal::Principal;
use crate::repositories::{ApplicationRepository, JobRepository};
use crate::services::notification_service::{self, escape_html, Notification, Notifier};
use crate::services::resume_service::ResumeRef;
use crate::utils::validation;

/// Personal fields an applicant fills in on the apply form.
#[derive(Debug, Clone, Default)]
pub struct ApplicantDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub cover_letter: Option<String>,
}

impl ApplicantDetails {
    /// Trimmed copy, or the first offending field.
    pub fn validated(&self) -> Result<ApplicantDetails> {
        Ok(ApplicantDetails {
            first_name: validation::required("first_name", &self.first_name)?,
            last_name: validation::required("last_name", &self.last_name)?,
            email: validation::email("email", &self.email)?,
            phone: validation::required("phone", &self.phone)?,
            cover_letter: validation::optional(self.cover_letter.clone()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorApplication {
    pub has_applied: bool,
    pub status: Option<ApplicationStatus>,
}

/// Where admin notifications go and how the review link is built.
#[derive(Debug, Clone)]
pub struct NotifySettings {
    pub admin_email: String,
    pub public_base_url: String,
}

#[derive(Clone)]
pub struct ApplicationService {
    jobs: Arc<dyn JobRepository>,
    applications: Arc<dyn ApplicationRepository>,
    notifier: Arc<dyn Notifier>,
    settings: NotifySettings,
}

impl ApplicationService {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        applications: Arc<dyn ApplicationRepository>,
        notifier: Arc<dyn Notifier>,
        settings: NotifySettings,
    ) -> Self {
        Self {
            jobs,
            applications,
            notifier,
            settings,
        }
    }

    /// Validation, job existence and the prior-application probe, without
    /// writing anything. Lets callers defer the resume upload until the
    /// submission is known to be acceptable.
    pub async fn preflight(
        &self,
        principal: &Principal,
        job_id: Uuid,
        details: &ApplicantDetails,
    ) -> Result<()> {
        details.validated()?;
        if !self.jobs.exists(job_id).await? {
            return Err(Error::NotFound("job not found".into()));
        }
        if self
            .applications
            .find_by_job_and_applicant(job_id, &principal.id)
            .await?
            .is_some()
        {
            return Err(Error::DuplicateApplication);
        }
        Ok(())
    }

    /// Runs the submission protocol for `principal` against `job_id`.
    ///
    /// The application counter is bumped after the insert as a separate
    /// step. If that step fails the application is kept and the counter
    /// undercounts by one, so application counts are eventually accurate
    /// rather than transactionally exact. The admin notification is sent in
    /// the background and cannot fail the submission.
    pub async fn submit(
        &self,
        principal: &Principal,
        job_id: Uuid,
        details: ApplicantDetails,
        resume: ResumeRef,
    ) -> Result<Application> {
        let details = details.validated()?;
        if resume.url.trim().is_empty() {
            return Err(Error::validation("resume", "resume is required"));
        }

        let job = self.jobs.get(job_id).await?;

        let created = self
            .applications
            .create(NewApplication {
                job_id,
                applicant_id: principal.id.clone(),
                first_name: details.first_name,
                last_name: details.last_name,
                email: details.email,
                phone: details.phone,
                cover_letter: details.cover_letter,
                resume_url: resume.url,
                resume_artifact_id: resume.artifact_id,
            })
            .await;
        let application = match created {
            Ok(application) => application,
            Err(Error::DuplicateApplication) => {
                tracing::info!("Applicant {} already applied to job {}", principal.id, job_id);
                return Err(Error::DuplicateApplication);
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            application_id = %application.id,
            job_id = %job_id,
            "Application submitted by {}",
            principal.id
        );

        if let Err(e) = self.jobs.increment_application_count(job_id).await {
            tracing::warn!(
                error = %e,
                application_id = %application.id,
                "Application counter not incremented for job {}; count will undercount",
                job_id
            );
        }

        notification_service::dispatch(
            self.notifier.clone(),
            self.new_application_notice(&application, &job),
        );

        Ok(application)
    }

    fn new_application_notice(&self, application: &Application, job: &Job) -> Notification {
        let review_link = format!(
            "{}/admin/applications?job_id={}",
            self.settings.public_base_url, job.id
        );
        let body_html = format!(
            "<h2>New application received</h2>\
             <p><strong>{name}</strong> ({email}, {phone}) applied for \
             <strong>{title}</strong> at {company}.</p>\
             <p>Applicant id: {applicant}</p>\
             <p><a href=\"{link}\">Review applications</a></p>",
            name = escape_html(&application.full_name()),
            email = escape_html(&application.email),
            phone = escape_html(&application.phone),
            title = escape_html(&job.title),
            company = escape_html(&job.company),
            applicant = escape_html(&application.applicant_id),
            link = escape_html(&review_link),
        );
        Notification {
            to: self.settings.admin_email.clone(),
            subject: format!("New application: {} - {}", job.title, application.full_name()),
            body_html,
        }
    }

    /// One view per job-detail load; not deduplicated per visitor.
    pub async fn record_view(&self, job_id: Uuid) -> Result<i64> {
        self.jobs.increment_view_count(job_id).await
    }

    pub async fn prior_application(
        &self,
        principal: &Principal,
        job_id: Uuid,
    ) -> Result<PriorApplication> {
        let found = self
            .applications
            .find_by_job_and_applicant(job_id, &principal.id)
            .await?;
        Ok(PriorApplication {
            has_applied: found.is_some(),
            status: found.map(|application| application.status),
        })
    }

    pub async fn my_applications(&self, principal: &Principal) -> Result<Vec<Application>> {
        self.applications.list_for_applicant(&principal.id).await
    }

    /// Moves an application to `new_status`. Every recognized status is
    /// reachable from every other; only unrecognized values are refused.
    pub async fn review_transition(
        &self,
        principal: &Principal,
        application_id: Uuid,
        new_status: &str,
        notes: Option<String>,
    ) -> Result<Application> {
        principal.require_admin()?;
        let status: ApplicationStatus = new_status.parse().map_err(|_| {
            Error::validation(
                "status",
                format!(
                    "status must be one of: {}",
                    ApplicationStatus::ALL.map(|s| s.as_str()).join(", ")
                ),
            )
        })?;

        let current = self.applications.get(application_id).await?;
        if !current.status.can_transition_to(status) {
            return Err(Error::validation(
                "status",
                format!("cannot move from {} to {}", current.status, status),
            ));
        }

        let application = self
            .applications
            .transition_status(application_id, status, validation::optional(notes))
            .await?;
        tracing::info!(
            application_id = %application_id,
            "Application moved to {} by {}",
            status,
            principal.id
        );
        Ok(application)
    }

    pub async fn get_application(&self, principal: &Principal, id: Uuid) -> Result<Application> {
        principal.require_admin()?;
        self.applications.get(id).await
    }

    pub async fn query(
        &self,
        principal: &Principal,
        filter: &ApplicationFilter,
        pagination: Pagination,
    ) -> Result<ApplicationPage> {
        principal.require_admin()?;
        self.applications.query(filter, pagination).await
    }

    pub async fn status_counts(
        &self,
        principal: &Principal,
    ) -> Result<BTreeMap<ApplicationStatus, i64>> {
        principal.require_admin()?;
        self.applications.status_counts().await
    }

    pub async fn referenced_job_ids(&self, principal: &Principal) -> Result<Vec<Uuid>> {
        principal.require_admin()?;
        self.applications.referenced_job_ids().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{EmploymentType, JobFields};
    use crate::repositories::memory::{MemoryApplicationRepository, MemoryJobRepository};
    use crate::services::notification_service::{MockNotifier, NotifyError};

    fn fields() -> JobFields {
        JobFields {
            title: "Backend Engineer".into(),
            description: "Build services".into(),
            location: "Remote".into(),
            employment_type: EmploymentType::FullTime,
            company: "Acme".into(),
            requirements: vec!["Rust".into()],
        }
    }

    fn details() -> ApplicantDetails {
        ApplicantDetails {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@example.com".into(),
            phone: "555-0100".into(),
            cover_letter: None,
        }
    }

    fn resume() -> ResumeRef {
        ResumeRef {
            url: "https://files.example.com/cv.pdf".into(),
            artifact_id: Some("cv-1".into()),
        }
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_submission() {
        let jobs = MemoryJobRepository::new();
        let applications = MemoryApplicationRepository::new(jobs.clone());
        let job = jobs.create(fields()).await.unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel::<(String, String)>();
        let tx = std::sync::Mutex::new(Some(tx));
        let mut notifier = MockNotifier::new();
        notifier.expect_send().times(1).returning(move |to, _subject, body| {
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send((to.to_string(), body.to_string()));
            }
            Err(NotifyError::Rejected {
                status: 500,
                body: "smtp down".into(),
            })
        });

        let service = ApplicationService::new(
            Arc::new(jobs.clone()),
            Arc::new(applications),
            Arc::new(notifier),
            NotifySettings {
                admin_email: "hr@example.com".into(),
                public_base_url: "https://jobs.example.com".into(),
            },
        );

        let application = service
            .submit(&Principal::applicant("user-1"), job.id, details(), resume())
            .await
            .unwrap();
        assert_eq!(application.status, ApplicationStatus::Pending);

        let (to, body) = tokio::time::timeout(std::time::Duration::from_secs(1), rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(to, "hr@example.com");
        assert!(body.contains(&format!(
            "https://jobs.example.com/admin/applications?job_id={}",
            job.id
        )));
        assert!(body.contains("Jane Doe"));
    }

    #[tokio::test]
    async fn invalid_email_is_tagged_and_checked_before_job_lookup() {
        let jobs = MemoryJobRepository::new();
        let applications = MemoryApplicationRepository::new(jobs.clone());
        let mut notifier = MockNotifier::new();
        notifier.expect_send().never();
        let service = ApplicationService::new(
            Arc::new(jobs),
            Arc::new(applications),
            Arc::new(notifier),
            NotifySettings {
                admin_email: "hr@example.com".into(),
                public_base_url: "https://jobs.example.com".into(),
            },
        );

        let mut bad = details();
        bad.email = "not-an-email".into();
        let err = service
            .submit(&Principal::applicant("user-1"), Uuid::new_v4(), bad, resume())
            .await
            .unwrap_err();
        match err {
            Error::Validation { field, .. } => assert_eq!(field, "email"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
