use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{
    Application, ApplicationFilter, ApplicationPage, ApplicationStatus, Pagination,
};
use crate::models::job::{EmploymentType, Job};
use crate::models::principal::Principal;
use crate::repositories::{JobFilter, JobRepository};
use crate::services::application_service::ApplicationService;
use crate::services::export_service::ExportService;
use crate::utils::time::display_date;

/// Page size used by exports to approximate "every matching record".
pub const EXPORT_PAGE_SIZE: i64 = 1000;

pub const JOB_UNAVAILABLE: &str = "Job unavailable";

/// Raw admin listing parameters as they arrive from the UI.
#[derive(Debug, Clone, Default)]
pub struct AdminApplicationQuery {
    /// A status name, or `all`/empty for no status filter.
    pub status: Option<String>,
    pub job_id: Option<Uuid>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Outcome of interpreting the raw status parameter.
enum StatusFilter {
    Any,
    Only(ApplicationStatus),
    /// Unrecognized value: nothing can match.
    Unmatchable,
}

impl AdminApplicationQuery {
    fn status_filter(&self) -> StatusFilter {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => StatusFilter::Any,
            Some(raw) if raw.eq_ignore_ascii_case("all") => StatusFilter::Any,
            Some(raw) => match raw.parse() {
                Ok(status) => StatusFilter::Only(status),
                Err(_) => StatusFilter::Unmatchable,
            },
        }
    }

    fn filter(&self, status: Option<ApplicationStatus>) -> ApplicationFilter {
        ApplicationFilter {
            status,
            job_id: self.job_id,
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobSummary {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub employment_type: EmploymentType,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            title: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            employment_type: job.employment_type,
        }
    }
}

/// An application together with its job, if the job still exists.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationRow {
    #[serde(flatten)]
    pub application: Application,
    pub job: Option<JobSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminApplicationsView {
    pub applications: Vec<ApplicationRow>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    /// Jobs referenced by any application, for the job filter selector.
    pub jobs: Vec<JobSummary>,
    /// Whole-dataset counts, independent of the active filters.
    pub status_counts: BTreeMap<ApplicationStatus, i64>,
}

/// One flat row of the tabular export.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ExportRow {
    pub serial: usize,
    pub applicant_name: String,
    pub email: String,
    pub phone: String,
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub employment_type: String,
    pub submitted_on: String,
    pub status: String,
    pub cover_letter: String,
    pub resume_url: String,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_jobs: i64,
    pub total_applications: i64,
    pub status_counts: BTreeMap<ApplicationStatus, i64>,
}

/// Read-only views over applications for the review UI.
#[derive(Clone)]
pub struct AdminQueryService {
    applications: ApplicationService,
    jobs: Arc<dyn JobRepository>,
}

impl AdminQueryService {
    pub fn new(applications: ApplicationService, jobs: Arc<dyn JobRepository>) -> Self {
        Self { applications, jobs }
    }

    async fn job_index(&self) -> Result<HashMap<Uuid, Job>> {
        let jobs = self.jobs.list(&JobFilter::default()).await?;
        Ok(jobs.into_iter().map(|job| (job.id, job)).collect())
    }

    async fn page(
        &self,
        principal: &Principal,
        query: &AdminApplicationQuery,
        pagination: Pagination,
    ) -> Result<ApplicationPage> {
        match query.status_filter() {
            StatusFilter::Unmatchable => {
                principal.require_admin()?;
                Ok(ApplicationPage {
                    items: Vec::new(),
                    total: 0,
                    page: pagination.page,
                    page_size: pagination.page_size,
                    total_pages: 0,
                })
            }
            StatusFilter::Any => {
                self.applications
                    .query(principal, &query.filter(None), pagination)
                    .await
            }
            StatusFilter::Only(status) => {
                self.applications
                    .query(principal, &query.filter(Some(status)), pagination)
                    .await
            }
        }
    }

    pub async fn applications_view(
        &self,
        principal: &Principal,
        query: &AdminApplicationQuery,
    ) -> Result<AdminApplicationsView> {
        let pagination = Pagination::new(query.page, query.page_size, Pagination::MAX_PAGE_SIZE);
        let page = self.page(principal, query, pagination).await?;
        let status_counts = self.applications.status_counts(principal).await?;
        let referenced = self.applications.referenced_job_ids(principal).await?;
        let index = self.job_index().await?;

        let mut jobs: Vec<JobSummary> = referenced
            .iter()
            .filter_map(|id| index.get(id))
            .map(JobSummary::from)
            .collect();
        jobs.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));

        let applications = page
            .items
            .into_iter()
            .map(|application| {
                let job = index.get(&application.job_id).map(JobSummary::from);
                ApplicationRow { application, job }
            })
            .collect();

        Ok(AdminApplicationsView {
            applications,
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
            jobs,
            status_counts,
        })
    }

    /// Same filters as the listing, first `EXPORT_PAGE_SIZE` matches.
    pub async fn export_rows(
        &self,
        principal: &Principal,
        query: &AdminApplicationQuery,
    ) -> Result<Vec<ExportRow>> {
        let pagination = Pagination::new(Some(1), Some(EXPORT_PAGE_SIZE), EXPORT_PAGE_SIZE);
        let page = self.page(principal, query, pagination).await?;
        let index = self.job_index().await?;

        let rows = page
            .items
            .iter()
            .enumerate()
            .map(|(idx, application)| export_row(idx + 1, application, index.get(&application.job_id)))
            .collect();
        Ok(rows)
    }

    pub async fn export_xlsx(
        &self,
        principal: &Principal,
        query: &AdminApplicationQuery,
    ) -> Result<Vec<u8>> {
        let rows = self.export_rows(principal, query).await?;
        tracing::info!("Exporting {} applications for {}", rows.len(), principal.id);
        ExportService::applications_xlsx(&rows)
    }

    pub async fn dashboard_stats(&self, principal: &Principal) -> Result<DashboardStats> {
        let status_counts = self.applications.status_counts(principal).await?;
        Ok(DashboardStats {
            total_jobs: self.jobs.count().await?,
            total_applications: status_counts.values().sum(),
            status_counts,
        })
    }
}

fn export_row(serial: usize, application: &Application, job: Option<&Job>) -> ExportRow {
    let (job_title, company, location, employment_type) = match job {
        Some(job) => (
            job.title.clone(),
            job.company.clone(),
            job.location.clone(),
            job.employment_type.to_string(),
        ),
        None => (
            JOB_UNAVAILABLE.to_string(),
            String::new(),
            String::new(),
            String::new(),
        ),
    };

    ExportRow {
        serial,
        applicant_name: application.full_name(),
        email: application.email.clone(),
        phone: application.phone.clone(),
        job_title,
        company,
        location,
        employment_type,
        submitted_on: display_date(application.submitted_at),
        status: application.status.title_case(),
        cover_letter: application.cover_letter.clone().unwrap_or_default(),
        resume_url: application.resume_url.clone(),
        notes: application.notes.clone().unwrap_or_default(),
    }
}
