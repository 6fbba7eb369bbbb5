pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::{Config, ResumeUploadOrder};
use crate::middleware::auth::AuthState;
use crate::repositories::memory::{
    MemoryApplicationRepository, MemoryContactRepository, MemoryJobRepository,
};
use crate::repositories::{
    ApplicationRepository, ContactRepository, JobRepository, PgApplicationRepository,
    PgContactRepository, PgJobRepository,
};
use crate::services::{
    admin_query_service::AdminQueryService,
    application_service::{ApplicationService, NotifySettings},
    artifact_store::{ArtifactStore, LocalDiskStore, MemoryArtifactStore},
    contact_service::ContactService,
    job_service::JobService,
    notification_service::{LogNotifier, MailRelayNotifier, Notifier},
    resume_service::ResumeService,
};
use sqlx::PgPool;

/// Collaborators the services are wired from.
pub struct AppParts {
    pub jobs: Arc<dyn JobRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub contacts: Arc<dyn ContactRepository>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub notifier: Arc<dyn Notifier>,
    pub notify: NotifySettings,
    pub jwt_secret: String,
    pub resume_upload_order: ResumeUploadOrder,
}

#[derive(Clone)]
pub struct AppState {
    pub job_service: JobService,
    pub application_service: ApplicationService,
    pub admin_query_service: AdminQueryService,
    pub resume_service: ResumeService,
    pub contact_service: ContactService,
    pub auth: AuthState,
    pub resume_upload_order: ResumeUploadOrder,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> error::Result<Self> {
        let notifier: Arc<dyn Notifier> = match &config.mail_relay_url {
            Some(url) => Arc::new(
                MailRelayNotifier::new(url.clone(), config.mail_relay_secret.clone())
                    .map_err(|e| error::Error::Config(format!("Mail relay client: {}", e)))?,
            ),
            None => {
                tracing::warn!("MAIL_RELAY_URL not set; notifications will only be logged");
                Arc::new(LogNotifier)
            }
        };

        Ok(Self::from_parts(AppParts {
            jobs: Arc::new(PgJobRepository::new(pool.clone())),
            applications: Arc::new(PgApplicationRepository::new(pool.clone())),
            contacts: Arc::new(PgContactRepository::new(pool)),
            artifacts: Arc::new(LocalDiskStore::new(
                config.uploads_dir.clone(),
                config.public_base_url.clone(),
            )),
            notifier,
            notify: NotifySettings {
                admin_email: config.admin_notify_email.clone(),
                public_base_url: config.public_base_url.clone(),
            },
            jwt_secret: config.jwt_secret.clone(),
            resume_upload_order: config.resume_upload_order,
        }))
    }

    /// Process-local state with log-only notifications.
    pub fn in_memory(jwt_secret: &str, resume_upload_order: ResumeUploadOrder) -> Self {
        let jobs = MemoryJobRepository::new();
        Self::from_parts(AppParts {
            jobs: Arc::new(jobs.clone()),
            applications: Arc::new(MemoryApplicationRepository::new(jobs)),
            contacts: Arc::new(MemoryContactRepository::new()),
            artifacts: Arc::new(MemoryArtifactStore::new()),
            notifier: Arc::new(LogNotifier),
            notify: NotifySettings {
                admin_email: "admin@localhost".to_string(),
                public_base_url: "http://localhost:8080".to_string(),
            },
            jwt_secret: jwt_secret.to_string(),
            resume_upload_order,
        })
    }

    pub fn from_parts(parts: AppParts) -> Self {
        let application_service = ApplicationService::new(
            parts.jobs.clone(),
            parts.applications,
            parts.notifier,
            parts.notify,
        );
        Self {
            job_service: JobService::new(parts.jobs.clone()),
            admin_query_service: AdminQueryService::new(application_service.clone(), parts.jobs),
            application_service,
            resume_service: ResumeService::new(parts.artifacts),
            contact_service: ContactService::new(parts.contacts),
            auth: AuthState::new(&parts.jwt_secret),
            resume_upload_order: parts.resume_upload_order,
        }
    }
}
