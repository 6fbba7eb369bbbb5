#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jobboard_backend::config::ResumeUploadOrder;
use jobboard_backend::middleware::auth::Claims;
use jobboard_backend::models::job::{EmploymentType, Job, JobFields};
use jobboard_backend::repositories::memory::{
    MemoryApplicationRepository, MemoryContactRepository, MemoryJobRepository,
};
use jobboard_backend::repositories::JobRepository;
use jobboard_backend::services::application_service::{ApplicantDetails, NotifySettings};
use jobboard_backend::services::artifact_store::MemoryArtifactStore;
use jobboard_backend::services::notification_service::{Notifier, NotifyError};
use jobboard_backend::services::resume_service::ResumeRef;
use jobboard_backend::{AppParts, AppState};
use jsonwebtoken::{encode, EncodingKey, Header};

pub const JWT_SECRET: &str = "test_secret_key";

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub body_html: String,
}

/// Remembers every message; optionally fails each send after recording it.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<SentMessage>>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Background dispatch means messages land shortly after `submit`.
    pub async fn wait_for(&self, count: usize) -> Vec<SentMessage> {
        for _ in 0..100 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, body_html: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(SentMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body_html: body_html.to_string(),
        });
        if self.fail {
            return Err(NotifyError::Rejected {
                status: 503,
                body: "relay unavailable".into(),
            });
        }
        Ok(())
    }
}

/// In-memory wiring with handles kept for inspection and fault injection.
pub struct Fixture {
    pub state: AppState,
    pub jobs: MemoryJobRepository,
    pub applications: MemoryApplicationRepository,
    pub artifacts: MemoryArtifactStore,
    pub notifier: RecordingNotifier,
}

impl Fixture {
    pub fn new() -> Self {
        Self::build(RecordingNotifier::default(), ResumeUploadOrder::First)
    }

    pub fn build(notifier: RecordingNotifier, order: ResumeUploadOrder) -> Self {
        let jobs = MemoryJobRepository::new();
        let applications = MemoryApplicationRepository::new(jobs.clone());
        let artifacts = MemoryArtifactStore::new();
        let state = AppState::from_parts(AppParts {
            jobs: Arc::new(jobs.clone()),
            applications: Arc::new(applications.clone()),
            contacts: Arc::new(MemoryContactRepository::new()),
            artifacts: Arc::new(artifacts.clone()),
            notifier: Arc::new(notifier.clone()),
            notify: NotifySettings {
                admin_email: "hr@example.com".into(),
                public_base_url: "https://jobs.example.com".into(),
            },
            jwt_secret: JWT_SECRET.into(),
            resume_upload_order: order,
        });
        Self {
            state,
            jobs,
            applications,
            artifacts,
            notifier,
        }
    }

    pub async fn job(&self, title: &str) -> Job {
        self.jobs.create(job_fields(title)).await.unwrap()
    }
}

pub fn job_fields(title: &str) -> JobFields {
    JobFields {
        title: title.into(),
        description: "Build and run services".into(),
        location: "Remote".into(),
        employment_type: EmploymentType::FullTime,
        company: "Acme".into(),
        requirements: vec!["Rust".into(), "SQL".into()],
    }
}

pub fn details(first: &str, last: &str, email: &str) -> ApplicantDetails {
    ApplicantDetails {
        first_name: first.into(),
        last_name: last.into(),
        email: email.into(),
        phone: "555-0100".into(),
        cover_letter: Some("I would love to join.".into()),
    }
}

pub fn resume(name: &str) -> ResumeRef {
    ResumeRef {
        url: format!("https://files.example.com/{}.pdf", name),
        artifact_id: Some(name.to_string()),
    }
}

pub fn token(sub: &str, role: Option<&str>) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        role: role.map(str::to_string),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}
