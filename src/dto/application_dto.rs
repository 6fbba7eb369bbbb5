use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::application::{Application, ApplicationStatus};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub cover_letter: Option<String>,
    pub resume_url: String,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl From<Application> for ApplicationResponse {
    fn from(app: Application) -> Self {
        Self {
            id: app.id,
            job_id: app.job_id,
            applicant_id: app.applicant_id,
            first_name: app.first_name,
            last_name: app.last_name,
            email: app.email,
            phone: app.phone,
            cover_letter: app.cover_letter,
            resume_url: app.resume_url,
            status: app.status,
            submitted_at: app.submitted_at,
            reviewed_at: app.reviewed_at,
            notes: app.notes,
        }
    }
}

/// What an applicant sees in their own history; reviewer notes stay
/// private.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MyApplicationResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub status: ApplicationStatus,
    pub resume_url: String,
    pub submitted_at: DateTime<Utc>,
}

impl From<Application> for MyApplicationResponse {
    fn from(app: Application) -> Self {
        Self {
            id: app.id,
            job_id: app.job_id,
            status: app.status,
            resume_url: app.resume_url,
            submitted_at: app.submitted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PriorApplicationResponse {
    pub has_applied: bool,
    pub status: Option<ApplicationStatus>,
}
