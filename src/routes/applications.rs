use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use bytes::Bytes;
use uuid::Uuid;

use crate::{
    config::ResumeUploadOrder,
    dto::application_dto::{ApplicationResponse, MyApplicationResponse, PriorApplicationResponse},
    error::{Error, Result},
    models::principal::Principal,
    services::application_service::ApplicantDetails,
    AppState,
};

struct ResumeUpload {
    filename: String,
    content_type: String,
    bytes: Bytes,
}

#[derive(Default)]
struct ApplyForm {
    details: ApplicantDetails,
    resume: Option<ResumeUpload>,
}

impl ApplyForm {
    async fn read(multipart: &mut Multipart) -> Result<Self> {
        let mut form = ApplyForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "first_name" => form.details.first_name = field.text().await?,
                "last_name" => form.details.last_name = field.text().await?,
                "email" => form.details.email = field.text().await?,
                "phone" => form.details.phone = field.text().await?,
                "cover_letter" => form.details.cover_letter = Some(field.text().await?),
                "resume" => {
                    let filename = field.file_name().unwrap_or("resume").to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    form.resume = Some(ResumeUpload {
                        filename,
                        content_type,
                        bytes,
                    });
                }
                other => tracing::debug!("Ignoring unexpected form field `{}`", other),
            }
        }
        Ok(form)
    }
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/apply",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body(content = String, content_type = "multipart/form-data", description = "Applicant fields plus a `resume` file"),
    responses(
        (status = 201, description = "Application submitted", body = ApplicationResponse),
        (status = 400, description = "Invalid field or resume"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Already applied"),
        (status = 413, description = "Resume too large")
    )
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(job_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = ApplyForm::read(&mut multipart).await?;
    let resume = form
        .resume
        .ok_or_else(|| Error::validation("resume", "resume is required"))?;

    if state.resume_upload_order == ResumeUploadOrder::Last {
        state
            .application_service
            .preflight(&principal, job_id, &form.details)
            .await?;
    }

    let resume_ref = state
        .resume_service
        .upload(
            &principal.id,
            &resume.filename,
            &resume.content_type,
            resume.bytes,
        )
        .await?;

    let application = state
        .application_service
        .submit(&principal, job_id, form.details, resume_ref)
        .await?;
    Ok((StatusCode::CREATED, Json(ApplicationResponse::from(application))))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}/application",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses((status = 200, description = "Whether the caller already applied", body = PriorApplicationResponse))
)]
#[axum::debug_handler]
pub async fn prior_application(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let prior = state
        .application_service
        .prior_application(&principal, job_id)
        .await?;
    Ok(Json(PriorApplicationResponse {
        has_applied: prior.has_applied,
        status: prior.status,
    }))
}

#[utoipa::path(
    get,
    path = "/api/me/applications",
    responses((status = 200, description = "Caller's applications, newest first", body = [MyApplicationResponse]))
)]
#[axum::debug_handler]
pub async fn my_applications(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    let items: Vec<MyApplicationResponse> = state
        .application_service
        .my_applications(&principal)
        .await?
        .into_iter()
        .map(MyApplicationResponse::from)
        .collect();
    Ok(Json(items))
}
