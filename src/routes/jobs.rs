use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::job_dto::{JobListQuery, JobListResponse, JobPayload, JobResponse},
    error::Result,
    models::{application::Pagination, principal::Principal},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/jobs",
    params(
        ("employment_type" = Option<String>, Query, description = "Exact employment type"),
        ("company" = Option<String>, Query, description = "Company name substring")
    ),
    responses(
        (status = 200, description = "Job board, newest first", body = [JobResponse]),
        (status = 400, description = "Unknown employment type")
    )
)]
#[axum::debug_handler]
pub async fn list_public_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse> {
    let jobs = state.job_service.list(&query.filter()?).await?;
    let items: Vec<JobResponse> = jobs.into_iter().map(JobResponse::from).collect();
    Ok(Json(items))
}

/// Loading a job detail page counts as one view.
#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job found", body = JobResponse),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_public_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let views = state.application_service.record_view(id).await?;
    let mut job = state.job_service.get(id).await?;
    // A concurrent view may land between the two reads.
    job.view_count = job.view_count.max(views);
    Ok(Json(JobResponse::from(job)))
}

#[utoipa::path(
    get,
    path = "/api/admin/jobs",
    params(
        ("employment_type" = Option<String>, Query, description = "Exact employment type"),
        ("company" = Option<String>, Query, description = "Company name substring"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("page_size" = Option<i64>, Query, description = "Items per page")
    ),
    responses((status = 200, description = "Paginated jobs", body = JobListResponse))
)]
#[axum::debug_handler]
pub async fn list_admin_jobs(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse> {
    principal.require_admin()?;
    let pagination = Pagination::new(query.page, query.page_size, Pagination::MAX_PAGE_SIZE);
    let jobs = state.job_service.list(&query.filter()?).await?;
    let total = jobs.len() as i64;
    let items = jobs
        .into_iter()
        .skip(pagination.offset() as usize)
        .take(pagination.page_size as usize)
        .map(JobResponse::from)
        .collect();
    Ok(Json(JobListResponse {
        items,
        total,
        page: pagination.page,
        page_size: pagination.page_size,
        total_pages: pagination.total_pages(total),
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job found", body = JobResponse),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_admin_job(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    principal.require_admin()?;
    let job = state.job_service.get(id).await?;
    Ok(Json(JobResponse::from(job)))
}

#[utoipa::path(
    post,
    path = "/api/admin/jobs",
    request_body = JobPayload,
    responses(
        (status = 201, description = "Job created", body = JobResponse),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<JobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state
        .job_service
        .create(&principal, payload.into_fields()?)
        .await?;
    Ok((StatusCode::CREATED, Json(JobResponse::from(job))))
}

#[utoipa::path(
    put,
    path = "/api/admin/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = JobPayload,
    responses(
        (status = 200, description = "Job updated", body = JobResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<JobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state
        .job_service
        .update(&principal, id, payload.into_fields()?)
        .await?;
    Ok(Json(JobResponse::from(job)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 204, description = "Job deleted"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.job_service.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/jobs/{id}/reset-counters",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Counters zeroed", body = JobResponse),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn reset_counters(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.reset_counters(&principal, id).await?;
    Ok(Json(JobResponse::from(job)))
}
