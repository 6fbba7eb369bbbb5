use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        admin_dto::{AdminApplicationsParams, StatusUpdatePayload},
        application_dto::ApplicationResponse,
    },
    error::Result,
    models::principal::Principal,
    services::admin_query_service::AdminApplicationQuery,
    AppState,
};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[utoipa::path(
    get,
    path = "/api/admin/applications",
    params(
        ("status" = Option<String>, Query, description = "Status name, or `all`"),
        ("job_id" = Option<Uuid>, Query, description = "Only applications for this job"),
        ("search" = Option<String>, Query, description = "Name or email substring"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("page_size" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Filtered page with job facets and status counts"),
        (status = 403, description = "Not an administrator")
    )
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<AdminApplicationsParams>,
) -> Result<impl IntoResponse> {
    let query = AdminApplicationQuery::from(params);
    let view = state
        .admin_query_service
        .applications_view(&principal, &query)
        .await?;
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/api/admin/applications/{id}",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application found", body = ApplicationResponse),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .get_application(&principal, id)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/applications/{id}/status",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = StatusUpdatePayload,
    responses(
        (status = 200, description = "Status changed", body = ApplicationResponse),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let application = state
        .application_service
        .review_transition(&principal, id, &payload.status, payload.notes)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[utoipa::path(
    get,
    path = "/api/admin/applications/export",
    params(
        ("status" = Option<String>, Query, description = "Status name, or `all`"),
        ("job_id" = Option<Uuid>, Query, description = "Only applications for this job"),
        ("search" = Option<String>, Query, description = "Name or email substring")
    ),
    responses((status = 200, description = "Flat export rows", body = [crate::services::admin_query_service::ExportRow]))
)]
#[axum::debug_handler]
pub async fn export_json(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<AdminApplicationsParams>,
) -> Result<impl IntoResponse> {
    let query = AdminApplicationQuery::from(params);
    let rows = state
        .admin_query_service
        .export_rows(&principal, &query)
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/admin/applications/export.xlsx",
    params(
        ("status" = Option<String>, Query, description = "Status name, or `all`"),
        ("job_id" = Option<Uuid>, Query, description = "Only applications for this job"),
        ("search" = Option<String>, Query, description = "Name or email substring")
    ),
    responses((status = 200, description = "Styled XLSX workbook"))
)]
#[axum::debug_handler]
pub async fn export_xlsx(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<AdminApplicationsParams>,
) -> Result<impl IntoResponse> {
    let query = AdminApplicationQuery::from(params);
    let buffer = state
        .admin_query_service
        .export_xlsx(&principal, &query)
        .await?;
    let filename = format!("applications_{}.xlsx", chrono::Utc::now().format("%Y%m%d"));
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses((status = 200, description = "Totals and per-status counts"))
)]
#[axum::debug_handler]
pub async fn stats(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    let stats = state.admin_query_service.dashboard_stats(&principal).await?;
    Ok(Json(stats))
}
