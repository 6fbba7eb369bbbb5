pub mod admin;
pub mod applications;
pub mod contact;
pub mod health;
pub mod jobs;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};

use crate::middleware::auth::{require_admin, require_principal};
use crate::middleware::rate_limit::{rps_middleware, RateLimiter};
use crate::services::resume_service::MAX_RESUME_BYTES;
use crate::AppState;

/// Headroom above the resume ceiling so oversized files reach the resume
/// checks and get a field-level answer.
const BODY_LIMIT: usize = MAX_RESUME_BYTES + 3 * 1024 * 1024;

/// All API routes with auth and per-group rate limits applied. Static file
/// serving, CORS and tracing layers are added by the binary.
pub fn router(state: AppState, public_rps: u32, admin_rps: u32) -> Router {
    let public_api = Router::new()
        .route("/api/jobs", get(jobs::list_public_jobs))
        .route("/api/jobs/:id", get(jobs::get_public_job))
        .route("/api/contact", post(contact::create_message))
        .layer(from_fn_with_state(
            RateLimiter::new("public", public_rps),
            rps_middleware,
        ));

    let applicant_api = Router::new()
        .route("/api/jobs/:id/apply", post(applications::apply))
        .route("/api/jobs/:id/application", get(applications::prior_application))
        .route("/api/me/applications", get(applications::my_applications))
        .layer(from_fn_with_state(state.auth.clone(), require_principal))
        .layer(from_fn_with_state(
            RateLimiter::new("applicant", public_rps),
            rps_middleware,
        ));

    let admin_api = Router::new()
        .route(
            "/api/admin/jobs",
            get(jobs::list_admin_jobs).post(jobs::create_job),
        )
        .route(
            "/api/admin/jobs/:id",
            get(jobs::get_admin_job)
                .put(jobs::update_job)
                .delete(jobs::delete_job),
        )
        .route(
            "/api/admin/jobs/:id/reset-counters",
            post(jobs::reset_counters),
        )
        .route("/api/admin/applications", get(admin::list_applications))
        .route("/api/admin/applications/export", get(admin::export_json))
        .route("/api/admin/applications/export.xlsx", get(admin::export_xlsx))
        .route("/api/admin/applications/:id", get(admin::get_application))
        .route(
            "/api/admin/applications/:id/status",
            patch(admin::update_status),
        )
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/messages", get(contact::list_messages))
        .route(
            "/api/admin/messages/:id",
            axum::routing::delete(contact::delete_message),
        )
        .layer(from_fn_with_state(state.auth.clone(), require_admin))
        .layer(from_fn_with_state(
            RateLimiter::new("admin", admin_rps),
            rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(public_api)
        .merge(applicant_api)
        .merge(admin_api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}
