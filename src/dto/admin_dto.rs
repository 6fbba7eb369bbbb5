use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::services::admin_query_service::AdminApplicationQuery;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdminApplicationsParams {
    pub status: Option<String>,
    pub job_id: Option<Uuid>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl From<AdminApplicationsParams> for AdminApplicationQuery {
    fn from(params: AdminApplicationsParams) -> Self {
        Self {
            status: params.status,
            job_id: params.job_id,
            search: params.search,
            page: params.page,
            page_size: params.page_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StatusUpdatePayload {
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
    #[validate(length(max = 5000, message = "notes are too long"))]
    pub notes: Option<String>,
}
