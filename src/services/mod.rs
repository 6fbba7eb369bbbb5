pub mod admin_query_service;
pub mod application_service;
pub mod artifact_store;
pub mod contact_service;
pub mod export_service;
pub mod job_service;
pub mod notification_service;
pub mod resume_service;
