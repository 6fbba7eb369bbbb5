use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::contact_message::NewContactMessage;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ContactPayload {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, max = 300, message = "subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, max = 10000, message = "message is required"))]
    pub message: String,
}

impl From<ContactPayload> for NewContactMessage {
    fn from(payload: ContactPayload) -> Self {
        Self {
            name: payload.name,
            email: payload.email,
            subject: payload.subject,
            message: payload.message,
        }
    }
}
