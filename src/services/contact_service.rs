use std::sync::Arc;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::contact_message::{ContactMessage, NewContactMessage};
use crate::models::principal::Principal;
use crate::repositories::ContactRepository;
use crate::utils::validation;

#[derive(Clone)]
pub struct ContactService {
    messages: Arc<dyn ContactRepository>,
}

impl ContactService {
    pub fn new(messages: Arc<dyn ContactRepository>) -> Self {
        Self { messages }
    }

    pub async fn create(&self, message: NewContactMessage) -> Result<ContactMessage> {
        let message = NewContactMessage {
            name: validation::required("name", &message.name)?,
            email: validation::email("email", &message.email)?,
            subject: validation::required("subject", &message.subject)?,
            message: validation::required("message", &message.message)?,
        };
        let created = self.messages.create(message).await?;
        tracing::info!(message_id = %created.id, "Contact message received");
        Ok(created)
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<ContactMessage>> {
        principal.require_admin()?;
        self.messages.list().await
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<()> {
        principal.require_admin()?;
        if !self.messages.delete(id).await? {
            return Err(Error::NotFound("message not found".into()));
        }
        Ok(())
    }
}
