use std::sync::Arc;

use crate::domain::{models::Recipient, repositories::RecipientDirectory};

/// First-contact registration: the conversational front-end calls this when
/// a user starts the bot. Repeated calls for the same chat id refresh the
/// profile fields instead of creating duplicates.
pub struct RegisterRecipientUseCase {
    directory: Arc<dyn RecipientDirectory>,
}

pub struct RegisterRecipientRequest {
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl RegisterRecipientUseCase {
    pub fn new(directory: Arc<dyn RecipientDirectory>) -> Self {
        Self { directory }
    }

    pub async fn execute(&self, request: RegisterRecipientRequest) -> anyhow::Result<Recipient> {
        let recipient = Recipient::new(request.chat_id, request.username, request.first_name);
        self.directory.upsert(&recipient).await
    }
}
