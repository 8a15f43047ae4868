use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    application::services::sender::MessageSender,
    domain::{
        models::{BroadcastContent, ParseMode},
        repositories::RecipientDirectory,
    },
};

/// One-off transactional message to a single recipient (order
/// confirmations and the like). Sent directly through the adapter, outside
/// any campaign and its accounting.
pub struct NotifyRecipientUseCase {
    directory: Arc<dyn RecipientDirectory>,
    sender: Arc<dyn MessageSender>,
}

pub struct NotifyRecipientRequest {
    pub recipient_id: Uuid,
    pub body: String,
    pub parse_mode: Option<ParseMode>,
}

impl NotifyRecipientUseCase {
    pub fn new(directory: Arc<dyn RecipientDirectory>, sender: Arc<dyn MessageSender>) -> Self {
        Self { directory, sender }
    }

    pub async fn execute(&self, request: NotifyRecipientRequest) -> anyhow::Result<()> {
        let recipient = self
            .directory
            .get_many(&[request.recipient_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("recipient not found: {}", request.recipient_id))?;

        let content = BroadcastContent {
            body: request.body,
            parse_mode: request.parse_mode,
        };

        self.sender
            .send(recipient.chat_id, &content)
            .await
            .map_err(anyhow::Error::from)?;

        info!(recipient_id = %recipient.id, "sent direct notification");
        Ok(())
    }
}
