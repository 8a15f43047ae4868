use async_trait::async_trait;

use crate::domain::{errors::DeliveryError, models::BroadcastContent};

/// Thin seam over the external messaging API: one recipient, one message.
/// Implementations classify failures as transient (worth retrying) or
/// permanent (recipient unreachable or blocked the channel).
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, chat_id: i64, content: &BroadcastContent) -> Result<(), DeliveryError>;
}
