use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An addressable end user, registered on first contact with the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub id: Uuid,
    /// External channel address (Telegram chat id).
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub subscribed: bool,
    pub created_at: DateTime<Utc>,
}

impl Recipient {
    pub fn new(chat_id: i64, username: Option<String>, first_name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            chat_id,
            username,
            first_name,
            subscribed: true,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Failed { reason: String, attempts: u32 },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// One row of the per-campaign audit trail, keyed by (campaign, recipient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub campaign_id: Uuid,
    pub recipient_id: Uuid,
    pub outcome: DeliveryOutcome,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregate counts used to decide when a Sending campaign is finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryTally {
    pub delivered: u32,
    pub failed: u32,
}

impl DeliveryTally {
    pub fn settled(&self) -> u32 {
        self.delivered + self.failed
    }
}
