use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    errors::DispatchError,
    models::{Campaign, CampaignStatus, DeliveryOutcome, DeliveryRecord, DeliveryTally, Recipient},
};

#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Idempotent registration keyed by chat id.
    async fn upsert(&self, recipient: &Recipient) -> anyhow::Result<Recipient>;

    /// All recipients currently eligible for broadcasts, in a stable
    /// registration order.
    async fn list_eligible(&self) -> anyhow::Result<Vec<Recipient>>;

    async fn get_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Recipient>>;

    /// Idempotent per-(campaign, recipient) outcome write; recording the
    /// same outcome twice must not change the tally.
    async fn record_outcome(
        &self,
        campaign_id: Uuid,
        recipient_id: Uuid,
        outcome: DeliveryOutcome,
    ) -> anyhow::Result<()>;

    async fn outcome_tally(&self, campaign_id: Uuid) -> anyhow::Result<DeliveryTally>;

    async fn list_outcomes(&self, campaign_id: Uuid) -> anyhow::Result<Vec<DeliveryRecord>>;
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn insert(&self, campaign: &Campaign) -> anyhow::Result<()>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Campaign>>;

    async fn list_scheduled_due(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<Campaign>>;

    /// Compare-and-set status transition; fails with `Conflict` when the
    /// campaign is not in `expected`. The only way a campaign changes
    /// status, so Sending is entered exactly once.
    async fn transition(
        &self,
        id: Uuid,
        expected: CampaignStatus,
        next: CampaignStatus,
    ) -> Result<(), DispatchError>;

    async fn set_dispatch_total(&self, id: Uuid, total: u32) -> anyhow::Result<()>;
}
