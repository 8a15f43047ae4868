use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    errors::DispatchError,
    models::{
        Campaign, CampaignStatus, DeliveryOutcome, DeliveryRecord, DeliveryTally, Recipient,
    },
    repositories::{CampaignStore, RecipientDirectory},
};

/// Registration-ordered directory; the Vec keeps `list_eligible` stable so
/// chunk slicing is reproducible.
#[derive(Default)]
pub struct InMemoryRecipientDirectory {
    recipients: Arc<RwLock<Vec<Recipient>>>,
    outcomes: Arc<RwLock<HashMap<(Uuid, Uuid), DeliveryRecord>>>,
}

impl InMemoryRecipientDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipientDirectory for InMemoryRecipientDirectory {
    async fn upsert(&self, recipient: &Recipient) -> anyhow::Result<Recipient> {
        let mut recipients = self.recipients.write().await;
        if let Some(existing) = recipients.iter_mut().find(|r| r.chat_id == recipient.chat_id) {
            existing.username = recipient.username.clone();
            existing.first_name = recipient.first_name.clone();
            existing.subscribed = recipient.subscribed;
            return Ok(existing.clone());
        }
        recipients.push(recipient.clone());
        Ok(recipient.clone())
    }

    async fn list_eligible(&self) -> anyhow::Result<Vec<Recipient>> {
        let recipients = self.recipients.read().await;
        Ok(recipients.iter().filter(|r| r.subscribed).cloned().collect())
    }

    async fn get_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Recipient>> {
        let recipients = self.recipients.read().await;
        Ok(recipients
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn record_outcome(
        &self,
        campaign_id: Uuid,
        recipient_id: Uuid,
        outcome: DeliveryOutcome,
    ) -> anyhow::Result<()> {
        let mut outcomes = self.outcomes.write().await;
        outcomes.insert(
            (campaign_id, recipient_id),
            DeliveryRecord {
                campaign_id,
                recipient_id,
                outcome,
                recorded_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn outcome_tally(&self, campaign_id: Uuid) -> anyhow::Result<DeliveryTally> {
        let outcomes = self.outcomes.read().await;
        let mut tally = DeliveryTally::default();
        for record in outcomes.values().filter(|r| r.campaign_id == campaign_id) {
            if record.outcome.is_delivered() {
                tally.delivered += 1;
            } else {
                tally.failed += 1;
            }
        }
        Ok(tally)
    }

    async fn list_outcomes(&self, campaign_id: Uuid) -> anyhow::Result<Vec<DeliveryRecord>> {
        let outcomes = self.outcomes.read().await;
        let mut records: Vec<_> = outcomes
            .values()
            .filter(|r| r.campaign_id == campaign_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.recorded_at);
        Ok(records)
    }
}

#[derive(Default)]
pub struct InMemoryCampaignStore {
    campaigns: Arc<RwLock<HashMap<Uuid, Campaign>>>,
}

impl InMemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignStore for InMemoryCampaignStore {
    async fn insert(&self, campaign: &Campaign) -> anyhow::Result<()> {
        let mut campaigns = self.campaigns.write().await;
        campaigns.insert(campaign.id, campaign.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Campaign>> {
        let campaigns = self.campaigns.read().await;
        Ok(campaigns.get(&id).cloned())
    }

    async fn list_scheduled_due(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<Campaign>> {
        let campaigns = self.campaigns.read().await;
        let mut due: Vec<_> = campaigns
            .values()
            .filter(|c| {
                c.status == CampaignStatus::Scheduled
                    && c.scheduled_at.is_some_and(|at| at <= now)
            })
            .cloned()
            .collect();
        due.sort_by_key(|c| c.scheduled_at);
        Ok(due)
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: CampaignStatus,
        next: CampaignStatus,
    ) -> Result<(), DispatchError> {
        let mut campaigns = self.campaigns.write().await;
        let campaign = campaigns.get_mut(&id).ok_or(DispatchError::NotFound(id))?;
        if campaign.status != expected {
            return Err(DispatchError::Conflict(id));
        }
        campaign.status = next;
        campaign.updated_at = Utc::now();
        Ok(())
    }

    async fn set_dispatch_total(&self, id: Uuid, total: u32) -> anyhow::Result<()> {
        let mut campaigns = self.campaigns.write().await;
        if let Some(campaign) = campaigns.get_mut(&id) {
            campaign.total_recipients = total;
            campaign.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_is_idempotent_per_chat_id() {
        let directory = InMemoryRecipientDirectory::new();
        let first = directory
            .upsert(&Recipient::new(42, Some("ann".into()), None))
            .await
            .unwrap();
        let second = directory
            .upsert(&Recipient::new(42, Some("ann_renamed".into()), None))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.username.as_deref(), Some("ann_renamed"));
        assert_eq!(directory.list_eligible().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recording_same_outcome_twice_does_not_double_count() {
        let directory = InMemoryRecipientDirectory::new();
        let campaign_id = Uuid::new_v4();
        let recipient_id = Uuid::new_v4();

        for _ in 0..2 {
            directory
                .record_outcome(
                    campaign_id,
                    recipient_id,
                    DeliveryOutcome::Delivered { attempts: 1 },
                )
                .await
                .unwrap();
        }

        let tally = directory.outcome_tally(campaign_id).await.unwrap();
        assert_eq!(tally.delivered, 1);
        assert_eq!(tally.failed, 0);
    }

    #[tokio::test]
    async fn transition_enforces_expected_status() {
        let store = InMemoryCampaignStore::new();
        let campaign = Campaign::new_draft(
            "promo".into(),
            crate::domain::models::BroadcastContent {
                body: "hi".into(),
                parse_mode: None,
            },
        );
        store.insert(&campaign).await.unwrap();

        store
            .transition(campaign.id, CampaignStatus::Draft, CampaignStatus::Sending)
            .await
            .unwrap();

        let err = store
            .transition(campaign.id, CampaignStatus::Draft, CampaignStatus::Sending)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Conflict(id) if id == campaign.id));

        let missing = store
            .transition(Uuid::new_v4(), CampaignStatus::Draft, CampaignStatus::Sending)
            .await
            .unwrap_err();
        assert!(matches!(missing, DispatchError::NotFound(_)));
    }
}
