use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    application::{
        services::{dispatch_bus::DispatchBus, partitioner::partition_recipients},
        usecases::dispatch_draft::{DispatchConfig, DispatchSummary},
    },
    domain::{
        errors::DispatchError,
        models::{Campaign, CampaignStatus, Recipient},
        repositories::{CampaignStore, RecipientDirectory},
    },
};

#[derive(Debug)]
pub struct ScheduledDispatchSummary {
    pub processed: Vec<DispatchSummary>,
    pub skipped: u32,
}

/// Scheduled trigger: processes every Scheduled campaign whose time has
/// arrived, restricted to the explicitly selected recipients. Unlike the
/// immediate trigger, this mode honors the selection.
pub struct DispatchScheduledUseCase {
    campaigns: Arc<dyn CampaignStore>,
    directory: Arc<dyn RecipientDirectory>,
    bus: Arc<dyn DispatchBus>,
    config: DispatchConfig,
}

impl DispatchScheduledUseCase {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        directory: Arc<dyn RecipientDirectory>,
        bus: Arc<dyn DispatchBus>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            campaigns,
            directory,
            bus,
            config,
        }
    }

    pub async fn execute(
        &self,
        recipient_ids: &[Uuid],
    ) -> Result<ScheduledDispatchSummary, DispatchError> {
        let selection = self
            .directory
            .get_many(recipient_ids)
            .await
            .map_err(DispatchError::Other)?;
        if selection.len() != recipient_ids.len() {
            warn!(
                requested = recipient_ids.len(),
                resolved = selection.len(),
                "some selected recipients are no longer in the directory"
            );
        }

        let due = self
            .campaigns
            .list_scheduled_due(Utc::now())
            .await
            .map_err(DispatchError::Other)?;

        let mut processed = Vec::new();
        let mut skipped = 0;

        for campaign in due {
            match self
                .campaigns
                .transition(campaign.id, CampaignStatus::Scheduled, CampaignStatus::Sending)
                .await
            {
                Ok(()) => {}
                Err(DispatchError::Conflict(_)) => {
                    skipped += 1;
                    continue;
                }
                Err(err) => return Err(err),
            }

            match self.fan_out(&campaign, &selection).await {
                Ok(summary) => processed.push(summary),
                Err(err) => {
                    if let Err(revert) = self
                        .campaigns
                        .transition(campaign.id, CampaignStatus::Sending, CampaignStatus::Scheduled)
                        .await
                    {
                        warn!(campaign_id = %campaign.id, error = %revert, "failed to revert campaign after dispatch error");
                    }
                    return Err(DispatchError::Other(err));
                }
            }
        }

        Ok(ScheduledDispatchSummary { processed, skipped })
    }

    async fn fan_out(
        &self,
        campaign: &Campaign,
        selection: &[Recipient],
    ) -> anyhow::Result<DispatchSummary> {
        self.campaigns
            .set_dispatch_total(campaign.id, selection.len() as u32)
            .await?;

        if selection.is_empty() {
            self.campaigns
                .transition(campaign.id, CampaignStatus::Sending, CampaignStatus::Sent)
                .await
                .map_err(anyhow::Error::from)?;
            info!(campaign_id = %campaign.id, "dispatched scheduled campaign to empty selection");
            return Ok(DispatchSummary {
                campaign_id: campaign.id,
                dispatched: true,
                recipients: 0,
                chunks: 0,
            });
        }

        let chunks = partition_recipients(
            campaign.id,
            &campaign.content,
            selection,
            self.config.chunk_size,
        );
        let chunk_count = chunks.len() as u32;

        for chunk in chunks {
            self.bus.publish_chunk(chunk).await?;
        }

        info!(
            campaign_id = %campaign.id,
            recipients = selection.len(),
            chunks = chunk_count,
            "dispatched scheduled campaign to selection"
        );

        Ok(DispatchSummary {
            campaign_id: campaign.id,
            dispatched: true,
            recipients: selection.len() as u32,
            chunks: chunk_count,
        })
    }
}
