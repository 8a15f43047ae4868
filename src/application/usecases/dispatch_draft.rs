use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    application::services::{dispatch_bus::DispatchBus, partitioner::partition_recipients},
    domain::{
        errors::DispatchError,
        models::{Campaign, CampaignStatus},
        repositories::{CampaignStore, RecipientDirectory},
    },
};

#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct DispatchSummary {
    pub campaign_id: Uuid,
    pub dispatched: bool,
    pub recipients: u32,
    pub chunks: u32,
}

/// Immediate trigger on a Draft campaign. Targets every eligible recipient
/// in the directory; any selection made in the admin surface is ignored for
/// this mode (carried-over behavior of the original admin action).
pub struct DispatchDraftUseCase {
    campaigns: Arc<dyn CampaignStore>,
    directory: Arc<dyn RecipientDirectory>,
    bus: Arc<dyn DispatchBus>,
    config: DispatchConfig,
}

impl DispatchDraftUseCase {
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

    pub async fn execute(&self, campaign_id: Uuid) -> Result<DispatchSummary, DispatchError> {
        let campaign = self
            .campaigns
            .get(campaign_id)
            .await
            .map_err(DispatchError::Other)?
            .ok_or(DispatchError::NotFound(campaign_id))?;

        match self
            .campaigns
            .transition(campaign_id, CampaignStatus::Draft, CampaignStatus::Sending)
            .await
        {
            Ok(()) => {}
            Err(DispatchError::Conflict(_)) => {
                info!(%campaign_id, status = campaign.status.as_str(), "campaign already dispatched, skipping");
                return Ok(DispatchSummary {
                    campaign_id,
                    dispatched: false,
                    recipients: 0,
                    chunks: 0,
                });
            }
            Err(err) => return Err(err),
        }

        match self.fan_out(&campaign).await {
            Ok(summary) => Ok(summary),
            Err(err) => {
                // Leave the campaign re-triggerable; jobs already published
                // before the failure are absorbed by idempotent outcome
                // recording on retry.
                if let Err(revert) = self
                    .campaigns
                    .transition(campaign_id, CampaignStatus::Sending, CampaignStatus::Draft)
                    .await
                {
                    warn!(%campaign_id, error = %revert, "failed to revert campaign after dispatch error");
                }
                Err(DispatchError::Other(err))
            }
        }
    }

    async fn fan_out(&self, campaign: &Campaign) -> anyhow::Result<DispatchSummary> {
        let recipients = self.directory.list_eligible().await?;
        self.campaigns
            .set_dispatch_total(campaign.id, recipients.len() as u32)
            .await?;

        if recipients.is_empty() {
            // Nothing will ever settle, so close the campaign out here.
            self.campaigns
                .transition(campaign.id, CampaignStatus::Sending, CampaignStatus::Sent)
                .await
                .map_err(anyhow::Error::from)?;
            info!(campaign_id = %campaign.id, "dispatched campaign to empty directory");
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
            &recipients,
            self.config.chunk_size,
        );
        let chunk_count = chunks.len() as u32;

        for chunk in chunks {
            self.bus.publish_chunk(chunk).await?;
        }

        info!(
            campaign_id = %campaign.id,
            recipients = recipients.len(),
            chunks = chunk_count,
            "dispatched draft campaign to full directory"
        );

        Ok(DispatchSummary {
            campaign_id: campaign.id,
            dispatched: true,
            recipients: recipients.len() as u32,
            chunks: chunk_count,
        })
    }
}
