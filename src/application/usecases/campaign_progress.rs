use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    errors::DispatchError,
    models::{Campaign, DeliveryRecord, DeliveryTally},
    repositories::{CampaignStore, RecipientDirectory},
};

pub struct CampaignProgress {
    pub campaign: Campaign,
    pub tally: DeliveryTally,
}

/// Status readback for the admin surface: campaign state plus the
/// delivered/failed counters accumulated by the send workers.
pub struct CampaignProgressUseCase {
    campaigns: Arc<dyn CampaignStore>,
    directory: Arc<dyn RecipientDirectory>,
}

impl CampaignProgressUseCase {
    pub fn new(campaigns: Arc<dyn CampaignStore>, directory: Arc<dyn RecipientDirectory>) -> Self {
        Self {
            campaigns,
            directory,
        }
    }

    pub async fn execute(&self, campaign_id: Uuid) -> Result<CampaignProgress, DispatchError> {
        let campaign = self
            .campaigns
            .get(campaign_id)
            .await
            .map_err(DispatchError::Other)?
            .ok_or(DispatchError::NotFound(campaign_id))?;

        let tally = self
            .directory
            .outcome_tally(campaign_id)
            .await
            .map_err(DispatchError::Other)?;

        Ok(CampaignProgress { campaign, tally })
    }

    pub async fn outcomes(&self, campaign_id: Uuid) -> Result<Vec<DeliveryRecord>, DispatchError> {
        self.campaigns
            .get(campaign_id)
            .await
            .map_err(DispatchError::Other)?
            .ok_or(DispatchError::NotFound(campaign_id))?;

        self.directory
            .list_outcomes(campaign_id)
            .await
            .map_err(DispatchError::Other)
    }
}
