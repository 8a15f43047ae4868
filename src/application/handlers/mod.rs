pub mod chunk_expander;
pub mod delivery;

use tracing::info;
use uuid::Uuid;

use crate::domain::{
    errors::DispatchError,
    models::CampaignStatus,
    repositories::{CampaignStore, RecipientDirectory},
};

/// Eventual campaign status aggregation: once every recipient counted at
/// dispatch time has a recorded outcome, close the campaign out. The CAS
/// absorbs races between workers finishing the last few jobs at once.
pub(crate) async fn try_finalize(
    campaigns: &dyn CampaignStore,
    directory: &dyn RecipientDirectory,
    campaign_id: Uuid,
) -> anyhow::Result<()> {
    let Some(campaign) = campaigns.get(campaign_id).await? else {
        return Ok(());
    };
    if campaign.status != CampaignStatus::Sending || campaign.total_recipients == 0 {
        return Ok(());
    }

    let tally = directory.outcome_tally(campaign_id).await?;
    if tally.settled() < campaign.total_recipients {
        return Ok(());
    }

    let next = if tally.failed == 0 {
        CampaignStatus::Sent
    } else {
        CampaignStatus::Failed
    };

    match campaigns
        .transition(campaign_id, CampaignStatus::Sending, next)
        .await
    {
        Ok(()) => {
            info!(
                %campaign_id,
                delivered = tally.delivered,
                failed = tally.failed,
                status = next.as_str(),
                "campaign delivery finished"
            );
            Ok(())
        }
        // Another worker settled the campaign first.
        Err(DispatchError::Conflict(_)) | Err(DispatchError::NotFound(_)) => Ok(()),
        Err(DispatchError::Other(err)) => Err(err),
    }
}
