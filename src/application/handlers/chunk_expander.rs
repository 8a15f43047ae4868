use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    application::services::dispatch_bus::DispatchBus,
    domain::{
        errors::DeliveryError,
        events::{ChunkJob, SendJob},
        models::DeliveryOutcome,
        repositories::{CampaignStore, RecipientDirectory},
    },
};

/// Chunk-lane consumer: expands one recipient-set slice into per-recipient
/// send jobs. Stateless and replayable; duplicates produced by at-least-once
/// redelivery are absorbed downstream by idempotent outcome recording.
pub struct ChunkExpandHandler {
    campaigns: Arc<dyn CampaignStore>,
    directory: Arc<dyn RecipientDirectory>,
    bus: Arc<dyn DispatchBus>,
    max_attempts: u32,
}

impl ChunkExpandHandler {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        directory: Arc<dyn RecipientDirectory>,
        bus: Arc<dyn DispatchBus>,
        max_attempts: u32,
    ) -> Self {
        Self {
            campaigns,
            directory,
            bus,
            max_attempts,
        }
    }

    pub async fn handle(&self, job: ChunkJob) -> Result<(), DeliveryError> {
        self.campaigns
            .get(job.campaign_id)
            .await
            .map_err(|err| DeliveryError::Transient(err.to_string()))?
            .ok_or_else(|| {
                DeliveryError::Validation(format!("campaign {} no longer exists", job.campaign_id))
            })?;

        let recipients = self
            .directory
            .get_many(&job.recipient_ids)
            .await
            .map_err(|err| DeliveryError::Transient(err.to_string()))?;

        // Recipients that left the directory between dispatch and expansion
        // still count toward the dispatch total, so settle them as failed
        // instead of letting the campaign hang.
        if recipients.len() != job.recipient_ids.len() {
            let resolved: Vec<Uuid> = recipients.iter().map(|r| r.id).collect();
            for missing in job.recipient_ids.iter().filter(|id| !resolved.contains(*id)) {
                warn!(campaign_id = %job.campaign_id, recipient_id = %missing, "recipient vanished before expansion");
                self.directory
                    .record_outcome(
                        job.campaign_id,
                        *missing,
                        DeliveryOutcome::Failed {
                            reason: "recipient no longer in directory".to_string(),
                            attempts: 0,
                        },
                    )
                    .await
                    .map_err(|err| DeliveryError::Transient(err.to_string()))?;
            }
            super::try_finalize(&*self.campaigns, &*self.directory, job.campaign_id)
                .await
                .map_err(|err| DeliveryError::Transient(err.to_string()))?;
        }

        let expanded = recipients.len();
        for recipient in recipients {
            self.bus
                .publish_send(SendJob {
                    job_id: Uuid::new_v4(),
                    campaign_id: job.campaign_id,
                    recipient_id: recipient.id,
                    chat_id: recipient.chat_id,
                    content: job.content.clone(),
                    attempt: 1,
                    max_attempts: self.max_attempts,
                })
                .await
                .map_err(|err| DeliveryError::Transient(err.to_string()))?;
        }

        info!(
            campaign_id = %job.campaign_id,
            chunk_job = %job.job_id,
            expanded,
            "expanded chunk into send jobs"
        );
        Ok(())
    }
}
