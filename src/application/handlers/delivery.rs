use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    application::services::sender::MessageSender,
    domain::{
        errors::DeliveryError,
        events::SendJob,
        models::DeliveryOutcome,
        repositories::{CampaignStore, RecipientDirectory},
    },
};

/// Send-lane consumer: one delivery attempt per job. Returns
/// `DeliveryError::Transient` only when the worker should schedule a retry;
/// every other path settles the recipient's outcome here.
pub struct DeliveryHandler {
    campaigns: Arc<dyn CampaignStore>,
    directory: Arc<dyn RecipientDirectory>,
    sender: Arc<dyn MessageSender>,
}

impl DeliveryHandler {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        directory: Arc<dyn RecipientDirectory>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            campaigns,
            directory,
            sender,
        }
    }

    pub async fn handle(&self, job: SendJob) -> Result<(), DeliveryError> {
        match self.sender.send(job.chat_id, &job.content).await {
            Ok(()) => {
                self.settle(
                    &job,
                    DeliveryOutcome::Delivered {
                        attempts: job.attempt,
                    },
                )
                .await?;
                info!(
                    campaign_id = %job.campaign_id,
                    recipient_id = %job.recipient_id,
                    attempt = job.attempt,
                    "delivered"
                );
                Ok(())
            }
            Err(DeliveryError::Permanent(reason)) => {
                warn!(
                    campaign_id = %job.campaign_id,
                    recipient_id = %job.recipient_id,
                    attempt = job.attempt,
                    %reason,
                    "permanent delivery failure"
                );
                self.settle(
                    &job,
                    DeliveryOutcome::Failed {
                        reason: reason.clone(),
                        attempts: job.attempt,
                    },
                )
                .await?;
                Err(DeliveryError::Permanent(reason))
            }
            Err(DeliveryError::Transient(reason)) => {
                if job.attempts_left() {
                    return Err(DeliveryError::Transient(reason));
                }
                let reason = format!("retries exhausted: {reason}");
                warn!(
                    campaign_id = %job.campaign_id,
                    recipient_id = %job.recipient_id,
                    attempt = job.attempt,
                    %reason,
                    "giving up on recipient"
                );
                self.settle(
                    &job,
                    DeliveryOutcome::Failed {
                        reason: reason.clone(),
                        attempts: job.attempt,
                    },
                )
                .await?;
                Err(DeliveryError::Permanent(reason))
            }
            Err(err @ DeliveryError::Validation(_)) => Err(err),
        }
    }

    async fn settle(&self, job: &SendJob, outcome: DeliveryOutcome) -> Result<(), DeliveryError> {
        self.directory
            .record_outcome(job.campaign_id, job.recipient_id, outcome)
            .await
            .map_err(|err| DeliveryError::Transient(err.to_string()))?;
        super::try_finalize(&*self.campaigns, &*self.directory, job.campaign_id)
            .await
            .map_err(|err| DeliveryError::Transient(err.to_string()))
    }
}
