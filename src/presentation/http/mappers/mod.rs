use crate::{
    application::usecases::dispatch_draft::DispatchSummary,
    domain::models::{Campaign, DeliveryOutcome, DeliveryRecord, Recipient},
    presentation::{
        http::responses::{CampaignDto, DeliveryRecordDto, DispatchSummaryDto, RecipientDto},
        models::DeliveryOutcomeKind,
    },
};

pub fn map_campaign(campaign: &Campaign) -> CampaignDto {
    CampaignDto {
        id: campaign.id,
        title: campaign.title.clone(),
        body: campaign.content.body.clone(),
        parse_mode: campaign.content.parse_mode.map(Into::into),
        status: campaign.status.into(),
        scheduled_at: campaign.scheduled_at.map(|at| at.to_rfc3339()),
        total_recipients: campaign.total_recipients,
        created_at: campaign.created_at.to_rfc3339(),
        updated_at: campaign.updated_at.to_rfc3339(),
    }
}

pub fn map_recipient(recipient: &Recipient) -> RecipientDto {
    RecipientDto {
        id: recipient.id,
        chat_id: recipient.chat_id,
        username: recipient.username.clone(),
        first_name: recipient.first_name.clone(),
        subscribed: recipient.subscribed,
        created_at: recipient.created_at.to_rfc3339(),
    }
}

pub fn map_summary(summary: &DispatchSummary) -> DispatchSummaryDto {
    DispatchSummaryDto {
        campaign_id: summary.campaign_id,
        dispatched: summary.dispatched,
        recipients: summary.recipients,
        chunks: summary.chunks,
    }
}

pub fn map_outcome(record: &DeliveryRecord) -> DeliveryRecordDto {
    let (reason, attempts) = match &record.outcome {
        DeliveryOutcome::Delivered { attempts } => (None, *attempts),
        DeliveryOutcome::Failed { reason, attempts } => (Some(reason.clone()), *attempts),
    };
    DeliveryRecordDto {
        recipient_id: record.recipient_id,
        outcome: DeliveryOutcomeKind::from(&record.outcome),
        reason,
        attempts,
        recorded_at: record.recorded_at.to_rfc3339(),
    }
}
