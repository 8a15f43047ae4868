use std::sync::Arc;

use poem_openapi::Tags;

use crate::application::usecases::{
    campaign_progress::CampaignProgressUseCase, create_campaign::CreateCampaignUseCase,
    dispatch_draft::DispatchDraftUseCase, dispatch_scheduled::DispatchScheduledUseCase,
    list_recipients::ListRecipientsUseCase, notify_recipient::NotifyRecipientUseCase,
    register_recipient::RegisterRecipientUseCase,
};

#[derive(Clone)]
pub struct ApiState {
    pub create_campaign_usecase: Arc<CreateCampaignUseCase>,
    pub campaign_progress_usecase: Arc<CampaignProgressUseCase>,
    pub dispatch_draft_usecase: Arc<DispatchDraftUseCase>,
    pub dispatch_scheduled_usecase: Arc<DispatchScheduledUseCase>,
    pub register_recipient_usecase: Arc<RegisterRecipientUseCase>,
    pub list_recipients_usecase: Arc<ListRecipientsUseCase>,
    pub notify_recipient_usecase: Arc<NotifyRecipientUseCase>,
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Campaigns,
    Recipients,
}

pub struct Endpoints;
