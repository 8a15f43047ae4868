use poem_openapi::Object;
use uuid::Uuid;

use crate::presentation::models::{CampaignStatusDto, DeliveryOutcomeKind, ParseModeKind};

#[derive(Object)]
pub struct CampaignDto {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub parse_mode: Option<ParseModeKind>,
    pub status: CampaignStatusDto,
    pub scheduled_at: Option<String>,
    pub total_recipients: u32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Object)]
pub struct CampaignProgressDto {
    pub campaign: CampaignDto,
    pub delivered: u32,
    pub failed: u32,
}

#[derive(Object)]
pub struct DispatchSummaryDto {
    pub campaign_id: Uuid,
    /// False when the campaign was already past the expected status and the
    /// trigger was a no-op.
    pub dispatched: bool,
    pub recipients: u32,
    pub chunks: u32,
}

#[derive(Object)]
pub struct ScheduledDispatchResponseDto {
    pub processed: Vec<DispatchSummaryDto>,
    pub skipped: u32,
}

#[derive(Object)]
pub struct RecipientDto {
    pub id: Uuid,
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub subscribed: bool,
    pub created_at: String,
}

#[derive(Object)]
pub struct NotifyResponseDto {
    pub success: bool,
}

#[derive(Object)]
pub struct DeliveryRecordDto {
    pub recipient_id: Uuid,
    pub outcome: DeliveryOutcomeKind,
    pub reason: Option<String>,
    pub attempts: u32,
    pub recorded_at: String,
}
