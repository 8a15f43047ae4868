use chrono::{DateTime, Utc};
use poem_openapi::Object;
use uuid::Uuid;

use crate::presentation::models::ParseModeKind;

#[derive(Object, Debug)]
pub struct CreateCampaignRequestDto {
    #[oai(validator(min_length = 1, max_length = 256))]
    pub title: String,
    #[oai(validator(min_length = 1, max_length = 4096))]
    pub body: String,
    pub parse_mode: Option<ParseModeKind>,
    /// When set, the campaign is created in Scheduled status and waits for
    /// the scheduled-dispatch trigger.
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Object, Debug)]
pub struct DispatchScheduledRequestDto {
    pub recipient_ids: Vec<Uuid>,
}

#[derive(Object, Debug)]
pub struct RegisterRecipientRequestDto {
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Object, Debug)]
pub struct NotifyRecipientRequestDto {
    #[oai(validator(min_length = 1, max_length = 4096))]
    pub body: String,
    pub parse_mode: Option<ParseModeKind>,
}
