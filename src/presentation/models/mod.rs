use poem_openapi::Enum;

use crate::domain::models::{CampaignStatus, DeliveryOutcome, ParseMode};

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum CampaignStatusDto {
    Draft,
    Scheduled,
    Sending,
    Sent,
    Failed,
}

impl From<CampaignStatus> for CampaignStatusDto {
    fn from(value: CampaignStatus) -> Self {
        match value {
            CampaignStatus::Draft => CampaignStatusDto::Draft,
            CampaignStatus::Scheduled => CampaignStatusDto::Scheduled,
            CampaignStatus::Sending => CampaignStatusDto::Sending,
            CampaignStatus::Sent => CampaignStatusDto::Sent,
            CampaignStatus::Failed => CampaignStatusDto::Failed,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ParseModeKind {
    #[oai(rename = "html")]
    Html,
    #[oai(rename = "markdown")]
    Markdown,
}

impl From<ParseModeKind> for ParseMode {
    fn from(value: ParseModeKind) -> Self {
        match value {
            ParseModeKind::Html => ParseMode::Html,
            ParseModeKind::Markdown => ParseMode::Markdown,
        }
    }
}

impl From<ParseMode> for ParseModeKind {
    fn from(value: ParseMode) -> Self {
        match value {
            ParseMode::Html => ParseModeKind::Html,
            ParseMode::Markdown => ParseModeKind::Markdown,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum DeliveryOutcomeKind {
    #[oai(rename = "delivered")]
    Delivered,
    #[oai(rename = "failed")]
    Failed,
}

impl From<&DeliveryOutcome> for DeliveryOutcomeKind {
    fn from(value: &DeliveryOutcome) -> Self {
        match value {
            DeliveryOutcome::Delivered { .. } => DeliveryOutcomeKind::Delivered,
            DeliveryOutcome::Failed { .. } => DeliveryOutcomeKind::Failed,
        }
    }
}
