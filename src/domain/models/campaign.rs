use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Sending,
    Sent,
    Failed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Scheduled => "scheduled",
            CampaignStatus::Sending => "sending",
            CampaignStatus::Sent => "sent",
            CampaignStatus::Failed => "failed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(CampaignStatus::Draft),
            "scheduled" => Some(CampaignStatus::Scheduled),
            "sending" => Some(CampaignStatus::Sending),
            "sent" => Some(CampaignStatus::Sent),
            "failed" => Some(CampaignStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    Html,
    Markdown,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Html => "HTML",
            ParseMode::Markdown => "MarkdownV2",
        }
    }
}

/// Message body frozen into queue jobs at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BroadcastContent {
    pub body: String,
    pub parse_mode: Option<ParseMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub title: String,
    pub content: BroadcastContent,
    pub status: CampaignStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Size of the recipient set resolved at dispatch time; zero until the
    /// campaign leaves Draft/Scheduled.
    pub total_recipients: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new_draft(title: String, content: BroadcastContent) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            status: CampaignStatus::Draft,
            scheduled_at: None,
            total_recipients: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_scheduled(
        title: String,
        content: BroadcastContent,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            status: CampaignStatus::Scheduled,
            scheduled_at: Some(scheduled_at),
            total_recipients: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
