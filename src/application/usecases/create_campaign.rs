use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{
    models::{BroadcastContent, Campaign, ParseMode},
    repositories::CampaignStore,
};

pub struct CreateCampaignUseCase {
    campaigns: Arc<dyn CampaignStore>,
}

pub struct CreateCampaignRequest {
    pub title: String,
    pub body: String,
    pub parse_mode: Option<ParseMode>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl CreateCampaignUseCase {
    pub fn new(campaigns: Arc<dyn CampaignStore>) -> Self {
        Self { campaigns }
    }

    pub async fn execute(&self, request: CreateCampaignRequest) -> anyhow::Result<Campaign> {
        if request.body.trim().is_empty() {
            anyhow::bail!("campaign body must not be empty");
        }

        let content = BroadcastContent {
            body: request.body,
            parse_mode: request.parse_mode,
        };

        let campaign = match request.scheduled_at {
            Some(at) => Campaign::new_scheduled(request.title, content, at),
            None => Campaign::new_draft(request.title, content),
        };

        self.campaigns.insert(&campaign).await?;
        Ok(campaign)
    }
}
