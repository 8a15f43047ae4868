use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, param::Path, payload::Json};

use crate::{
    application::usecases::create_campaign::CreateCampaignRequest,
    domain::errors::DispatchError,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::{map_campaign, map_outcome, map_summary},
        requests::{CreateCampaignRequestDto, DispatchScheduledRequestDto},
        responses::{
            CampaignDto, CampaignProgressDto, DeliveryRecordDto, DispatchSummaryDto,
            ScheduledDispatchResponseDto,
        },
    },
};

#[derive(Clone)]
pub struct CampaignsEndpoints {
    state: Arc<ApiState>,
}

impl CampaignsEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl CampaignsEndpoints {
    #[oai(
        path = "/campaigns",
        method = "post",
        tag = EndpointsTags::Campaigns,
    )]
    pub async fn create_campaign(
        &self,
        request: Json<CreateCampaignRequestDto>,
    ) -> PoemResult<Json<CampaignDto>> {
        let payload = CreateCampaignRequest {
            title: request.title.clone(),
            body: request.body.clone(),
            parse_mode: request.parse_mode.map(Into::into),
            scheduled_at: request.scheduled_at,
        };

        let campaign = self
            .state
            .create_campaign_usecase
            .execute(payload)
            .await
            .map_err(internal_error)?;

        Ok(Json(map_campaign(&campaign)))
    }

    #[oai(
        path = "/campaigns/:campaign_id",
        method = "get",
        tag = EndpointsTags::Campaigns,
    )]
    pub async fn get_campaign(
        &self,
        campaign_id: Path<uuid::Uuid>,
    ) -> PoemResult<Json<CampaignProgressDto>> {
        let progress = self
            .state
            .campaign_progress_usecase
            .execute(campaign_id.0)
            .await
            .map_err(dispatch_error)?;

        Ok(Json(CampaignProgressDto {
            campaign: map_campaign(&progress.campaign),
            delivered: progress.tally.delivered,
            failed: progress.tally.failed,
        }))
    }

    #[oai(
        path = "/campaigns/:campaign_id/outcomes",
        method = "get",
        tag = EndpointsTags::Campaigns,
    )]
    pub async fn list_outcomes(
        &self,
        campaign_id: Path<uuid::Uuid>,
    ) -> PoemResult<Json<Vec<DeliveryRecordDto>>> {
        let outcomes = self
            .state
            .campaign_progress_usecase
            .outcomes(campaign_id.0)
            .await
            .map_err(dispatch_error)?;

        Ok(Json(outcomes.iter().map(map_outcome).collect()))
    }

    /// Immediate trigger: fan a Draft campaign out to every eligible
    /// recipient in the directory.
    #[oai(
        path = "/campaigns/:campaign_id/dispatch",
        method = "post",
        tag = EndpointsTags::Campaigns,
    )]
    pub async fn dispatch_campaign(
        &self,
        campaign_id: Path<uuid::Uuid>,
    ) -> PoemResult<Json<DispatchSummaryDto>> {
        let summary = self
            .state
            .dispatch_draft_usecase
            .execute(campaign_id.0)
            .await
            .map_err(dispatch_error)?;

        Ok(Json(map_summary(&summary)))
    }

    /// Scheduled trigger: fan every due Scheduled campaign out to the
    /// selected recipients.
    #[oai(
        path = "/campaigns/dispatch-due",
        method = "post",
        tag = EndpointsTags::Campaigns,
    )]
    pub async fn dispatch_due(
        &self,
        request: Json<DispatchScheduledRequestDto>,
    ) -> PoemResult<Json<ScheduledDispatchResponseDto>> {
        let summary = self
            .state
            .dispatch_scheduled_usecase
            .execute(&request.recipient_ids)
            .await
            .map_err(dispatch_error)?;

        Ok(Json(ScheduledDispatchResponseDto {
            processed: summary.processed.iter().map(map_summary).collect(),
            skipped: summary.skipped,
        }))
    }
}

fn dispatch_error(err: DispatchError) -> poem::Error {
    match err {
        DispatchError::NotFound(_) => {
            poem::Error::from_string("campaign not found", poem::http::StatusCode::NOT_FOUND)
        }
        // Conflicts are swallowed by the use cases; anything else is ours.
        other => internal_error(other),
    }
}

fn internal_error(err: impl std::fmt::Display) -> poem::Error {
    poem::Error::from_string(
        err.to_string(),
        poem::http::StatusCode::INTERNAL_SERVER_ERROR,
    )
}
