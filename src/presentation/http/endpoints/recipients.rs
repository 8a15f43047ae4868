use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, param::Path, payload::Json};

use crate::{
    application::usecases::{
        notify_recipient::NotifyRecipientRequest, register_recipient::RegisterRecipientRequest,
    },
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::map_recipient,
        requests::{NotifyRecipientRequestDto, RegisterRecipientRequestDto},
        responses::{NotifyResponseDto, RecipientDto},
    },
};

#[derive(Clone)]
pub struct RecipientsEndpoints {
    state: Arc<ApiState>,
}

impl RecipientsEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl RecipientsEndpoints {
    /// First-contact registration, called by the bot front-end. Safe to
    /// repeat for the same chat id.
    #[oai(
        path = "/recipients",
        method = "post",
        tag = EndpointsTags::Recipients,
    )]
    pub async fn register_recipient(
        &self,
        request: Json<RegisterRecipientRequestDto>,
    ) -> PoemResult<Json<RecipientDto>> {
        let payload = RegisterRecipientRequest {
            chat_id: request.chat_id,
            username: request.username.clone(),
            first_name: request.first_name.clone(),
        };

        let recipient = self
            .state
            .register_recipient_usecase
            .execute(payload)
            .await
            .map_err(internal_error)?;

        Ok(Json(map_recipient(&recipient)))
    }

    #[oai(
        path = "/recipients",
        method = "get",
        tag = EndpointsTags::Recipients,
    )]
    pub async fn list_recipients(&self) -> PoemResult<Json<Vec<RecipientDto>>> {
        let recipients = self
            .state
            .list_recipients_usecase
            .execute()
            .await
            .map_err(internal_error)?;

        Ok(Json(recipients.iter().map(map_recipient).collect()))
    }

    /// One-off transactional message (order notifications), sent directly
    /// through the messaging adapter.
    #[oai(
        path = "/recipients/:recipient_id/notify",
        method = "post",
        tag = EndpointsTags::Recipients,
    )]
    pub async fn notify_recipient(
        &self,
        recipient_id: Path<uuid::Uuid>,
        request: Json<NotifyRecipientRequestDto>,
    ) -> PoemResult<Json<NotifyResponseDto>> {
        let payload = NotifyRecipientRequest {
            recipient_id: recipient_id.0,
            body: request.body.clone(),
            parse_mode: request.parse_mode.map(Into::into),
        };

        self.state
            .notify_recipient_usecase
            .execute(payload)
            .await
            .map_err(|e| {
                if e.to_string().contains("not found") {
                    poem::Error::from_string(
                        "recipient not found",
                        poem::http::StatusCode::NOT_FOUND,
                    )
                } else {
                    internal_error(e)
                }
            })?;

        Ok(Json(NotifyResponseDto { success: true }))
    }
}

fn internal_error(err: impl std::fmt::Display) -> poem::Error {
    poem::Error::from_string(
        err.to_string(),
        poem::http::StatusCode::INTERNAL_SERVER_ERROR,
    )
}
