use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{
    application::services::sender::MessageSender,
    domain::{errors::DeliveryError, models::BroadcastContent},
};

/// Bot API `sendMessage` adapter. Rate limits and server errors come back
/// as transient failures; a blocked bot or an invalid chat id is permanent.
pub struct TelegramSender {
    http: Client,
    base_url: String,
    token: String,
}

impl TelegramSender {
    pub fn new(token: String) -> Arc<dyn MessageSender> {
        Arc::new(Self {
            http: Client::builder()
                .user_agent("broadcast-engine/telegram")
                .build()
                .expect("failed to build telegram client"),
            base_url: "https://api.telegram.org".to_string(),
            token,
        }) as Arc<dyn MessageSender>
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }
}

#[async_trait]
impl MessageSender for TelegramSender {
    async fn send(&self, chat_id: i64, content: &BroadcastContent) -> Result<(), DeliveryError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": content.body,
        });
        if let Some(mode) = content.parse_mode {
            payload["parse_mode"] = json!(mode.as_str());
        }

        let response = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await
            .map_err(|err| DeliveryError::Transient(format!("telegram request failed: {err}")))?;

        let status = response.status();
        let body: TelegramResponse = response
            .json()
            .await
            .map_err(|err| DeliveryError::Transient(format!("telegram response unreadable: {err}")))?;

        if body.ok {
            return Ok(());
        }

        let description = body
            .description
            .unwrap_or_else(|| "unknown error".to_string());
        let code = body.error_code.unwrap_or_else(|| i32::from(status.as_u16()));

        match code {
            429 => {
                let retry_after = body
                    .parameters
                    .and_then(|p| p.retry_after)
                    .map(|secs| format!(" (retry after {secs}s)"))
                    .unwrap_or_default();
                Err(DeliveryError::Transient(format!(
                    "rate limited: {description}{retry_after}"
                )))
            }
            500..=599 => Err(DeliveryError::Transient(description)),
            // 403: bot blocked by the user; 400: chat not found / bad request.
            _ => Err(DeliveryError::Permanent(description)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
    #[serde(rename = "error_code")]
    error_code: Option<i32>,
    parameters: Option<TelegramResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct TelegramResponseParameters {
    #[serde(rename = "retry_after")]
    retry_after: Option<u64>,
}
