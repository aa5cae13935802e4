use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::Notifier;
use crate::config::Telegram;
use crate::error::NotifyError;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Posts reports to a Telegram chat through the Bot API
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(settings: &Telegram) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                settings.api_base.trim_end_matches('/'),
                settings.bot_token
            ),
            chat_id: settings.chat_id.clone(),
        })
    }

    /// Single delivery attempt
    pub async fn deliver(&self, message: &str) -> Result<(), NotifyError> {
        let payload = SendMessage { chat_id: &self.chat_id, text: message };
        let response = self.client.post(&self.endpoint).json(&payload).send().await?;
        let status = response.status();

        match response.json::<ApiResponse>().await {
            Ok(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Ok(ApiResponse { description: Some(description), .. }) => {
                Err(NotifyError::Rejected(description))
            }
            _ => Err(NotifyError::Status(status.as_u16())),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) {
        match self.deliver(message).await {
            Ok(()) => info!("Telegram notification sent: {}", message),
            Err(e) => error!("Failed to send Telegram notification: {}", e),
        }
    }
}
