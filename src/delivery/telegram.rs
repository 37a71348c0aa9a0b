use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app::{PricetapError, Result};
use crate::delivery::{Deliver, Destination};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends messages through the Telegram Bot API `sendMessage` method.
pub struct TelegramSink {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramSink {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("pricetap/0.1.0")
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Read the bot token from the environment variable `var`.
    pub fn from_env(var: &str, api_base: impl Into<String>) -> Result<Self> {
        let token = std::env::var(var)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| PricetapError::Delivery(format!("{} is not set", var)))?;
        Self::new(token, api_base)
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait]
impl Deliver for TelegramSink {
    async fn deliver(&self, destination: &Destination, text: &str) -> Result<()> {
        let Destination::Chat(chat_id) = *destination else {
            return Err(PricetapError::Delivery(format!(
                "Telegram sink cannot reach {}",
                destination
            )));
        };

        let response: ApiResponse = self
            .client
            .post(self.endpoint())
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            .map_err(|e| e.without_url())?
            .json()
            .await
            .map_err(|e| e.without_url())?;

        if response.ok {
            Ok(())
        } else {
            Err(PricetapError::Delivery(
                response
                    .description
                    .unwrap_or_else(|| "Telegram rejected the message".to_string()),
            ))
        }
    }
}
