//! Telegram Bot API notifier.
//!
//! Sends Markdown messages through
//! [`sendMessage`](https://core.telegram.org/bots/api#sendmessage).
//! Errors are reported without the request URL, which embeds the bot token.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::Result;
use crate::error::RsiwatchError;
use crate::notifier::Notifier;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Delivers notifications to Telegram chats; subscriber ids are chat ids.
pub struct TelegramNotifier {
    client: reqwest::Client,
    token: Zeroizing<String>,
    api_base: String,
}

impl TelegramNotifier {
    /// Creates a notifier for the public Bot API.
    ///
    /// # Errors
    ///
    /// Returns [`RsiwatchError::Http`] if the HTTP client cannot be built.
    pub fn new(token: Zeroizing<String>) -> Result<Self> {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Creates a notifier against a custom Bot API server.
    ///
    /// # Errors
    ///
    /// Returns [`RsiwatchError::Http`] if the HTTP client cannot be built.
    pub fn with_api_base(token: Zeroizing<String>, api_base: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            token,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, subscriber_id: &str, text: &str) -> Result<()> {
        let url = Zeroizing::new(format!(
            "{}/bot{}/sendMessage",
            self.api_base,
            self.token.as_str()
        ));
        let request = SendMessageRequest {
            chat_id: subscriber_id,
            text,
            parse_mode: "Markdown",
        };

        let response = self
            .client
            .post(url.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| RsiwatchError::Delivery(e.without_url().to_string()))?;

        let body: SendMessageResponse = response
            .json()
            .await
            .map_err(|e| RsiwatchError::Delivery(e.without_url().to_string()))?;

        if !body.ok {
            return Err(RsiwatchError::Delivery(
                body.description
                    .unwrap_or_else(|| "sendMessage returned ok=false".to_string()),
            ));
        }

        debug!(subscriber = subscriber_id, "delivered telegram message");
        Ok(())
    }
}
