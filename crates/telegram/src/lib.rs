//! Client for the Telegram Bot API.
//!
//! Only the send surfaces the pipeline needs: `sendMessage` for plain
//! text notices, `sendPhoto` for a single result, and `sendMediaGroup`
//! for a batch. Acknowledgements are
//! used solely to decide the recorded delivery outcome; delivery is
//! best effort and at-least-once, deduplicated downstream.

use std::time::Duration;

use serde::Deserialize;

/// HTTP request timeout for a single send call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Telegram caps `sendMediaGroup` at 10 items per call.
pub const MAX_MEDIA_GROUP_ITEMS: usize = 10;

/// Errors from the Bot API layer.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Telegram answered `ok: false`.
    #[error("Telegram API error: {description}")]
    Api {
        /// Telegram's error description.
        description: String,
    },

    /// More items than [`MAX_MEDIA_GROUP_ITEMS`] were passed.
    #[error("Media group of {count} items exceeds the limit of {MAX_MEDIA_GROUP_ITEMS}")]
    GroupTooLarge {
        /// Number of items requested.
        count: usize,
    },
}

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    description: Option<String>,
}

/// HTTP client for one bot token.
pub struct BotApi {
    client: reqwest::Client,
    base_url: String,
}

impl BotApi {
    /// Create a client for the given bot token.
    pub fn new(token: &str) -> Self {
        Self::with_base_url(token, "https://api.telegram.org")
    }

    /// Create a client against a non-default API server (test setups).
    pub fn with_base_url(token: &str, api_host: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{api_host}/bot{token}"),
        }
    }

    /// Send a plain text message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        self.call("sendMessage", &body).await
    }

    /// Send a single photo by URL, with an optional caption.
    pub async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: Option<&str>,
    ) -> Result<(), TelegramError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "photo": photo_url,
        });
        if let Some(caption) = caption {
            body["caption"] = serde_json::Value::String(caption.to_string());
        }
        self.call("sendPhoto", &body).await
    }

    /// Send up to [`MAX_MEDIA_GROUP_ITEMS`] photos as one media group.
    /// The caption, if any, is attached to the first item (Telegram
    /// renders it as the group caption).
    pub async fn send_media_group(
        &self,
        chat_id: i64,
        photo_urls: &[&str],
        caption: Option<&str>,
    ) -> Result<(), TelegramError> {
        if photo_urls.len() > MAX_MEDIA_GROUP_ITEMS {
            return Err(TelegramError::GroupTooLarge {
                count: photo_urls.len(),
            });
        }

        let media: Vec<serde_json::Value> = photo_urls
            .iter()
            .enumerate()
            .map(|(i, url)| {
                let mut item = serde_json::json!({
                    "type": "photo",
                    "media": url,
                });
                if i == 0 {
                    if let Some(caption) = caption {
                        item["caption"] = serde_json::Value::String(caption.to_string());
                    }
                }
                item
            })
            .collect();

        let body = serde_json::json!({
            "chat_id": chat_id,
            "media": media,
        });
        self.call("sendMediaGroup", &body).await
    }

    // ---- private helpers ----

    /// POST a method call and interpret the `ok` envelope.
    async fn call(&self, method: &str, body: &serde_json::Value) -> Result<(), TelegramError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await?;

        let envelope: ApiEnvelope = response.json().await?;
        if !envelope.ok {
            return Err(TelegramError::Api {
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        Ok(())
    }
}
