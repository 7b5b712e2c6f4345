pub mod poller;
pub mod update;

use crate::error::TelegramError;
use update::Update;

const API_BASE_URL: &str = "https://api.telegram.org";
/// Server-side hold on `getUpdates`, in seconds.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Thin Bot API client. Holds the token and a shared HTTP client; every
/// method is one `POST` to `https://api.telegram.org/bot<token>/<method>`.
pub struct TelegramApi {
    base_url: String,
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramApi {
    pub fn new(bot_token: String) -> Self {
        Self::with_base_url(API_BASE_URL, bot_token)
    }

    /// Point at a different API server, used by tests.
    pub fn with_base_url(base_url: impl Into<String>, bot_token: String) -> Self {
        Self {
            base_url: base_url.into(),
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.bot_token)
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        self.call("sendMessage", body).await?;
        Ok(())
    }

    pub async fn delete_message(
        &self,
        chat_id: i64,
        message_id: i64,
    ) -> Result<(), TelegramError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
        });
        self.call("deleteMessage", body).await?;
        Ok(())
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message", "edited_message"],
        });
        let value = self.call("getUpdates", body).await?;
        let updates = serde_json::from_value(value.get("result").cloned().unwrap_or_default())?;
        Ok(updates)
    }

    pub async fn set_webhook(&self, url: &str) -> Result<(), TelegramError> {
        let body = serde_json::json!({
            "url": url,
            "allowed_updates": ["message", "edited_message"],
        });
        self.call("setWebhook", body).await?;
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<(), TelegramError> {
        self.call("deleteWebhook", serde_json::json!({})).await?;
        Ok(())
    }

    async fn call(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, TelegramError> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
            return Err(TelegramError::Api {
                method: method.to_string(),
                status,
                body,
            });
        }

        Ok(resp.json().await?)
    }
}
