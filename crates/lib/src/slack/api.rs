//! Slack Web API client: permalink lookup, message posting, and opening modals.

use async_trait::async_trait;
use serde::Deserialize;

const SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("slack request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("slack api error: {0}")]
    Api(String),
}

/// The subset of the Slack Web API the relay calls. All calls are bearer-authenticated
/// with the bot token.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// chat.getPermalink. `Ok(None)` when Slack answers without a permalink.
    async fn permalink(&self, channel_id: &str, message_ts: &str)
        -> Result<Option<String>, SlackError>;

    /// chat.postMessage with link unfurling disabled.
    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), SlackError>;

    /// views.open. `Err(SlackError::Api)` carries Slack's `error` code when `ok` is false.
    async fn open_view(&self, trigger_id: &str, view: &serde_json::Value)
        -> Result<(), SlackError>;
}

#[derive(Debug, Deserialize)]
struct PermalinkResponse {
    #[serde(default)]
    permalink: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OkResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack Web API over reqwest.
#[derive(Clone)]
pub struct SlackClient {
    api_base: String,
    token: String,
    client: reqwest::Client,
}

impl SlackClient {
    pub fn new(client: reqwest::Client, token: String, api_base: Option<String>) -> Self {
        let api_base = api_base
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| SLACK_API_BASE.to_string());
        Self {
            api_base,
            token,
            client,
        }
    }

    async fn post_json(&self, method: &str, body: &serde_json::Value) -> Result<OkResponse, SlackError> {
        let url = format!("{}/{}", self.api_base, method);
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SlackError::Api(format!("{} failed: {} {}", method, status, body)));
        }
        Ok(res.json().await?)
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn permalink(
        &self,
        channel_id: &str,
        message_ts: &str,
    ) -> Result<Option<String>, SlackError> {
        let url = format!("{}/chat.getPermalink", self.api_base);
        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("channel", channel_id), ("message_ts", message_ts)])
            .send()
            .await?;
        let data: PermalinkResponse = res.json().await?;
        Ok(data.permalink.filter(|p| !p.is_empty()))
    }

    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), SlackError> {
        let body = serde_json::json!({
            "channel": channel_id,
            "text": text,
            "unfurl_links": false,
        });
        let data = self.post_json("chat.postMessage", &body).await?;
        if !data.ok {
            return Err(SlackError::Api(
                data.error.unwrap_or_else(|| "chat.postMessage returned ok: false".to_string()),
            ));
        }
        Ok(())
    }

    async fn open_view(&self, trigger_id: &str, view: &serde_json::Value) -> Result<(), SlackError> {
        let body = serde_json::json!({ "trigger_id": trigger_id, "view": view });
        let data = self.post_json("views.open", &body).await?;
        if !data.ok {
            return Err(SlackError::Api(
                data.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }
        Ok(())
    }
}

/// Permalink Slack would generate for a message: `<archive>/<channel>/p<ts without the dot>`.
pub fn fallback_permalink(archive_base: &str, channel_id: &str, message_ts: &str) -> String {
    format!(
        "{}/{}/p{}",
        archive_base.trim_end_matches('/'),
        channel_id,
        message_ts.replacen('.', "", 1)
    )
}
