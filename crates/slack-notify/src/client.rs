use std::time::Duration;

use crate::types::{ApiResponse, PostMessage, ResponseMessage};
use crate::{Result, SlackError};

/// Default request timeout for Web API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin async client for the Slack Web API, authenticated with a bot token.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl SlackClient {
    /// `api_base` is normally `https://slack.com/api`; tests point it at a
    /// local mock.
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            http,
            token: token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// `chat.postMessage`. Returns the API response (channel id and message
    /// timestamp on success).
    pub async fn post_message(&self, message: &PostMessage) -> Result<ApiResponse> {
        let url = format!("{}/chat.postMessage", self.api_base);
        let resp: ApiResponse = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(message)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !resp.ok {
            return Err(SlackError::Api(
                resp.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }
        tracing::debug!(channel = %message.channel, ts = ?resp.ts, "posted slack message");
        Ok(resp)
    }

    /// Post to an interaction's `response_url`. Those URLs are pre-authorized
    /// and answer with plain text, so no token and no JSON decoding.
    pub async fn respond(&self, response_url: &str, message: &ResponseMessage) -> Result<()> {
        self.http
            .post(response_url)
            .json(message)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
