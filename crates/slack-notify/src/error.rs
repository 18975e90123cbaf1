use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Slack answered `{"ok": false, "error": ...}`.
    #[error("Slack API error: {0}")]
    Api(String),

    #[error("Signature verification failed: {0}")]
    Signature(String),

    #[error("Failed to parse interaction payload: {0}")]
    Payload(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
