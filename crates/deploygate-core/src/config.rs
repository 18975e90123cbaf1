use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "deploygate.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ReviewerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerConfig {
    /// Chat channel the approve/deny prompt is posted to.
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Header text of the prompt (Slack mrkdwn).
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_channel() -> String {
    "#test".to_string()
}

fn default_prompt() -> String {
    "*This service is about to deploy. You have 5 minutes to stop deploy if you do not want it.*"
        .to_string()
}

impl Default for ReviewerConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            prompt: default_prompt(),
        }
    }
}

// ---------------------------------------------------------------------------
// SlackConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    /// Used to verify interaction callbacks. Unset disables verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    "https://slack.com/api".to_string()
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            signing_secret: None,
            api_base: default_api_base(),
        }
    }
}

// ---------------------------------------------------------------------------
// BroadcastConfig
// ---------------------------------------------------------------------------

/// Optional NATS outcome broadcast. Absent `nats_url` disables it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BroadcastConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nats_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nats_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nats_password: Option<String>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default)]
    pub reviewer: ReviewerConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            reviewer: ReviewerConfig::default(),
            slack: SlackConfig::default(),
            broadcast: BroadcastConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load `explicit` if given, else `./deploygate.yaml` if present, else
    /// defaults.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        match config_path(explicit, cwd) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("listen address '{}' is not host:port", self.listen),
            });
        }

        match (&self.slack.bot_token, &self.slack.signing_secret) {
            (None, _) => warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "slack.bot_token not set: reviewers will not be prompted".into(),
            }),
            (Some(_), None) => warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "slack.signing_secret not set: interaction callbacks are not verified"
                    .into(),
            }),
            _ => {}
        }

        if self.reviewer.channel.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "reviewer.channel is empty".into(),
            });
        }

        if self.broadcast.nats_url.is_some()
            && self.broadcast.nats_user.is_some() != self.broadcast.nats_password.is_some()
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "broadcast.nats_user and nats_password must be set together".into(),
            });
        }

        warnings
    }
}

/// The file [`Config::discover`] would read: `explicit` if given, else
/// `deploygate.yaml` in `cwd` when it exists.
pub fn config_path(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    let candidate = cwd.join(DEFAULT_CONFIG_FILE);
    candidate.is_file().then_some(candidate)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
