//! Outcome broadcast: where resolved approvals are announced.
//!
//! Two sinks, both best-effort and at-most-once:
//! - an in-process bus consumed by `GET /{org_id}/events`
//! - an optional NATS connection, subject `{org_id}/approvals/response`

use std::time::Duration;

use bytes::Bytes;
use deploygate_core::config::BroadcastConfig;
use deploygate_core::notify::outcome_topic;
use deploygate_core::{NotificationError, OutcomeEvent};
use serde::Serialize;

/// Capacity of the in-process outcome bus. Slow SSE subscribers lag and skip.
pub const OUTCOME_BUS_CAPACITY: usize = 64;

/// An outcome tagged with the org it belongs to, for subscriber filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrgOutcome {
    pub org_id: String,
    #[serde(flatten)]
    pub event: OutcomeEvent,
}

#[derive(Clone)]
pub struct NatsPublisher {
    client: async_nats::Client,
}

impl NatsPublisher {
    /// Connect when `nats_url` is configured. A configured broker that cannot
    /// be reached is a startup error.
    pub async fn connect(config: &BroadcastConfig) -> anyhow::Result<Option<Self>> {
        let Some(url) = config.nats_url.as_deref() else {
            return Ok(None);
        };
        tracing::info!("connecting to NATS at {url}");

        let mut options = async_nats::ConnectOptions::new()
            .name("deploygate")
            .connection_timeout(Duration::from_secs(5));
        if let (Some(user), Some(pass)) = (&config.nats_user, &config.nats_password) {
            options = options.user_and_password(user.clone(), pass.clone());
        }

        let client = options
            .connect(url)
            .await
            .map_err(|e| anyhow::anyhow!("failed to connect to NATS at {url}: {e}"))?;
        tracing::info!("connected to NATS at {url}");
        Ok(Some(Self { client }))
    }

    pub async fn publish(&self, org_id: &str, event: &OutcomeEvent) -> Result<(), NotificationError> {
        let payload = serde_json::to_vec(event)
            .map_err(|e| NotificationError::Broadcast(e.to_string()))?;
        self.client
            .publish(outcome_topic(org_id), Bytes::from(payload))
            .await
            .map_err(|e| NotificationError::Broadcast(format!("NATS publish failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_outcome_flattens_event() {
        let o = OrgOutcome {
            org_id: "org1".into(),
            event: OutcomeEvent {
                approved: false,
                approval_id: "abc".into(),
            },
        };
        let v = serde_json::to_value(&o).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"org_id": "org1", "approved": false, "approval_id": "abc"})
        );
    }

    #[tokio::test]
    async fn no_url_means_no_publisher() {
        let publisher = NatsPublisher::connect(&BroadcastConfig::default())
            .await
            .unwrap();
        assert!(publisher.is_none());
    }
}
