//! Async [`Notifier`] implementation.
//!
//! The lifecycle manager calls in synchronously while holding no locks; every
//! network side effect is spawned onto the runtime and its failure is only
//! logged.

use deploygate_core::action::{self, action_id};
use deploygate_core::config::ReviewerConfig;
use deploygate_core::{Approval, Decision, NotificationError, Notifier, OutcomeEvent};
use slack_notify::{Block, Button, ButtonStyle, PostMessage, SlackClient, Text};
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::broadcast::{NatsPublisher, OrgOutcome};

pub struct Dispatcher {
    outcomes: broadcast::Sender<OrgOutcome>,
    slack: Option<SlackClient>,
    reviewer: ReviewerConfig,
    nats: Option<NatsPublisher>,
    runtime: Option<Handle>,
}

impl Dispatcher {
    /// Outcome bus only. Captures the current runtime handle if there is one.
    pub fn new(outcomes: broadcast::Sender<OrgOutcome>) -> Self {
        Self {
            outcomes,
            slack: None,
            reviewer: ReviewerConfig::default(),
            nats: None,
            runtime: Handle::try_current().ok(),
        }
    }

    pub fn with_slack(mut self, slack: SlackClient, reviewer: ReviewerConfig) -> Self {
        self.slack = Some(slack);
        self.reviewer = reviewer;
        self
    }

    pub fn with_nats(mut self, nats: NatsPublisher) -> Self {
        self.nats = Some(nats);
        self
    }

    fn runtime(&self) -> Result<&Handle, NotificationError> {
        self.runtime.as_ref().ok_or(NotificationError::NoRuntime)
    }
}

impl Notifier for Dispatcher {
    fn approval_requested(&self, approval: &Approval) -> Result<(), NotificationError> {
        let Some(slack) = self.slack.clone() else {
            tracing::debug!(approval_id = %approval.id, "no reviewer channel configured");
            return Ok(());
        };
        let message = prompt_message(&self.reviewer, approval)?;
        let approval_id = approval.id.clone();

        self.runtime()?.spawn(async move {
            if let Err(e) = slack.post_message(&message).await {
                tracing::warn!(%approval_id, error = %e, "failed to post reviewer prompt");
            }
        });
        Ok(())
    }

    fn approval_resolved(&self, approval: &Approval) -> Result<(), NotificationError> {
        let Some(event) = OutcomeEvent::from_approval(approval) else {
            return Ok(());
        };

        let outcome = OrgOutcome {
            org_id: approval.org_id.clone(),
            event: event.clone(),
        };
        if self.outcomes.send(outcome).is_err() {
            tracing::debug!(approval_id = %approval.id, "no outcome subscribers");
        }

        if let Some(nats) = self.nats.clone() {
            let org_id = approval.org_id.clone();
            self.runtime()?.spawn(async move {
                if let Err(e) = nats.publish(&org_id, &event).await {
                    tracing::warn!(approval_id = %event.approval_id, error = %e, "outcome publish failed");
                }
            });
        }
        Ok(())
    }
}

/// Build the approve/deny prompt for `approval`.
pub fn prompt_message(
    reviewer: &ReviewerConfig,
    approval: &Approval,
) -> Result<PostMessage, NotificationError> {
    let value = action::encode_value(&approval.org_id, &approval.id)
        .map_err(|e| NotificationError::Reviewer(e.to_string()))?;

    let mut blocks = vec![Block::Section {
        text: Text::mrkdwn(&reviewer.prompt),
    }];
    if let Some(message) = &approval.message {
        blocks.push(Block::Section {
            text: Text::mrkdwn(message),
        });
    }
    blocks.push(Block::Actions {
        elements: vec![
            Button::new("Approve", action_id(Decision::Approve), value.clone())
                .style(ButtonStyle::Primary),
            Button::new("Deny", action_id(Decision::Reject), value).style(ButtonStyle::Danger),
        ],
    });

    let text = match &approval.message {
        Some(m) => format!("Approval requested for {}: {m}", approval.org_id),
        None => format!("Approval requested for {}", approval.org_id),
    };

    Ok(PostMessage {
        channel: reviewer.channel.clone(),
        text,
        blocks,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
