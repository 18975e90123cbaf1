//! Background decision listener.
//!
//! The interaction webhook acks immediately and hands each decoded button
//! click to this task over a bounded channel. The task applies the decision
//! and then replaces the reviewer prompt via the interaction's `response_url`.

use std::sync::Arc;

use deploygate_core::{ApprovalManager, Decision, GateError, Resolution};
use slack_notify::{ResponseMessage, SlackClient};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Capacity of the webhook → listener channel.
pub const DECISION_QUEUE_CAPACITY: usize = 32;

/// One reviewer click, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionEvent {
    pub org_id: String,
    pub approval_id: String,
    pub decision: Decision,
    /// Display name of whoever clicked, when the transport supplied one.
    pub user: Option<String>,
    pub response_url: Option<String>,
}

/// Spawn the listener. It exits when `shutdown` flips to `true` or every
/// sender is dropped. On shutdown the queue is closed and clicks already
/// queued are still applied before the task ends.
pub fn spawn_listener(
    manager: Arc<ApprovalManager>,
    slack: Option<SlackClient>,
    mut rx: mpsc::Receiver<DecisionEvent>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!("decision listener started");
        loop {
            let event = tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => break,
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            handle(&manager, slack.as_ref(), event).await;
        }

        rx.close();
        while let Some(event) = rx.recv().await {
            handle(&manager, slack.as_ref(), event).await;
        }
        tracing::debug!("decision listener stopped");
    })
}

async fn handle(manager: &ApprovalManager, slack: Option<&SlackClient>, event: DecisionEvent) {
    let result = manager.decide(&event.org_id, &event.approval_id, event.decision);
    if let Err(e) = &result {
        tracing::warn!(
            org_id = %event.org_id,
            approval_id = %event.approval_id,
            decision = %event.decision,
            error = %e,
            "reviewer decision not applied"
        );
    } else {
        tracing::info!(
            org_id = %event.org_id,
            approval_id = %event.approval_id,
            decision = %event.decision,
            user = event.user.as_deref().unwrap_or("unknown"),
            "reviewer decision received"
        );
    }

    let (Some(slack), Some(url)) = (slack, event.response_url.as_deref()) else {
        return;
    };
    let text = outcome_text(&result, event.user.as_deref());
    if let Err(e) = slack.respond(url, &ResponseMessage::replace(text)).await {
        tracing::warn!(approval_id = %event.approval_id, error = %e, "failed to update reviewer prompt");
    }
}

/// Text that replaces the reviewer prompt once a click has been handled.
pub fn outcome_text(result: &Result<Resolution, GateError>, user: Option<&str>) -> String {
    let by = user.map(|u| format!(" by {u}")).unwrap_or_default();
    match result {
        Ok(r) if !r.applied => format!("Approval already {}", r.approval.status),
        Ok(r) if r.approval.status == deploygate_core::ApprovalStatus::Approved => {
            format!("Deploy approved{by}")
        }
        Ok(_) => format!("Deploy rejected{by}"),
        Err(GateError::AlreadyResolved { current, .. }) => {
            format!("Approval already {current}")
        }
        Err(GateError::NotFound { .. }) => "Approval no longer exists".to_string(),
        Err(e) => format!("Could not record decision: {e}"),
    }
}

/// Resolves once `rx` holds `true`. A closed channel never resolves.
pub async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
