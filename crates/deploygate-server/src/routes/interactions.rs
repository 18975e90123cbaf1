use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use deploygate_core::action;
use slack_notify::interaction::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use tokio::sync::mpsc::error::TrySendError;

use crate::decisions::DecisionEvent;
use crate::state::AppState;

/// POST /slack/interactions: Slack interactivity callback.
///
/// Verified requests are always acknowledged with 200 so Slack does not
/// retry; decoding and applying the decision happen off the request path.
pub async fn slack_interaction(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(secret) = app.signing_secret.as_deref() {
        let now = chrono::Utc::now().timestamp();
        if let Err(e) = interaction::verify_signature(
            secret,
            header_str(&headers, TIMESTAMP_HEADER),
            &body,
            header_str(&headers, SIGNATURE_HEADER),
            now,
        ) {
            tracing::warn!(error = %e, "rejected slack interaction");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let payload = match interaction::parse_form(&body) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable slack interaction");
            return StatusCode::OK;
        }
    };
    if !payload.is_block_actions() {
        tracing::debug!(kind = %payload.kind, "ignoring slack interaction");
        return StatusCode::OK;
    }

    let user = payload.user_name().map(str::to_string);
    for block_action in &payload.actions {
        let value = block_action.value.as_deref().unwrap_or("");
        let decoded = match action::decode(&block_action.action_id, value) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(action_id = %block_action.action_id, error = %e, "dropping undecodable action");
                continue;
            }
        };

        let event = DecisionEvent {
            org_id: decoded.target.org_id,
            approval_id: decoded.target.approval_id,
            decision: decoded.decision,
            user: user.clone(),
            response_url: payload.response_url.clone(),
        };
        match app.decision_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(ev)) => {
                tracing::warn!(approval_id = %ev.approval_id, "decision queue full, dropping click");
            }
            Err(TrySendError::Closed(ev)) => {
                tracing::warn!(approval_id = %ev.approval_id, "decision listener gone, dropping click");
            }
        }
    }
    StatusCode::OK
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
