use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use deploygate_core::{Decision, Resolution};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// POST /{org_id}/approvals: create a pending approval and prompt a reviewer.
///
/// An empty body is the same as `{}`.
pub async fn create_approval(
    State(app): State<AppState>,
    Path(org_id): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let body: CreateBody = if body.iter().all(u8::is_ascii_whitespace) {
        CreateBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::bad_request(format!("invalid request body: {e}")))?
    };
    let message = body.message.filter(|m| !m.trim().is_empty());

    let approval = app.manager.create(&org_id, message)?;
    Ok(Json(serde_json::json!({ "id": approval.id })))
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /{org_id}/approvals: every approval in the org, oldest first.
pub async fn list_approvals(
    State(app): State<AppState>,
    Path(org_id): Path<String>,
) -> Json<serde_json::Value> {
    let mut approvals = app.manager.list_approvals(&org_id);
    approvals.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Json(serde_json::json!({ "approvals": approvals }))
}

/// GET /{org_id}/approvals/{approval_id}
pub async fn get_approval(
    State(app): State<AppState>,
    Path((org_id, approval_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let approval = app.manager.get_approval(&org_id, &approval_id)?;
    Ok(Json(serde_json::json!({ "approval": approval })))
}

// ---------------------------------------------------------------------------
// Decide
// ---------------------------------------------------------------------------

/// POST /{org_id}/approvals/{approval_id}/approve
pub async fn approve(
    State(app): State<AppState>,
    Path((org_id, approval_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let resolution = app.manager.approve(&org_id, &approval_id)?;
    Ok(decision_ack(Decision::Approve, resolution))
}

/// POST /{org_id}/approvals/{approval_id}/reject
pub async fn reject(
    State(app): State<AppState>,
    Path((org_id, approval_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let resolution = app.manager.reject(&org_id, &approval_id)?;
    Ok(decision_ack(Decision::Reject, resolution))
}

fn decision_ack(decision: Decision, resolution: Resolution) -> Json<serde_json::Value> {
    let message = match decision {
        Decision::Approve => "Approval received",
        Decision::Reject => "Rejection received",
    };
    Json(serde_json::json!({
        "message": message,
        "approval": resolution.approval,
    }))
}
