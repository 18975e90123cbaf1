//! Encoding of reviewer actions carried by the chat transport.
//!
//! Each button carries an action id naming the intent (`approve` / `deny`)
//! and a value holding a JSON [`ActionRef`]. Ids are never packed into a
//! delimited string, so any character is allowed in org and approval ids.

use crate::approval::Decision;
use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};

pub const APPROVE_ACTION_ID: &str = "approve";
pub const DENY_ACTION_ID: &str = "deny";

/// Which approval a button refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRef {
    pub org_id: String,
    pub approval_id: String,
}

/// A decoded reviewer action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerAction {
    pub target: ActionRef,
    pub decision: Decision,
}

pub fn action_id(decision: Decision) -> &'static str {
    match decision {
        Decision::Approve => APPROVE_ACTION_ID,
        Decision::Reject => DENY_ACTION_ID,
    }
}

/// Serialize the button value for `org_id` / `approval_id`.
pub fn encode_value(org_id: &str, approval_id: &str) -> Result<String> {
    Ok(serde_json::to_string(&ActionRef {
        org_id: org_id.to_string(),
        approval_id: approval_id.to_string(),
    })?)
}

/// Decode an action id plus button value back into a decision.
pub fn decode(action_id: &str, value: &str) -> Result<ReviewerAction> {
    let decision = match action_id {
        APPROVE_ACTION_ID => Decision::Approve,
        DENY_ACTION_ID | "reject" => Decision::Reject,
        other => {
            return Err(GateError::InvalidAction(format!(
                "unknown action id '{other}'"
            )))
        }
    };
    let target: ActionRef = serde_json::from_str(value)
        .map_err(|e| GateError::InvalidAction(format!("bad action value: {e}")))?;
    if target.org_id.is_empty() || target.approval_id.is_empty() {
        return Err(GateError::InvalidAction(
            "action value is missing org_id or approval_id".into(),
        ));
    }
    Ok(ReviewerAction { target, decision })
}
