//! Approval records: the unit of work waiting on a human decision.
//!
//! An approval starts `pending` and moves exactly once to `approved` or
//! `rejected`. The transition rules live in [`crate::lifecycle`]; this module
//! only defines the data.

use crate::error::{GateError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ApprovalStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    #[serde(alias = "denied")]
    Rejected,
}

impl ApprovalStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApprovalStatus {
    type Err = GateError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" | "denied" => Ok(ApprovalStatus::Rejected),
            _ => Err(GateError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// What a reviewer asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// The terminal status this decision moves an approval into.
    pub fn target(self) -> ApprovalStatus {
        match self {
            Decision::Approve => ApprovalStatus::Approved,
            Decision::Reject => ApprovalStatus::Rejected,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Approve => f.write_str("approve"),
            Decision::Reject => f.write_str("reject"),
        }
    }
}

// ---------------------------------------------------------------------------
// Approval
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub id: String,
    pub org_id: String,
    pub status: ApprovalStatus,
    /// Prompt text shown to the reviewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Approval {
    /// A fresh `pending` approval.
    pub fn new(org_id: impl Into<String>, id: impl Into<String>, message: Option<String>) -> Self {
        Self {
            id: id.into(),
            org_id: org_id.into(),
            status: ApprovalStatus::Pending,
            message,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_approval_is_pending() {
        let a = Approval::new("org1", "abc", Some("deploy?".into()));
        assert_eq!(a.status, ApprovalStatus::Pending);
        assert!(!a.is_resolved());
        assert!(a.resolved_at.is_none());
    }

    #[test]
    fn status_parses_denied_as_rejected() {
        assert_eq!(
            "denied".parse::<ApprovalStatus>().unwrap(),
            ApprovalStatus::Rejected
        );
        let from_json: ApprovalStatus = serde_json::from_str("\"denied\"").unwrap();
        assert_eq!(from_json, ApprovalStatus::Rejected);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "maybe".parse::<ApprovalStatus>().unwrap_err();
        assert!(matches!(err, GateError::InvalidStatus(_)));
    }

    #[test]
    fn json_omits_absent_optionals() {
        let a = Approval::new("org1", "abc", None);
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["status"], "pending");
        assert_eq!(v["org_id"], "org1");
        assert!(v.get("message").is_none());
        assert!(v.get("resolved_at").is_none());
    }

    #[test]
    fn decision_targets() {
        assert_eq!(Decision::Approve.target(), ApprovalStatus::Approved);
        assert_eq!(Decision::Reject.target(), ApprovalStatus::Rejected);
        assert!(Decision::Reject.target().is_terminal());
    }
}
