//! Side effects triggered by approval state changes.
//!
//! The lifecycle manager calls a [`Notifier`] after the store has committed a
//! change. Implementations must not block on delivery; whatever they return is
//! logged and otherwise ignored.

use crate::approval::{Approval, ApprovalStatus};
use crate::error::NotificationError;
use serde::{Deserialize, Serialize};

pub trait Notifier: Send + Sync {
    /// A new `pending` approval needs a reviewer.
    fn approval_requested(&self, approval: &Approval) -> Result<(), NotificationError>;

    /// An approval just became terminal.
    fn approval_resolved(&self, approval: &Approval) -> Result<(), NotificationError>;
}

/// Notifier that drops everything. Used when no reviewer channel is wired up
/// and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn approval_requested(&self, _approval: &Approval) -> Result<(), NotificationError> {
        Ok(())
    }

    fn approval_resolved(&self, _approval: &Approval) -> Result<(), NotificationError> {
        Ok(())
    }
}

/// Payload broadcast on the outcome channel when an approval resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub approved: bool,
    pub approval_id: String,
}

impl OutcomeEvent {
    /// `None` while the approval is still pending.
    pub fn from_approval(approval: &Approval) -> Option<Self> {
        match approval.status {
            ApprovalStatus::Pending => None,
            status => Some(Self {
                approved: status == ApprovalStatus::Approved,
                approval_id: approval.id.clone(),
            }),
        }
    }
}

/// Topic an org's outcome events are published on.
pub fn outcome_topic(org_id: &str) -> String {
    format!("{org_id}/approvals/response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_only_for_terminal() {
        let mut a = Approval::new("org1", "abc", None);
        assert!(OutcomeEvent::from_approval(&a).is_none());

        a.status = ApprovalStatus::Rejected;
        let ev = OutcomeEvent::from_approval(&a).unwrap();
        assert!(!ev.approved);
        assert_eq!(ev.approval_id, "abc");

        a.status = ApprovalStatus::Approved;
        assert!(OutcomeEvent::from_approval(&a).unwrap().approved);
    }

    #[test]
    fn outcome_payload_shape() {
        let ev = OutcomeEvent {
            approved: true,
            approval_id: "abc".into(),
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v, serde_json::json!({ "approved": true, "approval_id": "abc" }));
    }

    #[test]
    fn topic_is_org_scoped() {
        assert_eq!(outcome_topic("acme"), "acme/approvals/response");
    }
}
