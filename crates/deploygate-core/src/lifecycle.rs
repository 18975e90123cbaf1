//! Approval lifecycle: the only writer of approval state.
//!
//! ```text
//! pending ──approve──▶ approved
//!    │
//!    └────reject────▶ rejected
//! ```
//!
//! A repeat of the decision that already happened is a no-op; the opposite
//! decision is refused with [`GateError::AlreadyResolved`]. Notifications run
//! after the store commits and can never undo a transition.

use crate::approval::{Approval, Decision};
use crate::error::{GateError, Result};
use crate::notify::{NoopNotifier, Notifier};
use crate::store::ApprovalStore;
pub use crate::store::Resolution;
use std::sync::Arc;

pub struct ApprovalManager {
    store: ApprovalStore,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for ApprovalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalManager")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Default for ApprovalManager {
    fn default() -> Self {
        Self::new(Arc::new(NoopNotifier))
    }
}

impl ApprovalManager {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store: ApprovalStore::new(),
            notifier,
        }
    }

    /// Create an approval with a freshly generated id.
    pub fn create(&self, org_id: &str, message: Option<String>) -> Result<Approval> {
        let id = uuid::Uuid::new_v4().to_string();
        self.request_approval(org_id, &id, message)
    }

    /// Store a new `pending` approval and ask a reviewer about it.
    pub fn request_approval(
        &self,
        org_id: &str,
        id: &str,
        message: Option<String>,
    ) -> Result<Approval> {
        let approval = self.store.create(Approval::new(org_id, id, message))?;
        tracing::info!(org_id, approval_id = id, "approval requested");

        if let Err(e) = self.notifier.approval_requested(&approval) {
            tracing::warn!(org_id, approval_id = id, error = %e, "reviewer notification failed");
        }
        Ok(approval)
    }

    pub fn approve(&self, org_id: &str, id: &str) -> Result<Resolution> {
        self.decide(org_id, id, Decision::Approve)
    }

    pub fn reject(&self, org_id: &str, id: &str) -> Result<Resolution> {
        self.decide(org_id, id, Decision::Reject)
    }

    /// Apply a reviewer decision. The resolved broadcast fires only when this
    /// call performed the transition.
    pub fn decide(&self, org_id: &str, id: &str, decision: Decision) -> Result<Resolution> {
        let resolution = match self.store.resolve(org_id, id, decision.target()) {
            Ok(r) => r,
            Err(e @ GateError::AlreadyResolved { .. }) => {
                tracing::info!(org_id, approval_id = id, %decision, "conflicting decision refused");
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        if !resolution.applied {
            tracing::debug!(org_id, approval_id = id, %decision, "duplicate decision ignored");
            return Ok(resolution);
        }

        tracing::info!(
            org_id,
            approval_id = id,
            status = %resolution.approval.status,
            "approval resolved"
        );
        if let Err(e) = self.notifier.approval_resolved(&resolution.approval) {
            tracing::warn!(org_id, approval_id = id, error = %e, "outcome broadcast failed");
        }
        Ok(resolution)
    }

    pub fn get_approval(&self, org_id: &str, id: &str) -> Result<Approval> {
        self.store.get(org_id, id)
    }

    pub fn list_approvals(&self, org_id: &str) -> Vec<Approval> {
        self.store.list(org_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
