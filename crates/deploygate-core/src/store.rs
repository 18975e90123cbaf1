//! In-memory approval store, keyed by org then approval id.
//!
//! Every operation takes one store-wide mutex, so reads never observe a
//! half-applied write and a check-then-set (see [`ApprovalStore::resolve`])
//! is atomic with respect to every other call. Reads hand out clones.

use crate::approval::{Approval, ApprovalStatus};
use crate::error::{GateError, Result};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    by_org: HashMap<String, HashMap<String, Approval>>,
    /// Every id ever created, across all orgs.
    ids: HashSet<String>,
}

/// Outcome of [`ApprovalStore::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Snapshot of the record after the call.
    pub approval: Approval,
    /// `false` when the record was already in the requested terminal state.
    pub applied: bool,
}

#[derive(Debug, Default)]
pub struct ApprovalStore {
    inner: Mutex<Inner>,
}

impl ApprovalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Mutations are single map writes; a poisoned lock still guards
        // consistent data.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new record. The stored copy is always `pending`, whatever
    /// status the argument carries.
    pub fn create(&self, approval: Approval) -> Result<Approval> {
        let mut inner = self.lock();
        if inner.ids.contains(&approval.id) {
            return Err(GateError::AlreadyExists {
                org_id: approval.org_id,
                id: approval.id,
            });
        }

        let mut record = approval;
        record.status = ApprovalStatus::Pending;
        record.resolved_at = None;

        inner.ids.insert(record.id.clone());
        inner
            .by_org
            .entry(record.org_id.clone())
            .or_default()
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    /// Unconditionally overwrite the status of an existing record.
    ///
    /// This is the raw primitive: concurrent callers serialize on the lock and
    /// the last one wins. Lifecycle code uses [`ApprovalStore::resolve`].
    pub fn update_status(&self, org_id: &str, id: &str, status: ApprovalStatus) -> Result<Approval> {
        let mut inner = self.lock();
        let record = inner
            .by_org
            .get_mut(org_id)
            .and_then(|org| org.get_mut(id))
            .ok_or_else(|| GateError::not_found(org_id, id))?;

        record.status = status;
        record.resolved_at = status.is_terminal().then(Utc::now);
        Ok(record.clone())
    }

    /// Move a `pending` record into `target` under the store lock.
    ///
    /// If the record is already terminal: same state is a no-op
    /// (`applied = false`), a different state is [`GateError::AlreadyResolved`].
    pub fn resolve(&self, org_id: &str, id: &str, target: ApprovalStatus) -> Result<Resolution> {
        if !target.is_terminal() {
            return Err(GateError::InvalidStatus(target.to_string()));
        }

        let mut inner = self.lock();
        let record = inner
            .by_org
            .get_mut(org_id)
            .and_then(|org| org.get_mut(id))
            .ok_or_else(|| GateError::not_found(org_id, id))?;

        match record.status {
            ApprovalStatus::Pending => {
                record.status = target;
                record.resolved_at = Some(Utc::now());
                Ok(Resolution {
                    approval: record.clone(),
                    applied: true,
                })
            }
            current if current == target => Ok(Resolution {
                approval: record.clone(),
                applied: false,
            }),
            current => Err(GateError::AlreadyResolved {
                id: id.to_string(),
                current,
                requested: target,
            }),
        }
    }

    pub fn get(&self, org_id: &str, id: &str) -> Result<Approval> {
        self.lock()
            .by_org
            .get(org_id)
            .and_then(|org| org.get(id))
            .cloned()
            .ok_or_else(|| GateError::not_found(org_id, id))
    }

    /// All records for `org_id`, unordered. Unknown orgs yield an empty list.
    pub fn list(&self, org_id: &str) -> Vec<Approval> {
        self.lock()
            .by_org
            .get(org_id)
            .map(|org| org.values().cloned().collect())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
