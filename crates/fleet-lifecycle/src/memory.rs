//! # In-Memory Store
//!
//! [`MemoryStore`] implements [`LifecycleStore`] over process memory. A
//! single store-wide mutex is held for the lifetime of each transaction,
//! which serializes lifecycle changes exactly as row locks would in a
//! relational backend. Writes are staged in the transaction and applied
//! on commit; dropping an uncommitted transaction discards them.
//!
//! Fault toggles ([`MemoryStore::set_unavailable`],
//! [`MemoryStore::fail_audit_writes`]) let tests and the CLI exercise
//! the failure paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fleet_core::{AccountId, WorkAssignmentId};
use parking_lot::{Mutex, MutexGuard};

use crate::account::{Account, WorkAssignment, WorkStatus};
use crate::audit::{self, AuditDraft, AuditEntry, GENESIS_HASH};
use crate::error::StoreError;
use crate::store::{LifecycleStore, StoreTransaction};

#[derive(Debug, Default)]
struct StoreState {
    accounts: HashMap<AccountId, Account>,
    work: HashMap<WorkAssignmentId, WorkAssignment>,
    audit: Vec<AuditEntry>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<StoreState>,
    unavailable: AtomicBool,
    fail_audit: AtomicBool,
}

/// Shared in-memory account, work and audit store. Clones share data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Seeding ─────────────────────────────────────────────────────

    /// Insert or replace an account.
    pub fn insert_account(&self, account: Account) {
        self.inner.state.lock().accounts.insert(account.id, account);
    }

    /// Insert or replace a work assignment.
    pub fn insert_work_assignment(&self, assignment: WorkAssignment) {
        self.inner.state.lock().work.insert(assignment.id, assignment);
    }

    /// Change the status of an existing assignment. Returns `false` if it
    /// does not exist.
    pub fn set_work_status(&self, id: &WorkAssignmentId, status: WorkStatus) -> bool {
        match self.inner.state.lock().work.get_mut(id) {
            Some(w) => {
                w.status = status;
                true
            }
            None => false,
        }
    }

    /// All accounts, in no particular order.
    pub fn accounts(&self) -> Vec<Account> {
        self.inner.state.lock().accounts.values().cloned().collect()
    }

    // ── Fault injection ─────────────────────────────────────────────

    /// Make every operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make audit appends fail with [`StoreError::AuditUnavailable`].
    pub fn fail_audit_writes(&self, fail: bool) {
        self.inner.fail_audit.store(fail, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

impl LifecycleStore for MemoryStore {
    type Tx<'a> = MemoryTransaction<'a>;

    fn begin(&self) -> Result<Self::Tx<'_>, StoreError> {
        self.ensure_available()?;
        Ok(MemoryTransaction {
            guard: self.inner.state.lock(),
            staged_accounts: HashMap::new(),
            staged_audit: Vec::new(),
            fail_audit: self.inner.fail_audit.load(Ordering::SeqCst),
        })
    }

    fn account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        self.ensure_available()?;
        Ok(self.inner.state.lock().accounts.get(id).cloned())
    }

    fn audit_for_target(&self, id: &AccountId) -> Result<Vec<AuditEntry>, StoreError> {
        self.ensure_available()?;
        let mut entries: Vec<AuditEntry> = self
            .inner
            .state
            .lock()
            .audit
            .iter()
            .filter(|e| e.target == *id)
            .cloned()
            .collect();
        audit::newest_first(&mut entries);
        Ok(entries)
    }

    fn audit_log(&self) -> Result<Vec<AuditEntry>, StoreError> {
        self.ensure_available()?;
        Ok(self.inner.state.lock().audit.clone())
    }
}

/// A transaction holding the store lock until commit or drop.
pub struct MemoryTransaction<'a> {
    guard: MutexGuard<'a, StoreState>,
    staged_accounts: HashMap<AccountId, Account>,
    staged_audit: Vec<AuditEntry>,
    fail_audit: bool,
}

impl MemoryTransaction<'_> {
    fn view(&self, id: &AccountId) -> Option<&Account> {
        self.staged_accounts
            .get(id)
            .or_else(|| self.guard.accounts.get(id))
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn load_account_for_update(&mut self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.view(id).cloned())
    }

    fn outstanding_work_for(&mut self, id: &AccountId) -> Result<Vec<WorkAssignmentId>, StoreError> {
        let mut ids: Vec<WorkAssignmentId> = self
            .guard
            .work
            .values()
            .filter(|w| w.status.is_outstanding() && w.references(id))
            .map(|w| w.id)
            .collect();
        ids.sort_by_key(|id| *id.as_uuid());
        Ok(ids)
    }

    fn count_active_administrators(&mut self, excluding: &AccountId) -> Result<usize, StoreError> {
        let committed = self
            .guard
            .accounts
            .keys()
            .filter(|id| !self.staged_accounts.contains_key(*id));
        let staged = self.staged_accounts.keys();
        Ok(committed
            .chain(staged)
            .filter(|id| *id != excluding)
            .filter_map(|id| self.view(id))
            .filter(|a| a.is_active_administrator())
            .count())
    }

    fn save_account(&mut self, account: &Account) -> Result<(), StoreError> {
        self.staged_accounts.insert(account.id, account.clone());
        Ok(())
    }

    fn append_audit(&mut self, draft: AuditDraft) -> Result<AuditEntry, StoreError> {
        if self.fail_audit {
            return Err(StoreError::AuditUnavailable(
                "audit log rejected append".to_string(),
            ));
        }
        let sequence = (self.guard.audit.len() + self.staged_audit.len()) as u64 + 1;
        let previous_hash = self
            .staged_audit
            .last()
            .or_else(|| self.guard.audit.last())
            .map(|e| e.entry_hash.as_str())
            .unwrap_or(GENESIS_HASH);
        let entry = AuditEntry::seal(draft, sequence, previous_hash)?;
        self.staged_audit.push(entry.clone());
        Ok(entry)
    }

    fn commit(self) -> Result<(), StoreError> {
        let MemoryTransaction {
            mut guard,
            staged_accounts,
            staged_audit,
            ..
        } = self;
        guard.accounts.extend(staged_accounts);
        guard.audit.extend(staged_audit);
        Ok(())
    }
}
