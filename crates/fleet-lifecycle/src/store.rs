//! # Lifecycle Store
//!
//! Persistence capability used by the engine. A [`LifecycleStore`] hands out
//! scoped [`StoreTransaction`]s: everything read and written through one
//! transaction becomes visible atomically on [`StoreTransaction::commit`],
//! and nothing does if the transaction is dropped without committing.
//!
//! Implementations must serialize transactions that touch overlapping
//! accounts (row locks, serializable isolation, or a store-wide lock) so
//! that constraint checks made inside a transaction still hold when it
//! commits.

use fleet_core::{AccountId, WorkAssignmentId};

use crate::account::Account;
use crate::audit::{AuditDraft, AuditEntry};
use crate::error::StoreError;

/// Account, work-assignment and audit persistence.
pub trait LifecycleStore: Send + Sync {
    /// An open unit of work.
    type Tx<'a>: StoreTransaction
    where
        Self: 'a;

    /// Open a transaction.
    fn begin(&self) -> Result<Self::Tx<'_>, StoreError>;

    /// Committed view of one account.
    fn account(&self, id: &AccountId) -> Result<Option<Account>, StoreError>;

    /// Audit entries targeting `id`, newest first.
    fn audit_for_target(&self, id: &AccountId) -> Result<Vec<AuditEntry>, StoreError>;

    /// The full audit log in sequence order.
    fn audit_log(&self) -> Result<Vec<AuditEntry>, StoreError>;
}

/// Reads and writes inside one transaction.
pub trait StoreTransaction {
    /// Load `id`, locking it against concurrent lifecycle changes.
    fn load_account_for_update(&mut self, id: &AccountId) -> Result<Option<Account>, StoreError>;

    /// Pending or in-progress assignments created by or assigned to `id`.
    fn outstanding_work_for(&mut self, id: &AccountId) -> Result<Vec<WorkAssignmentId>, StoreError>;

    /// Active administrators other than `excluding`.
    fn count_active_administrators(&mut self, excluding: &AccountId) -> Result<usize, StoreError>;

    /// Stage an updated account.
    fn save_account(&mut self, account: &Account) -> Result<(), StoreError>;

    /// Seal and stage an audit entry, returning it with its sequence number.
    fn append_audit(&mut self, draft: AuditDraft) -> Result<AuditEntry, StoreError>;

    /// Make every staged write durable.
    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

/// Run `f` inside a transaction on `store`.
///
/// Commits when `f` returns `Ok`. On `Err` the transaction is dropped
/// uncommitted, discarding every staged write.
pub fn with_transaction<'s, S, R, E, F>(store: &'s S, f: F) -> Result<R, E>
where
    S: LifecycleStore,
    E: From<StoreError>,
    F: FnOnce(&mut S::Tx<'s>) -> Result<R, E>,
{
    let mut tx = store.begin()?;
    let value = f(&mut tx)?;
    tx.commit()?;
    Ok(value)
}
