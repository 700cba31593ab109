//! # Session Invalidation
//!
//! When an account leaves `Active`, every live session it holds must be
//! revoked. Revocation runs after the state change commits and is
//! at-least-once: the [`SessionInvalidator`] retries a bounded number of
//! times, then parks the account on a pending queue that
//! [`SessionInvalidator::retry_pending`] drains. A failure here never rolls
//! back the committed transition.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use fleet_core::{AccountId, SessionId, Timestamp};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::error::SessionStoreError;

/// A live authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    /// Owning account.
    pub account_id: AccountId,
    /// When the session was issued.
    pub created_at: Timestamp,
}

/// Backend holding live sessions.
pub trait SessionStore: Send + Sync {
    /// Revoke every session of `account`, returning how many were removed.
    /// Revoking an account with no sessions succeeds with zero.
    fn revoke_all(&self, account: &AccountId) -> Result<usize, SessionStoreError>;

    /// Number of live sessions held by `account`.
    fn live_sessions(&self, account: &AccountId) -> Result<usize, SessionStoreError>;
}

// ─── In-Memory Session Store ─────────────────────────────────────────

/// Session store kept in process memory, with fault injection for tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    failures_remaining: Mutex<u32>,
}

impl MemorySessionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live session.
    pub fn insert(&self, session: Session) {
        self.sessions.write().insert(session.id, session);
    }

    /// Issue a fresh session for `account` and return its id.
    pub fn open(&self, account: AccountId, at: Timestamp) -> SessionId {
        let id = SessionId::new();
        self.insert(Session {
            id,
            account_id: account,
            created_at: at,
        });
        id
    }

    /// Make the next `n` calls to [`SessionStore::revoke_all`] fail.
    pub fn fail_next(&self, n: u32) {
        *self.failures_remaining.lock() = n;
    }

    /// Total live sessions across all accounts.
    pub fn total(&self) -> usize {
        self.sessions.read().len()
    }
}

impl SessionStore for MemorySessionStore {
    fn revoke_all(&self, account: &AccountId) -> Result<usize, SessionStoreError> {
        {
            let mut failures = self.failures_remaining.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(SessionStoreError::Unavailable(
                    "injected session store failure".to_string(),
                ));
            }
        }
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| s.account_id != *account);
        Ok(before - sessions.len())
    }

    fn live_sessions(&self, account: &AccountId) -> Result<usize, SessionStoreError> {
        Ok(self
            .sessions
            .read()
            .values()
            .filter(|s| s.account_id == *account)
            .count())
    }
}

// ─── Invalidator ─────────────────────────────────────────────────────

/// What happened to a target's sessions after a committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionCleanup {
    /// The transition did not remove access.
    NotRequired,
    /// All sessions were revoked.
    Completed {
        /// Sessions removed.
        revoked: usize,
    },
    /// Revocation kept failing; the account is queued for retry.
    Escalated {
        /// Attempts made before escalating.
        attempts: u32,
        /// The last failure.
        last_error: String,
    },
}

/// Result of draining the pending queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PendingSweep {
    /// Accounts whose sessions are now revoked.
    pub converged: Vec<AccountId>,
    /// Accounts still failing.
    pub still_pending: Vec<AccountId>,
}

/// Revokes sessions with bounded retries and an escalation queue.
pub struct SessionInvalidator {
    store: Arc<dyn SessionStore>,
    max_attempts: u32,
    pending: Mutex<BTreeSet<AccountId>>,
}

impl std::fmt::Debug for SessionInvalidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionInvalidator")
            .field("max_attempts", &self.max_attempts)
            .field("pending", &self.pending.lock().len())
            .finish()
    }
}

impl SessionInvalidator {
    /// Wrap `store`, trying each revocation up to `max_attempts` times
    /// (at least once).
    pub fn new(store: Arc<dyn SessionStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
            pending: Mutex::new(BTreeSet::new()),
        }
    }

    /// The backing session store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Revoke all sessions of `account`, retrying on failure.
    pub fn invalidate_all(&self, account: &AccountId) -> Result<usize, SessionStoreError> {
        let mut attempt = 1;
        loop {
            match self.store.revoke_all(account) {
                Ok(revoked) => return Ok(revoked),
                Err(e) if attempt < self.max_attempts => {
                    tracing::warn!(
                        account = %account,
                        attempt,
                        error = %e,
                        "session revocation failed, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Revoke, or queue `account` for a later sweep if every attempt fails.
    pub fn invalidate_or_escalate(&self, account: &AccountId) -> SessionCleanup {
        match self.invalidate_all(account) {
            Ok(revoked) => {
                self.pending.lock().remove(account);
                SessionCleanup::Completed { revoked }
            }
            Err(e) => {
                self.pending.lock().insert(*account);
                tracing::error!(
                    account = %account,
                    attempts = self.max_attempts,
                    error = %e,
                    "session revocation escalated; account queued for retry"
                );
                SessionCleanup::Escalated {
                    attempts: self.max_attempts,
                    last_error: e.to_string(),
                }
            }
        }
    }

    /// Accounts awaiting session revocation.
    pub fn pending(&self) -> Vec<AccountId> {
        self.pending.lock().iter().copied().collect()
    }

    /// Retry every pending account once through the retry policy.
    pub fn retry_pending(&self) -> PendingSweep {
        let queued = self.pending();
        let mut sweep = PendingSweep::default();
        for account in queued {
            match self.invalidate_all(&account) {
                Ok(revoked) => {
                    self.pending.lock().remove(&account);
                    tracing::info!(account = %account, revoked, "pending session revocation converged");
                    sweep.converged.push(account);
                }
                Err(e) => {
                    tracing::warn!(account = %account, error = %e, "pending session revocation still failing");
                    sweep.still_pending.push(account);
                }
            }
        }
        sweep
    }
}
