//! # Lifecycle Engine
//!
//! Orchestrates one lifecycle request end to end:
//!
//! 1. Self-modification check (actor == target).
//! 2. Load the target inside a store transaction and check the requested
//!    edge against the state machine and the account's current state.
//! 3. Per-actor rate limit.
//! 4. Constraint evaluation (outstanding work, then last administrator).
//! 5. Apply the change and append the `committed` audit entry, or append a
//!    `blocked` entry carrying the first failing check. Either way the
//!    audit write shares the transaction with the (possible) state change.
//! 6. After commit, revoke the target's sessions if it left `Active`.
//!
//! The first failing check short-circuits the rest.

use std::sync::Arc;

use fleet_core::{AccountId, Clock, SystemClock, Timestamp};

use crate::account::Account;
use crate::audit::{self, AuditDraft, AuditEntry, OutcomeCounts};
use crate::config::LifecycleConfig;
use crate::constraint::{self, ConstraintSnapshot};
use crate::error::{LifecycleError, StoreError};
use crate::metrics::LifecycleMetrics;
use crate::outcome::{Blocked, Committed, Rejection, TransitionOutcome, TransitionRequest};
use crate::rate_limit::{RateDecision, RateLimiter, SlidingWindowLimiter};
use crate::session::{PendingSweep, SessionCleanup, SessionInvalidator, SessionStore};
use crate::state::LifecycleState;
use crate::store::{with_transaction, LifecycleStore, StoreTransaction};

/// What the transactional part of a request decided.
enum Decision {
    Committed {
        previous_state: LifecycleState,
        entry: AuditEntry,
    },
    Blocked {
        rejection: Rejection,
        entry: AuditEntry,
    },
}

/// The account lifecycle engine.
pub struct LifecycleEngine<S: LifecycleStore> {
    store: S,
    limiter: Arc<dyn RateLimiter>,
    sessions: SessionInvalidator,
    clock: Arc<dyn Clock>,
    metrics: LifecycleMetrics,
}

impl<S: LifecycleStore> std::fmt::Debug for LifecycleEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleEngine")
            .field("sessions", &self.sessions)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl<S: LifecycleStore> LifecycleEngine<S> {
    /// Build an engine with a sliding-window limiter and the system clock.
    pub fn new(store: S, session_store: Arc<dyn SessionStore>, config: &LifecycleConfig) -> Self {
        Self {
            store,
            limiter: Arc::new(SlidingWindowLimiter::new(config.rate_limit)),
            sessions: SessionInvalidator::new(session_store, config.session_retry.max_attempts),
            clock: Arc::new(SystemClock),
            metrics: LifecycleMetrics::new(),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the rate limiter.
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Replace the metrics registry.
    pub fn with_metrics(mut self, metrics: LifecycleMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Outcome metrics.
    pub fn metrics(&self) -> &LifecycleMetrics {
        &self.metrics
    }

    /// Accounts whose session revocation was escalated and is still pending.
    pub fn pending_sessions(&self) -> Vec<AccountId> {
        self.sessions.pending()
    }

    /// Request a lifecycle transition.
    ///
    /// Business-rule refusals come back as [`TransitionOutcome::Blocked`].
    /// `Err` means nothing was written: the store failed, the audit log
    /// refused the entry, or the target does not exist.
    pub fn request_transition(
        &self,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, LifecycleError> {
        let now = self.clock.now();
        let mut admitted = false;
        let decision =
            match with_transaction(&self.store, |tx| self.decide(tx, &request, now, &mut admitted)) {
                Ok(decision) => decision,
                Err(e) => {
                    // Rolled back; return the slot this attempt took.
                    if admitted {
                        self.limiter.release(&request.actor, now);
                    }
                    tracing::error!(
                        actor = %request.actor,
                        target_account = %request.target,
                        transition = %request.transition,
                        error = %e,
                        rate_slot_released = admitted,
                        "lifecycle request failed; nothing committed"
                    );
                    return Err(e);
                }
            };

        match decision {
            Decision::Blocked { rejection, entry } => {
                tracing::warn!(
                    actor = %request.actor,
                    target_account = %request.target,
                    transition = %request.transition,
                    reason = rejection.code(),
                    audit_sequence = entry.sequence,
                    "lifecycle transition blocked"
                );
                self.metrics.record_blocked(rejection.code());
                Ok(TransitionOutcome::Blocked(Blocked {
                    target: request.target,
                    rejection,
                    timestamp: now,
                    audit_sequence: entry.sequence,
                }))
            }
            Decision::Committed {
                previous_state,
                entry,
            } => {
                let transition = request.transition;
                let sessions = if transition.leaves_active() {
                    let cleanup = self.sessions.invalidate_or_escalate(&request.target);
                    if matches!(cleanup, SessionCleanup::Escalated { .. }) {
                        self.metrics.record_escalation();
                    }
                    cleanup
                } else {
                    SessionCleanup::NotRequired
                };

                let kind = transition.kind().map(|k| k.as_str()).unwrap_or("unknown");
                tracing::info!(
                    actor = %request.actor,
                    target_account = %request.target,
                    transition = kind,
                    new_state = %transition.to,
                    audit_sequence = entry.sequence,
                    "lifecycle transition committed"
                );
                self.metrics.record_committed(kind);

                Ok(TransitionOutcome::Committed(Committed {
                    target: request.target,
                    previous_state,
                    new_state: transition.to,
                    timestamp: now,
                    audit_sequence: entry.sequence,
                    sessions,
                }))
            }
        }
    }

    /// The transactional part of a request. Runs every check in order and
    /// stages exactly one audit entry. Sets `admitted` once the rate limiter
    /// has handed out a slot.
    fn decide<T: StoreTransaction>(
        &self,
        tx: &mut T,
        request: &TransitionRequest,
        now: Timestamp,
        admitted: &mut bool,
    ) -> Result<Decision, LifecycleError> {
        if request.actor == request.target {
            return block(tx, request, now, Rejection::SelfModificationForbidden);
        }

        let mut account = tx
            .load_account_for_update(&request.target)?
            .ok_or(LifecycleError::AccountNotFound(request.target))?;

        let transition = request.transition;
        if !transition.is_legal() || account.state != transition.from {
            let rejection = Rejection::InvalidTransition {
                current: account.state,
                requested: transition,
            };
            return block(tx, request, now, rejection);
        }

        match self.limiter.check(&request.actor, now) {
            RateDecision::Denied(detail) => {
                return block(tx, request, now, Rejection::RateLimited(detail));
            }
            RateDecision::Admitted { .. } => *admitted = true,
        }

        let snapshot = snapshot(tx, &account)?;
        tracing::debug!(
            target_account = %account.id,
            outstanding_work = snapshot.outstanding_work.len(),
            other_active_administrators = snapshot.other_active_administrators,
            "constraint snapshot"
        );
        if let Some(violation) = constraint::evaluate(&account, &transition, &snapshot)
            .into_iter()
            .next()
        {
            return block(tx, request, now, Rejection::ConstraintViolation(violation));
        }

        let previous_state = account.state;
        account.apply(&transition, request.actor, now);
        tx.save_account(&account)?;
        let entry = tx.append_audit(AuditDraft::committed(
            now,
            request.actor,
            request.target,
            transition,
            request.note.clone(),
        ))?;
        Ok(Decision::Committed {
            previous_state,
            entry,
        })
    }

    // ─── Queries ─────────────────────────────────────────────────────

    /// Committed view of an account.
    pub fn account(&self, id: &AccountId) -> Result<Option<Account>, LifecycleError> {
        Ok(self.store.account(id)?)
    }

    /// Audit entries targeting `id`, newest first.
    pub fn entries_for_target(&self, id: &AccountId) -> Result<Vec<AuditEntry>, LifecycleError> {
        Ok(self.store.audit_for_target(id)?)
    }

    /// The full audit log in sequence order.
    pub fn audit_log(&self) -> Result<Vec<AuditEntry>, LifecycleError> {
        Ok(self.store.audit_log()?)
    }

    /// Committed and blocked counts over the whole audit log.
    pub fn outcome_counts(&self) -> Result<OutcomeCounts, LifecycleError> {
        let log = self.store.audit_log()?;
        Ok(audit::outcome_counts(&log))
    }

    /// Retry session revocation for every escalated account.
    pub fn retry_pending_sessions(&self) -> PendingSweep {
        self.sessions.retry_pending()
    }
}

/// Gather the constraint inputs for `account` inside the transaction.
fn snapshot<T: StoreTransaction>(
    tx: &mut T,
    account: &Account,
) -> Result<ConstraintSnapshot, StoreError> {
    Ok(ConstraintSnapshot {
        outstanding_work: tx.outstanding_work_for(&account.id)?,
        other_active_administrators: tx.count_active_administrators(&account.id)?,
    })
}

/// Stage a blocked audit entry for `rejection`.
fn block<T: StoreTransaction>(
    tx: &mut T,
    request: &TransitionRequest,
    now: Timestamp,
    rejection: Rejection,
) -> Result<Decision, LifecycleError> {
    let entry = tx.append_audit(AuditDraft::blocked(
        now,
        request.actor,
        request.target,
        request.transition,
        rejection.clone(),
        request.note.clone(),
    ))?;
    Ok(Decision::Blocked { rejection, entry })
}
