//! # fleet-lifecycle: Account Lifecycle Engine
//!
//! Moves fleet-console accounts between `Active`, `Deactivated` and the
//! terminal `SoftDeleted` state, enforcing business constraints before any
//! change is committed.
//!
//! ## Components
//!
//! - **State machine** (`state.rs`): the three states and the four legal
//!   edges. Anything else is an `InvalidTransition`.
//!
//! - **Constraint evaluator** (`constraint.rs`): outstanding work
//!   assignments and the minimum-administrator rule, as pure functions
//!   over a snapshot read inside the committing transaction.
//!
//! - **Audit recorder** (`audit.rs`): one hash-chained entry per attempt,
//!   committed or blocked, written in the same transaction as the change.
//!
//! - **Session invalidator** (`session.rs`): revokes sessions after an
//!   account leaves `Active`, with bounded retries and an escalation queue.
//!
//! - **Rate limiter** (`rate_limit.rs`): per-actor sliding window over all
//!   lifecycle operations.
//!
//! - **Engine** (`engine.rs`): runs the checks in order inside a scoped
//!   store transaction (`store.rs`) and reports a typed outcome.
//!
//! ## Errors vs. Rejections
//!
//! Business refusals are values ([`Rejection`] inside
//! [`TransitionOutcome::Blocked`]). Only infrastructure failures are
//! [`LifecycleError`]s.

pub mod account;
pub mod audit;
pub mod config;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod outcome;
pub mod rate_limit;
pub mod session;
pub mod state;
pub mod store;

// ─── State machine re-exports ───────────────────────────────────────

pub use account::{Account, WorkAssignment, WorkStatus};
pub use state::{LifecycleState, Transition, TransitionKind};

// ─── Engine re-exports ──────────────────────────────────────────────

pub use config::{LifecycleConfig, RateLimitConfig, SessionRetryConfig};
pub use engine::LifecycleEngine;
pub use error::{ConfigError, LifecycleError, SessionStoreError, StoreError};
pub use outcome::{Blocked, Committed, Rejection, TransitionOutcome, TransitionRequest};

// ─── Collaborator re-exports ────────────────────────────────────────

pub use audit::{
    outcome_counts, verify_chain, AuditEntry, AuditOutcome, ChainIntegrityReport, OutcomeCounts,
};
pub use constraint::{ConstraintSnapshot, Violation, ViolationKind};
pub use memory::MemoryStore;
pub use metrics::LifecycleMetrics;
pub use rate_limit::{RateDecision, RateLimitDetail, RateLimiter, SlidingWindowLimiter, Unlimited};
pub use session::{
    MemorySessionStore, PendingSweep, Session, SessionCleanup, SessionInvalidator, SessionStore,
};
pub use store::{with_transaction, LifecycleStore, StoreTransaction};
