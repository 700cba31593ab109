//! # Requests and Outcomes
//!
//! A [`TransitionRequest`] goes in; a [`TransitionOutcome`] comes out.
//! Every business-rule refusal is a [`Rejection`] value carried inside
//! [`TransitionOutcome::Blocked`]. Only infrastructure failures surface as
//! [`crate::error::LifecycleError`].

use fleet_core::{AccountId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::constraint::Violation;
use crate::rate_limit::RateLimitDetail;
use crate::session::SessionCleanup;
use crate::state::{LifecycleState, Transition};

/// A caller's request to move `target` along `transition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    /// The authenticated account performing the change.
    pub actor: AccountId,
    /// The account being changed.
    pub target: AccountId,
    /// The requested edge.
    pub transition: Transition,
    /// Optional free-text justification recorded in the audit trail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TransitionRequest {
    /// A request without a note.
    pub fn new(actor: AccountId, target: AccountId, transition: Transition) -> Self {
        Self {
            actor,
            target,
            transition,
            note: None,
        }
    }

    /// Attach a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum Rejection {
    /// The edge is not in the state machine, or the account is not in the
    /// requested `from` state.
    InvalidTransition {
        /// The account's actual state.
        current: LifecycleState,
        /// The edge the caller asked for.
        requested: Transition,
    },
    /// Actor and target are the same account.
    SelfModificationForbidden,
    /// The actor exceeded the lifecycle operation rate.
    RateLimited(RateLimitDetail),
    /// A business constraint holds the account in place.
    ConstraintViolation(Violation),
}

impl Rejection {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::SelfModificationForbidden => "self_modification_forbidden",
            Self::RateLimited(_) => "rate_limited",
            Self::ConstraintViolation(Violation::OutstandingWork { .. }) => "outstanding_work",
            Self::ConstraintViolation(Violation::LastAdministrator { .. }) => "last_administrator",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTransition { current, requested } => {
                write!(f, "invalid transition {requested} (account is {current})")
            }
            Self::SelfModificationForbidden => f.write_str("an account cannot change its own lifecycle state"),
            Self::RateLimited(d) => write!(
                f,
                "rate limited: {} operations per {}s, retry in {}s",
                d.limit, d.window_secs, d.retry_after_secs
            ),
            Self::ConstraintViolation(v) => write!(f, "constraint violation: {v}"),
        }
    }
}

/// A successfully committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Committed {
    /// The changed account.
    pub target: AccountId,
    /// State before the change.
    pub previous_state: LifecycleState,
    /// State after the change.
    pub new_state: LifecycleState,
    /// Commit time.
    pub timestamp: Timestamp,
    /// Sequence number of the audit entry written with the change.
    pub audit_sequence: u64,
    /// What happened to the target's sessions after commit.
    pub sessions: SessionCleanup,
}

/// A refused request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Blocked {
    /// The account the request targeted.
    pub target: AccountId,
    /// Why it was refused.
    #[serde(flatten)]
    pub rejection: Rejection,
    /// Decision time.
    pub timestamp: Timestamp,
    /// Sequence number of the audit entry recording the refusal.
    pub audit_sequence: u64,
}

/// Result of [`crate::engine::LifecycleEngine::request_transition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// The state change and its audit entry were committed.
    Committed(Committed),
    /// The request was refused; only the audit entry was written.
    Blocked(Blocked),
}

impl TransitionOutcome {
    /// Whether the transition took effect.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    /// The rejection, if blocked.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Blocked(b) => Some(&b.rejection),
            Self::Committed(_) => None,
        }
    }

    /// The audit entry written for this request.
    pub fn audit_sequence(&self) -> u64 {
        match self {
            Self::Committed(c) => c.audit_sequence,
            Self::Blocked(b) => b.audit_sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let all = [
            Rejection::InvalidTransition {
                current: LifecycleState::SoftDeleted,
                requested: Transition::REACTIVATE,
            },
            Rejection::SelfModificationForbidden,
            Rejection::RateLimited(RateLimitDetail {
                limit: 1,
                window_secs: 60,
                retry_after_secs: 10,
            }),
            Rejection::ConstraintViolation(Violation::OutstandingWork {
                count: 0,
                assignments: vec![],
            }),
            Rejection::ConstraintViolation(Violation::LastAdministrator {
                other_active_administrators: 0,
            }),
        ];
        let mut codes: Vec<_> = all.iter().map(Rejection::code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn rejection_json_shape() {
        let json = serde_json::to_value(Rejection::InvalidTransition {
            current: LifecycleState::SoftDeleted,
            requested: Transition::REACTIVATE,
        })
        .unwrap();
        assert_eq!(json["reason"], "invalid_transition");
        assert_eq!(json["detail"]["current"], "soft_deleted");

        let unit = serde_json::to_value(Rejection::SelfModificationForbidden).unwrap();
        assert_eq!(unit["reason"], "self_modification_forbidden");
    }

    #[test]
    fn rejection_round_trips() {
        let r = Rejection::ConstraintViolation(Violation::LastAdministrator {
            other_active_administrators: 0,
        });
        let back: Rejection = serde_json::from_str(&serde_json::to_string(&r).unwrap()).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn blocked_outcome_flattens_reason() {
        let outcome = TransitionOutcome::Blocked(Blocked {
            target: AccountId::new(),
            rejection: Rejection::SelfModificationForbidden,
            timestamp: Timestamp::now(),
            audit_sequence: 4,
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "blocked");
        assert_eq!(json["reason"], "self_modification_forbidden");
        assert_eq!(outcome.audit_sequence(), 4);
        assert!(!outcome.is_committed());
    }

    #[test]
    fn note_is_optional() {
        let r = TransitionRequest::new(AccountId::new(), AccountId::new(), Transition::DEACTIVATE);
        assert!(r.note.is_none());
        assert_eq!(r.with_note("leaver").note.as_deref(), Some("leaver"));
    }
}
