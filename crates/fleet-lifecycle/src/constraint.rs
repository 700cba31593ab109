//! # Constraint Evaluator
//!
//! Pure predicates deciding whether a structurally valid transition is
//! currently allowed, given a snapshot of dependent records read inside the
//! committing transaction.
//!
//! Evaluation order is fixed: outstanding work first, then the
//! administrator count. The engine reports the first violation.

use fleet_core::WorkAssignmentId;
use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::state::{LifecycleState, Transition};

/// Dependent data the constraints are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSnapshot {
    /// Pending or in-progress assignments created by or assigned to the target.
    pub outstanding_work: Vec<WorkAssignmentId>,
    /// Active administrators other than the target.
    pub other_active_administrators: usize,
}

/// The family a violation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The target still owns unfinished work.
    OutstandingWork,
    /// The target is the last active administrator.
    LastAdministrator,
}

/// A business rule blocking an otherwise legal transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Removing access would orphan these assignments.
    OutstandingWork {
        /// Number of outstanding assignments.
        count: usize,
        /// The outstanding assignments.
        assignments: Vec<WorkAssignmentId>,
    },
    /// No other active administrator would remain.
    LastAdministrator {
        /// Active administrators other than the target (always zero).
        other_active_administrators: usize,
    },
}

impl Violation {
    /// The family of this violation.
    pub fn kind(&self) -> ViolationKind {
        match self {
            Self::OutstandingWork { .. } => ViolationKind::OutstandingWork,
            Self::LastAdministrator { .. } => ViolationKind::LastAdministrator,
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutstandingWork { count, .. } => {
                write!(f, "account has {count} outstanding work assignment(s)")
            }
            Self::LastAdministrator { .. } => {
                f.write_str("account is the last active administrator")
            }
        }
    }
}

/// Evaluate every constraint for `transition` on `target`.
///
/// Returns violations in evaluation order; an empty vector means the
/// transition may be committed.
pub fn evaluate(
    target: &Account,
    transition: &Transition,
    snapshot: &ConstraintSnapshot,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    if outstanding_work_applies(transition) && !snapshot.outstanding_work.is_empty() {
        violations.push(Violation::OutstandingWork {
            count: snapshot.outstanding_work.len(),
            assignments: snapshot.outstanding_work.clone(),
        });
    }

    if administrator_count_applies(target, transition)
        && snapshot.other_active_administrators == 0
    {
        violations.push(Violation::LastAdministrator {
            other_active_administrators: snapshot.other_active_administrators,
        });
    }

    violations
}

/// Applies to every edge that removes access: into `Deactivated` or
/// `SoftDeleted`.
fn outstanding_work_applies(transition: &Transition) -> bool {
    match transition.to {
        LifecycleState::Deactivated | LifecycleState::SoftDeleted => true,
        LifecycleState::Active => false,
    }
}

fn administrator_count_applies(target: &Account, transition: &Transition) -> bool {
    target.role.is_administrator()
        && target.state == LifecycleState::Active
        && transition.leaves_active()
}
