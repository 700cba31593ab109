//! # Account and Work Assignment Records
//!
//! [`Account`] is provisioned elsewhere and mutated only by the lifecycle
//! engine. [`WorkAssignment`] is owned by the tasking subsystem; the engine
//! reads it to decide whether an account still has outstanding work.

use fleet_core::{AccountId, Role, Timestamp, WorkAssignmentId};
use serde::{Deserialize, Serialize};

use crate::state::{LifecycleState, Transition};

// ─── Account ─────────────────────────────────────────────────────────

/// A user account with its lifecycle state and stamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account identifier.
    pub id: AccountId,
    /// Login name, for operator-facing output.
    pub username: String,
    /// Role resolved at provisioning time.
    pub role: Role,
    /// Current lifecycle state.
    pub state: LifecycleState,
    /// When the account was provisioned.
    pub created_at: Timestamp,
    /// When the account was last changed.
    pub updated_at: Timestamp,
    /// When the account last entered `Deactivated`. Cleared on reactivation.
    #[serde(default)]
    pub deactivated_at: Option<Timestamp>,
    /// When the account was soft-deleted.
    #[serde(default)]
    pub deleted_at: Option<Timestamp>,
    /// Who soft-deleted the account. A weak reference, not ownership.
    #[serde(default)]
    pub deleted_by: Option<AccountId>,
}

impl Account {
    /// A freshly provisioned, active account.
    pub fn new(id: AccountId, username: impl Into<String>, role: Role, created_at: Timestamp) -> Self {
        Self {
            id,
            username: username.into(),
            role,
            state: LifecycleState::Active,
            created_at,
            updated_at: created_at,
            deactivated_at: None,
            deleted_at: None,
            deleted_by: None,
        }
    }

    /// Whether this account is an active administrator.
    pub fn is_active_administrator(&self) -> bool {
        self.state == LifecycleState::Active && self.role.is_administrator()
    }

    /// Apply a validated transition, stamping the lifecycle fields.
    ///
    /// Callers must have checked legality and constraints; this only
    /// records the outcome.
    pub(crate) fn apply(&mut self, transition: &Transition, actor: AccountId, at: Timestamp) {
        match transition.to {
            LifecycleState::Deactivated => {
                self.deactivated_at = Some(at);
            }
            LifecycleState::Active => {
                self.deactivated_at = None;
            }
            LifecycleState::SoftDeleted => {
                self.deleted_at = Some(at);
                self.deleted_by = Some(actor);
            }
        }
        self.state = transition.to;
        self.updated_at = at;
    }
}

// ─── Work Assignments ────────────────────────────────────────────────

/// Status of a work assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// Created, not started.
    Pending,
    /// Started, not finished.
    InProgress,
    /// Finished.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl WorkStatus {
    /// Whether the assignment still needs an owner.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

/// An externally owned unit of work referencing an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkAssignment {
    /// Unique assignment identifier.
    pub id: WorkAssignmentId,
    /// Account that created the assignment.
    pub creator: AccountId,
    /// Account the work is assigned to, if any.
    #[serde(default)]
    pub assignee: Option<AccountId>,
    /// Current status.
    pub status: WorkStatus,
}

impl WorkAssignment {
    /// Whether `account` is the creator or assignee.
    pub fn references(&self, account: &AccountId) -> bool {
        self.creator == *account || self.assignee.as_ref() == Some(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(role: Role) -> Account {
        Account::new(AccountId::new(), "u", role, Timestamp::now())
    }

    #[test]
    fn new_account_is_active_without_stamps() {
        let a = account(Role::Driver);
        assert_eq!(a.state, LifecycleState::Active);
        assert!(a.deactivated_at.is_none());
        assert!(a.deleted_at.is_none());
        assert!(a.deleted_by.is_none());
    }

    #[test]
    fn deactivate_then_reactivate_clears_stamp() {
        let mut a = account(Role::Driver);
        let actor = AccountId::new();
        let t1 = Timestamp::now();
        a.apply(&Transition::DEACTIVATE, actor, t1);
        assert_eq!(a.state, LifecycleState::Deactivated);
        assert_eq!(a.deactivated_at, Some(t1));

        a.apply(&Transition::REACTIVATE, actor, t1);
        assert_eq!(a.state, LifecycleState::Active);
        assert!(a.deactivated_at.is_none());
    }

    #[test]
    fn soft_delete_records_actor() {
        let mut a = account(Role::Manager);
        let actor = AccountId::new();
        let at = Timestamp::now();
        a.apply(&Transition::DELETE_ACTIVE, actor, at);
        assert_eq!(a.state, LifecycleState::SoftDeleted);
        assert_eq!(a.deleted_at, Some(at));
        assert_eq!(a.deleted_by, Some(actor));
        assert_eq!(a.updated_at, at);
    }

    #[test]
    fn active_administrator_requires_both() {
        let mut admin = account(Role::Administrator);
        assert!(admin.is_active_administrator());
        admin.state = LifecycleState::Deactivated;
        assert!(!admin.is_active_administrator());
        assert!(!account(Role::Viewer).is_active_administrator());
    }

    #[test]
    fn outstanding_statuses() {
        assert!(WorkStatus::Pending.is_outstanding());
        assert!(WorkStatus::InProgress.is_outstanding());
        assert!(!WorkStatus::Completed.is_outstanding());
        assert!(!WorkStatus::Cancelled.is_outstanding());
    }

    #[test]
    fn assignment_references_creator_and_assignee() {
        let creator = AccountId::new();
        let assignee = AccountId::new();
        let w = WorkAssignment {
            id: WorkAssignmentId::new(),
            creator,
            assignee: Some(assignee),
            status: WorkStatus::Pending,
        };
        assert!(w.references(&creator));
        assert!(w.references(&assignee));
        assert!(!w.references(&AccountId::new()));
    }
}
