//! # Account Lifecycle State Machine
//!
//! ```text
//! Active ──▶ Deactivated ──▶ Active (reactivation)
//!    │            │
//!    ▼            ▼
//!        SoftDeleted (terminal, retained)
//! ```
//!
//! ## Design Decision
//!
//! Accounts are loaded from a shared store at runtime, so the state is an
//! enum validated per request rather than a typestate. A [`Transition`] is a
//! requested edge `(from, to)`; it can express illegal edges such as
//! `Active → Active` so that the engine can reject them with a typed
//! `InvalidTransition` instead of making them unrepresentable at the
//! caller's boundary.

use std::str::FromStr;

use fleet_core::ValidationError;
use serde::{Deserialize, Serialize};

// ─── Lifecycle State ─────────────────────────────────────────────────

/// The lifecycle state of an account. Exactly one applies at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Account can log in and act.
    Active,
    /// Access suspended; reversible.
    Deactivated,
    /// Terminal. The record is retained but no transition leaves it.
    SoftDeleted,
}

impl LifecycleState {
    /// All states in declaration order.
    pub const ALL: [LifecycleState; 3] = [
        LifecycleState::Active,
        LifecycleState::Deactivated,
        LifecycleState::SoftDeleted,
    ];

    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::SoftDeleted)
    }

    /// States reachable from this one in a single transition.
    pub fn valid_transitions(&self) -> &'static [LifecycleState] {
        match self {
            Self::Active => &[Self::Deactivated, Self::SoftDeleted],
            Self::Deactivated => &[Self::Active, Self::SoftDeleted],
            Self::SoftDeleted => &[],
        }
    }

    /// Machine-readable name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deactivated => "deactivated",
            Self::SoftDeleted => "soft_deleted",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("ACTIVE"),
            Self::Deactivated => f.write_str("DEACTIVATED"),
            Self::SoftDeleted => f.write_str("SOFT_DELETED"),
        }
    }
}

impl FromStr for LifecycleState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "active" => Ok(Self::Active),
            "deactivated" => Ok(Self::Deactivated),
            "soft_deleted" | "softdeleted" | "deleted" => Ok(Self::SoftDeleted),
            _ => Err(ValidationError::UnknownLifecycleState(s.to_string())),
        }
    }
}

// ─── Transitions ─────────────────────────────────────────────────────

/// The kind of a legal transition, used for metrics labels and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// `Active → Deactivated`.
    Deactivate,
    /// `Deactivated → Active`.
    Reactivate,
    /// `Active | Deactivated → SoftDeleted`.
    SoftDelete,
}

impl TransitionKind {
    /// Label used in metrics and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deactivate => "deactivate",
            Self::Reactivate => "reactivate",
            Self::SoftDelete => "soft_delete",
        }
    }
}

/// A requested lifecycle edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    /// State the caller expects the account to be in.
    pub from: LifecycleState,
    /// State the caller wants the account to move to.
    pub to: LifecycleState,
}

impl Transition {
    /// `Active → Deactivated`.
    pub const DEACTIVATE: Transition = Transition::new(LifecycleState::Active, LifecycleState::Deactivated);
    /// `Deactivated → Active`.
    pub const REACTIVATE: Transition = Transition::new(LifecycleState::Deactivated, LifecycleState::Active);
    /// `Active → SoftDeleted`.
    pub const DELETE_ACTIVE: Transition = Transition::new(LifecycleState::Active, LifecycleState::SoftDeleted);
    /// `Deactivated → SoftDeleted`.
    pub const DELETE_DEACTIVATED: Transition =
        Transition::new(LifecycleState::Deactivated, LifecycleState::SoftDeleted);

    /// The four legal edges.
    pub const LEGAL: [Transition; 4] = [
        Self::DEACTIVATE,
        Self::REACTIVATE,
        Self::DELETE_ACTIVE,
        Self::DELETE_DEACTIVATED,
    ];

    /// Build a (possibly illegal) edge.
    pub const fn new(from: LifecycleState, to: LifecycleState) -> Self {
        Self { from, to }
    }

    /// The legal edge `from → to`, or `None` if the state machine has no
    /// such edge.
    pub fn between(from: LifecycleState, to: LifecycleState) -> Option<Self> {
        let candidate = Self::new(from, to);
        candidate.is_legal().then_some(candidate)
    }

    /// Whether this edge exists in the state machine.
    pub fn is_legal(&self) -> bool {
        self.from.valid_transitions().contains(&self.to)
    }

    /// The kind of this edge, if legal.
    pub fn kind(&self) -> Option<TransitionKind> {
        use LifecycleState::*;
        match (self.from, self.to) {
            (Active, Deactivated) => Some(TransitionKind::Deactivate),
            (Deactivated, Active) => Some(TransitionKind::Reactivate),
            (Active, SoftDeleted) | (Deactivated, SoftDeleted) => Some(TransitionKind::SoftDelete),
            _ => None,
        }
    }

    /// Whether committing this edge takes the account out of `Active`.
    pub fn leaves_active(&self) -> bool {
        self.from == LifecycleState::Active && self.to != LifecycleState::Active
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
