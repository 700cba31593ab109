#![deny(missing_docs)]

//! # fleet-core: Foundational Types for the Fleet Account Lifecycle
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies, only `serde`, `thiserror`,
//! `chrono`, `uuid`, and `parking_lot` from the ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** You cannot pass a [`SessionId`]
//!    where an [`AccountId`] is expected.
//!
//! 2. **Single closed [`Role`] enum.** Role checks are exhaustive `match`
//!    expressions, never string comparisons.
//!
//! 3. **Time is a capability.** Components that need "now" receive a
//!    [`Clock`] rather than calling the system clock directly, so rate
//!    windows and lifecycle stamps are deterministic under test.
//!
//! 4. **Typed [`ValidationError`].** Parse failures carry the rejected
//!    input; no `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod clock;
pub mod error;
pub mod identity;
pub mod role;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ValidationError;
pub use identity::{AccountId, SessionId, WorkAssignmentId};
pub use role::Role;
pub use temporal::Timestamp;
