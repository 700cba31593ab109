//! # fleet-cli: Operator Command-Line Interface
//!
//! `fleetctl` drives the lifecycle engine from the command line against a
//! YAML fleet fixture loaded into the in-memory backends.
//!
//! ## Subcommands
//!
//! - `transition`: run one lifecycle request and print the outcome
//! - `audit verify`: check the hash chain of an exported audit log
//! - `audit show`: print audit history, newest first
//!
//! Argument parsing lives here; lifecycle rules live in `fleet-lifecycle`.

pub mod audit;
pub mod fixture;
pub mod transition;
