//! # Transition Subcommand
//!
//! Runs one lifecycle request against a fleet fixture and prints the
//! outcome as JSON. The fixture file itself is never modified; pass
//! `--export-audit` to keep the resulting audit chain.
//!
//! Exit codes: `0` committed, `2` blocked.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use fleet_core::{AccountId, Timestamp};
use fleet_lifecycle::{
    LifecycleEngine, LifecycleState, MemoryStore, Transition, TransitionOutcome, TransitionRequest,
};

use crate::fixture::FleetFixture;

/// Arguments for `fleetctl transition`.
#[derive(Args, Debug)]
pub struct TransitionArgs {
    /// Path to the YAML fleet fixture.
    #[arg(long)]
    pub fixture: PathBuf,

    /// Account performing the change.
    #[arg(long)]
    pub actor: AccountId,

    /// Account being changed.
    #[arg(long)]
    pub target: AccountId,

    /// Desired state (active, deactivated, soft_deleted).
    #[arg(long)]
    pub to: LifecycleState,

    /// Expected current state. Defaults to the target's state in the fixture.
    #[arg(long)]
    pub from: Option<LifecycleState>,

    /// Free-text justification recorded on the audit entry.
    #[arg(long)]
    pub note: Option<String>,

    /// Write the resulting audit chain to this file as JSON.
    #[arg(long)]
    pub export_audit: Option<PathBuf>,
}

/// Execute the transition subcommand.
pub fn run_transition(args: &TransitionArgs) -> Result<u8> {
    let fixture = FleetFixture::load(&args.fixture)?;
    let config = fixture.resolve_config()?;

    let from = match args.from {
        Some(from) => from,
        None => fixture
            .account(&args.target)
            .map(|a| a.state)
            .with_context(|| format!("target account {} is not in the fixture", args.target))?,
    };

    let (store, sessions) = fixture.materialize(Timestamp::now());
    let engine = LifecycleEngine::new(store, sessions, &config);

    let mut request = TransitionRequest::new(args.actor, args.target, Transition::new(from, args.to));
    if let Some(note) = &args.note {
        request = request.with_note(note.clone());
    }
    tracing::debug!(?request, "submitting lifecycle request");

    let outcome = engine
        .request_transition(request)
        .context("lifecycle request failed")?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if let Some(path) = &args.export_audit {
        export_audit(&engine, path)?;
    }

    Ok(match outcome {
        TransitionOutcome::Committed(_) => 0,
        TransitionOutcome::Blocked(_) => 2,
    })
}

fn export_audit(engine: &LifecycleEngine<MemoryStore>, path: &Path) -> Result<()> {
    let log = engine.audit_log()?;
    let json = serde_json::to_string_pretty(&log)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write audit export {}", path.display()))?;
    tracing::info!(entries = log.len(), path = %path.display(), "audit chain exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_lifecycle::{verify_chain, AuditEntry};

    const ADMIN: &str = "11111111-1111-4111-8111-111111111111";
    const DRIVER: &str = "22222222-2222-4222-8222-222222222222";

    fn fixture(dir: &Path, driver_work: &str) -> PathBuf {
        let path = dir.join("fleet.yaml");
        let yaml = format!(
            r#"
config:
  rate_limit: {{ max_operations: 10, window_secs: 60 }}
accounts:
  - id: {ADMIN}
    username: admin
    role: administrator
  - id: {DRIVER}
    username: driver
    role: driver
work_assignments:
  - id: 33333333-3333-4333-8333-333333333333
    creator: {ADMIN}
    assignee: {DRIVER}
    status: {driver_work}
"#
        );
        std::fs::write(&path, yaml).unwrap();
        path
    }

    fn args(fixture: PathBuf, actor: &str, target: &str, to: LifecycleState) -> TransitionArgs {
        TransitionArgs {
            fixture,
            actor: actor.parse().unwrap(),
            target: target.parse().unwrap(),
            to,
            from: None,
            note: None,
            export_audit: None,
        }
    }

    #[test]
    fn committed_transition_exits_zero_and_exports_chain() {
        let dir = tempfile::tempdir().unwrap();
        let export = dir.path().join("audit.json");
        let mut a = args(
            fixture(dir.path(), "completed"),
            ADMIN,
            DRIVER,
            LifecycleState::Deactivated,
        );
        a.note = Some("seasonal".into());
        a.export_audit = Some(export.clone());

        assert_eq!(run_transition(&a).unwrap(), 0);

        let log: Vec<AuditEntry> =
            serde_json::from_str(&std::fs::read_to_string(&export).unwrap()).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].note.as_deref(), Some("seasonal"));
        assert!(verify_chain(&log).unwrap().is_valid());
    }

    #[test]
    fn blocked_transition_exits_two() {
        let dir = tempfile::tempdir().unwrap();
        let a = args(
            fixture(dir.path(), "pending"),
            ADMIN,
            DRIVER,
            LifecycleState::SoftDeleted,
        );
        assert_eq!(run_transition(&a).unwrap(), 2);
    }

    #[test]
    fn explicit_from_overrides_fixture_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(
            fixture(dir.path(), "completed"),
            ADMIN,
            DRIVER,
            LifecycleState::Active,
        );
        a.from = Some(LifecycleState::Deactivated);
        assert_eq!(run_transition(&a).unwrap(), 2);
    }

    #[test]
    fn unknown_target_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = args(
            fixture(dir.path(), "completed"),
            ADMIN,
            "44444444-4444-4444-8444-444444444444",
            LifecycleState::Deactivated,
        );
        let err = run_transition(&a).unwrap_err();
        assert!(err.to_string().contains("not in the fixture"));
    }
}
