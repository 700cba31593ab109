//! # Audit Subcommand
//!
//! Offline operations on an exported audit chain (a JSON array of entries
//! in sequence order, as written by `fleetctl transition --export-audit`).
//!
//! - `verify`: recompute every digest and link; exit `1` if anything fails.
//! - `show`: print entries newest first, optionally for one target.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use fleet_core::AccountId;
use fleet_lifecycle::audit::newest_first;
use fleet_lifecycle::{outcome_counts, verify_chain, AuditEntry};

/// Arguments for `fleetctl audit`.
#[derive(Args, Debug)]
pub struct AuditArgs {
    #[command(subcommand)]
    pub command: AuditCommand,
}

/// Audit subcommands.
#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    /// Verify the hash chain of an exported audit log.
    Verify {
        /// Exported audit log (JSON).
        #[arg(long)]
        file: PathBuf,
    },

    /// Print audit history, newest first.
    Show {
        /// Exported audit log (JSON).
        #[arg(long)]
        file: PathBuf,
        /// Only entries targeting this account.
        #[arg(long)]
        target: Option<AccountId>,
    },
}

/// Execute the audit subcommand.
pub fn run_audit(args: &AuditArgs) -> Result<u8> {
    match &args.command {
        AuditCommand::Verify { file } => cmd_verify(file),
        AuditCommand::Show { file, target } => cmd_show(file, target.as_ref()),
    }
}

fn load(path: &Path) -> Result<Vec<AuditEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read audit log {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse audit log {}", path.display()))
}

fn cmd_verify(path: &Path) -> Result<u8> {
    let entries = load(path)?;
    let report = verify_chain(&entries)?;
    let counts = outcome_counts(&entries);

    if report.is_valid() {
        println!(
            "OK: {} entries verified ({} committed, {} blocked)",
            report.total_entries,
            counts.committed,
            counts.blocked_total()
        );
        return Ok(0);
    }

    println!("FAIL: audit chain integrity check failed");
    for seq in &report.tampered {
        println!("  entry {seq}: digest mismatch");
    }
    for seq in &report.broken_links {
        println!("  entry {seq}: previous_hash does not match preceding entry");
    }
    for seq in &report.sequence_gaps {
        println!("  entry {seq}: sequence out of order");
    }
    Ok(1)
}

fn cmd_show(path: &Path, target: Option<&AccountId>) -> Result<u8> {
    let mut entries = load(path)?;
    if let Some(target) = target {
        entries.retain(|e| e.target == *target);
    }
    newest_first(&mut entries);

    for e in &entries {
        println!(
            "[{}] {} {} {} -> {}: {}{}",
            e.sequence,
            e.recorded_at,
            e.actor,
            e.target,
            e.transition,
            e.reason_code(),
            e.note.as_deref().map(|n| format!(" ({n})")).unwrap_or_default()
        );
    }
    Ok(0)
}
