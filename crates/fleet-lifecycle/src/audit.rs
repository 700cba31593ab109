//! # Lifecycle Audit Trail
//!
//! Every lifecycle attempt, committed or blocked, appends exactly one
//! [`AuditEntry`]. Entries are sealed with a SHA-256 digest that chains to
//! the previous entry, forming a tamper-evident log that can be exported
//! and re-verified offline with [`verify_chain`].
//!
//! Appending is the responsibility of the store transaction
//! ([`crate::store::StoreTransaction::append_audit`]), so the audit write
//! commits or rolls back together with the state change it describes.

use std::collections::BTreeMap;

use fleet_core::{AccountId, Timestamp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::outcome::Rejection;
use crate::state::Transition;

/// Previous-hash value of the first entry in a chain.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Outcome of a lifecycle attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The transition was applied.
    Committed,
    /// The transition was rejected; see the entry's reason.
    Blocked,
}

/// An audit record before it is sealed into the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditDraft {
    /// When the attempt was made.
    pub recorded_at: Timestamp,
    /// Account performing the attempt.
    pub actor: AccountId,
    /// Account the attempt targets.
    pub target: AccountId,
    /// The requested edge.
    pub transition: Transition,
    /// Committed or blocked.
    pub outcome: AuditOutcome,
    /// Structured reason, present exactly when blocked.
    pub reason: Option<Rejection>,
    /// Free-text note supplied by the actor.
    pub note: Option<String>,
}

impl AuditDraft {
    /// Draft for a committed transition.
    pub fn committed(
        recorded_at: Timestamp,
        actor: AccountId,
        target: AccountId,
        transition: Transition,
        note: Option<String>,
    ) -> Self {
        Self {
            recorded_at,
            actor,
            target,
            transition,
            outcome: AuditOutcome::Committed,
            reason: None,
            note,
        }
    }

    /// Draft for a blocked attempt.
    pub fn blocked(
        recorded_at: Timestamp,
        actor: AccountId,
        target: AccountId,
        transition: Transition,
        reason: Rejection,
        note: Option<String>,
    ) -> Self {
        Self {
            recorded_at,
            actor,
            target,
            transition,
            outcome: AuditOutcome::Blocked,
            reason: Some(reason),
            note,
        }
    }
}

/// A sealed, immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the log, starting at 1.
    pub sequence: u64,
    /// When the attempt was made.
    pub recorded_at: Timestamp,
    /// Account performing the attempt.
    pub actor: AccountId,
    /// Account the attempt targets.
    pub target: AccountId,
    /// The requested edge.
    pub transition: Transition,
    /// Committed or blocked.
    pub outcome: AuditOutcome,
    /// Structured reason when blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Rejection>,
    /// Free-text note supplied by the actor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Digest of the preceding entry, or [`GENESIS_HASH`].
    pub previous_hash: String,
    /// Digest of this entry.
    pub entry_hash: String,
}

/// The hashed portion of an entry: everything except `entry_hash`.
#[derive(Serialize)]
struct SealedBody<'a> {
    sequence: u64,
    recorded_at: &'a Timestamp,
    actor: &'a AccountId,
    target: &'a AccountId,
    transition: &'a Transition,
    outcome: AuditOutcome,
    reason: &'a Option<Rejection>,
    note: &'a Option<String>,
    previous_hash: &'a str,
}

impl AuditEntry {
    /// Seal a draft at `sequence`, chaining to `previous_hash`.
    pub fn seal(
        draft: AuditDraft,
        sequence: u64,
        previous_hash: &str,
    ) -> Result<Self, serde_json::Error> {
        let mut entry = Self {
            sequence,
            recorded_at: draft.recorded_at,
            actor: draft.actor,
            target: draft.target,
            transition: draft.transition,
            outcome: draft.outcome,
            reason: draft.reason,
            note: draft.note,
            previous_hash: previous_hash.to_string(),
            entry_hash: String::new(),
        };
        entry.entry_hash = entry.compute_hash()?;
        Ok(entry)
    }

    /// Recompute this entry's digest from its contents.
    pub fn compute_hash(&self) -> Result<String, serde_json::Error> {
        let body = SealedBody {
            sequence: self.sequence,
            recorded_at: &self.recorded_at,
            actor: &self.actor,
            target: &self.target,
            transition: &self.transition,
            outcome: self.outcome,
            reason: &self.reason,
            note: &self.note,
            previous_hash: &self.previous_hash,
        };
        let bytes = serde_json::to_vec(&body)?;
        Ok(sha256_hex(&bytes))
    }

    /// Machine-readable reason code: `committed` or the rejection code.
    pub fn reason_code(&self) -> &'static str {
        match &self.reason {
            Some(reason) => reason.code(),
            None => "committed",
        }
    }
}

// ─── Chain Verification ──────────────────────────────────────────────

/// Result of verifying an exported audit chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainIntegrityReport {
    /// Entries examined.
    pub total_entries: usize,
    /// Sequences whose `previous_hash` does not match the preceding entry.
    pub broken_links: Vec<u64>,
    /// Sequences whose contents no longer match their `entry_hash`.
    pub tampered: Vec<u64>,
    /// Sequences that are out of order or skipped.
    pub sequence_gaps: Vec<u64>,
}

impl ChainIntegrityReport {
    /// Whether the chain verified cleanly.
    pub fn is_valid(&self) -> bool {
        self.broken_links.is_empty() && self.tampered.is_empty() && self.sequence_gaps.is_empty()
    }
}

/// Verify entries in log order (ascending sequence).
pub fn verify_chain(entries: &[AuditEntry]) -> Result<ChainIntegrityReport, serde_json::Error> {
    let mut report = ChainIntegrityReport {
        total_entries: entries.len(),
        broken_links: Vec::new(),
        tampered: Vec::new(),
        sequence_gaps: Vec::new(),
    };

    let mut expected_prev = GENESIS_HASH;
    let mut expected_seq = entries.first().map(|e| e.sequence).unwrap_or(1);

    for entry in entries {
        if entry.sequence != expected_seq {
            report.sequence_gaps.push(entry.sequence);
        }
        if entry.previous_hash != expected_prev {
            report.broken_links.push(entry.sequence);
        }
        if entry.compute_hash()? != entry.entry_hash {
            report.tampered.push(entry.sequence);
        }
        expected_prev = &entry.entry_hash;
        expected_seq = entry.sequence + 1;
    }

    Ok(report)
}

// ─── Query Helpers ───────────────────────────────────────────────────

/// Aggregate outcome counts for dashboards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    /// Committed transitions.
    pub committed: u64,
    /// Blocked attempts keyed by rejection code.
    pub blocked: BTreeMap<String, u64>,
}

impl OutcomeCounts {
    /// Total blocked attempts across all reasons.
    pub fn blocked_total(&self) -> u64 {
        self.blocked.values().sum()
    }
}

/// Count committed and blocked entries.
pub fn outcome_counts<'a>(entries: impl IntoIterator<Item = &'a AuditEntry>) -> OutcomeCounts {
    let mut counts = OutcomeCounts::default();
    for entry in entries {
        match entry.outcome {
            AuditOutcome::Committed => counts.committed += 1,
            AuditOutcome::Blocked => {
                *counts.blocked.entry(entry.reason_code().to_string()).or_default() += 1;
            }
        }
    }
    counts
}

/// Order entries newest first (timestamp, then sequence).
pub fn newest_first(entries: &mut [AuditEntry]) {
    entries.sort_by(|a, b| {
        b.recorded_at
            .cmp(&a.recorded_at)
            .then_with(|| b.sequence.cmp(&a.sequence))
    });
}

/// Compute SHA-256 hex digest of the input bytes.
fn sha256_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    let result = hasher.finalize();
    result.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize) -> Vec<AuditEntry> {
        let actor = AccountId::new();
        let target = AccountId::new();
        let mut prev = GENESIS_HASH.to_string();
        let mut out = Vec::new();
        for i in 0..n {
            let draft = if i % 2 == 0 {
                AuditDraft::committed(Timestamp::now(), actor, target, Transition::DEACTIVATE, None)
            } else {
                AuditDraft::blocked(
                    Timestamp::now(),
                    actor,
                    target,
                    Transition::DEACTIVATE,
                    Rejection::SelfModificationForbidden,
                    Some("retry".into()),
                )
            };
            let entry = AuditEntry::seal(draft, i as u64 + 1, &prev).unwrap();
            prev = entry.entry_hash.clone();
            out.push(entry);
        }
        out
    }

    #[test]
    fn sealed_hash_is_hex_sha256() {
        let e = &chain(1)[0];
        assert_eq!(e.entry_hash.len(), 64);
        assert!(e.entry_hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(e.previous_hash, GENESIS_HASH);
    }

    #[test]
    fn intact_chain_verifies() {
        let report = verify_chain(&chain(5)).unwrap();
        assert!(report.is_valid(), "{report:?}");
        assert_eq!(report.total_entries, 5);
    }

    #[test]
    fn empty_chain_is_valid() {
        assert!(verify_chain(&[]).unwrap().is_valid());
    }

    #[test]
    fn edited_entry_is_detected() {
        let mut entries = chain(3);
        entries[1].note = Some("nothing to see".into());
        let report = verify_chain(&entries).unwrap();
        assert_eq!(report.tampered, vec![2]);
        assert!(report.broken_links.is_empty());
    }

    #[test]
    fn removed_entry_breaks_link() {
        let mut entries = chain(4);
        entries.remove(1);
        let report = verify_chain(&entries).unwrap();
        assert!(!report.is_valid());
        assert_eq!(report.broken_links, vec![3]);
        assert_eq!(report.sequence_gaps, vec![3]);
    }

    #[test]
    fn counts_by_reason() {
        let counts = outcome_counts(&chain(5));
        assert_eq!(counts.committed, 3);
        assert_eq!(counts.blocked.get("self_modification_forbidden"), Some(&2));
        assert_eq!(counts.blocked_total(), 2);
    }

    #[test]
    fn newest_first_breaks_ties_by_sequence() {
        let mut entries = chain(3);
        let ts = Timestamp::now();
        for e in &mut entries {
            e.recorded_at = ts;
        }
        newest_first(&mut entries);
        let seqs: Vec<u64> = entries.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![3, 2, 1]);
    }

    #[test]
    fn exported_chain_survives_json() {
        let entries = chain(3);
        let json = serde_json::to_string(&entries).unwrap();
        let back: Vec<AuditEntry> = serde_json::from_str(&json).unwrap();
        assert!(verify_chain(&back).unwrap().is_valid());
    }
}
