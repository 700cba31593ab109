//! # Lifecycle Metrics
//!
//! Prometheus counters for committed transitions, blocked attempts and
//! session-revocation escalations, exposed in text format via
//! [`LifecycleMetrics::render`].

use std::sync::Arc;

use prometheus::{core::Collector, Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Shared lifecycle metrics backed by a Prometheus registry.
#[derive(Clone)]
pub struct LifecycleMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    transitions_committed_total: IntCounterVec,
    transitions_blocked_total: IntCounterVec,
    session_escalations_total: IntCounter,
}

impl std::fmt::Debug for LifecycleMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleMetrics")
            .field("committed", &self.committed())
            .field("blocked", &self.blocked())
            .field("escalations", &self.escalations())
            .finish()
    }
}

impl LifecycleMetrics {
    /// Create a fresh registry with all lifecycle metrics registered.
    pub fn new() -> Self {
        let registry = Registry::new();

        let transitions_committed_total = IntCounterVec::new(
            Opts::new(
                "fleet_lifecycle_transitions_committed_total",
                "Committed account lifecycle transitions",
            ),
            &["transition"],
        )
        .expect("metric can be created");

        let transitions_blocked_total = IntCounterVec::new(
            Opts::new(
                "fleet_lifecycle_transitions_blocked_total",
                "Blocked account lifecycle attempts by reason",
            ),
            &["reason"],
        )
        .expect("metric can be created");

        let session_escalations_total = IntCounter::new(
            "fleet_lifecycle_session_escalations_total",
            "Session revocations escalated after exhausting retries",
        )
        .expect("metric can be created");

        registry
            .register(Box::new(transitions_committed_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(transitions_blocked_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(session_escalations_total.clone()))
            .expect("metric can be registered");

        Self {
            inner: Arc::new(Inner {
                registry,
                transitions_committed_total,
                transitions_blocked_total,
                session_escalations_total,
            }),
        }
    }

    /// Count a committed transition of the given kind.
    pub fn record_committed(&self, transition: &str) {
        self.inner
            .transitions_committed_total
            .with_label_values(&[transition])
            .inc();
    }

    /// Count a blocked attempt with the given rejection code.
    pub fn record_blocked(&self, reason: &str) {
        self.inner
            .transitions_blocked_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Count a session-revocation escalation.
    pub fn record_escalation(&self) {
        self.inner.session_escalations_total.inc();
    }

    /// Committed transitions across all kinds.
    pub fn committed(&self) -> u64 {
        sum_counters(&self.inner.transitions_committed_total)
    }

    /// Blocked attempts across all reasons.
    pub fn blocked(&self) -> u64 {
        sum_counters(&self.inner.transitions_blocked_total)
    }

    /// Blocked attempts for one reason code.
    pub fn blocked_for(&self, reason: &str) -> u64 {
        self.inner
            .transitions_blocked_total
            .with_label_values(&[reason])
            .get()
    }

    /// Escalated session revocations.
    pub fn escalations(&self) -> u64 {
        self.inner.session_escalations_total.get()
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn render(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

impl Default for LifecycleMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn sum_counters(vec: &IntCounterVec) -> u64 {
    let mut total = 0u64;
    for mf in &vec.collect() {
        for m in mf.get_metric() {
            total += m.get_counter().get_value() as u64;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let m = LifecycleMetrics::new();
        m.record_committed("deactivate");
        m.record_committed("soft_delete");
        m.record_blocked("rate_limited");
        m.record_escalation();
        assert_eq!(m.committed(), 2);
        assert_eq!(m.blocked(), 1);
        assert_eq!(m.blocked_for("rate_limited"), 1);
        assert_eq!(m.blocked_for("last_administrator"), 0);
        assert_eq!(m.escalations(), 1);
    }

    #[test]
    fn text_encoding_names_metrics() {
        let m = LifecycleMetrics::new();
        m.record_blocked("outstanding_work");
        let text = m.render().unwrap();
        assert!(text.contains("fleet_lifecycle_transitions_blocked_total"));
        assert!(text.contains("reason=\"outstanding_work\""));
    }

    #[test]
    fn clones_share_registry() {
        let m = LifecycleMetrics::new();
        let c = m.clone();
        c.record_committed("reactivate");
        assert_eq!(m.committed(), 1);
    }
}
