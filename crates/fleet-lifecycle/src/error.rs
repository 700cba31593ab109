//! # Lifecycle Errors
//!
//! Infrastructure failures only. Business rejections (invalid transition,
//! self-modification, rate limiting, constraint violations) are values of
//! [`crate::outcome::Rejection`], never errors.

use fleet_core::AccountId;
use thiserror::Error;

/// Failure of the account/audit store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or refused a transaction.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The audit log refused an append. State changes must not commit.
    #[error("audit log unavailable: {0}")]
    AuditUnavailable(String),

    /// A record could not be encoded for storage or hashing.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure of the session store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionStoreError {
    /// The session store could not be reached.
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by [`crate::engine::LifecycleEngine`].
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// The store failed; nothing was committed and the request is safe to
    /// resubmit.
    #[error("lifecycle store unavailable: {0}")]
    Unavailable(StoreError),

    /// The audit log refused the write; the transaction was rolled back.
    #[error("audit log unavailable: {0}")]
    AuditUnavailable(String),

    /// The target account does not exist.
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AuditUnavailable(reason) => Self::AuditUnavailable(reason),
            other => Self::Unavailable(other),
        }
    }
}

impl LifecycleError {
    /// Whether the caller should retry automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Invalid lifecycle configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting could not be parsed.
    #[error("invalid value for {key}: \"{value}\" ({reason})")]
    InvalidValue {
        /// The setting name.
        key: String,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_store_failures_are_retryable() {
        let unavailable = LifecycleError::from(StoreError::Unavailable("timeout".into()));
        assert!(unavailable.is_retryable());
        assert!(!LifecycleError::AccountNotFound(AccountId::new()).is_retryable());
    }

    #[test]
    fn audit_unavailable_display() {
        let err = LifecycleError::from(StoreError::AuditUnavailable("disk full".into()));
        assert!(matches!(err, LifecycleError::AuditUnavailable(_)));
        assert!(!err.is_retryable());
        let msg = err.to_string();
        assert!(msg.contains("audit log unavailable"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn config_error_names_key() {
        let err = ConfigError::InvalidValue {
            key: "FLEET_LIFECYCLE_RATE_LIMIT".into(),
            value: "lots".into(),
            reason: "not a number".into(),
        };
        assert!(err.to_string().contains("FLEET_LIFECYCLE_RATE_LIMIT"));
    }
}
