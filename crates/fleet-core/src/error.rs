//! # Validation Errors
//!
//! Validation errors shared by the fleet crates, built with `thiserror`.
//!
//! Variants carry the rejected input so operators can diagnose bad fixtures
//! or malformed requests without guesswork.

use thiserror::Error;

/// Validation errors for identifiers and enumerations parsed from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier is not a UUID.
    #[error("invalid {kind} identifier: \"{value}\" (expected a UUID)")]
    InvalidIdentifier {
        /// Which identifier type was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Role name is not one of the closed role set.
    #[error("unknown role: \"{0}\" (expected administrator, manager, driver or viewer)")]
    UnknownRole(String),

    /// Lifecycle state name is not recognised.
    #[error("unknown lifecycle state: \"{0}\" (expected active, deactivated or soft_deleted)")]
    UnknownLifecycleState(String),

    /// Timestamp string is not valid RFC 3339.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_identifier_display_names_kind() {
        let err = ValidationError::InvalidIdentifier {
            kind: "account",
            value: "nope".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("account"));
        assert!(msg.contains("nope"));
    }

    #[test]
    fn unknown_role_names_input() {
        let err = ValidationError::UnknownRole("root".to_string());
        assert!(err.to_string().contains("\"root\""));
    }

    #[test]
    fn invalid_timestamp_display() {
        let err = ValidationError::InvalidTimestamp {
            value: "yesterday".to_string(),
            reason: "parse failed".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("yesterday"));
        assert!(msg.contains("parse failed"));
    }
}
