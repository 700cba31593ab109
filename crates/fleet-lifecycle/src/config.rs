//! # Lifecycle Configuration
//!
//! Tunables for the rate limiter and session cleanup, loadable from the
//! environment or from a fixture file.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Maximum lifecycle operations per actor per window.
pub const RATE_LIMIT_ENV: &str = "FLEET_LIFECYCLE_RATE_LIMIT";
/// Window length in seconds.
pub const RATE_WINDOW_ENV: &str = "FLEET_LIFECYCLE_RATE_WINDOW_SECS";
/// Session revocation attempts before escalation.
pub const SESSION_RETRY_ENV: &str = "FLEET_SESSION_RETRY_ATTEMPTS";

/// Sliding-window rate limit applied to lifecycle operations per actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum operations admitted per window.
    pub max_operations: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_operations: 30,
            window_secs: 60,
        }
    }
}

/// Retry policy for session invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRetryConfig {
    /// Attempts before the account is escalated to the pending queue.
    pub max_attempts: u32,
}

impl Default for SessionRetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Configuration of the lifecycle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Per-actor rate limit.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Session invalidation retry policy.
    #[serde(default)]
    pub session_retry: SessionRetryConfig,
}

impl LifecycleConfig {
    /// Build configuration from process environment variables, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            rate_limit: RateLimitConfig {
                max_operations: positive(&lookup, RATE_LIMIT_ENV)?
                    .unwrap_or(defaults.rate_limit.max_operations),
                window_secs: positive(&lookup, RATE_WINDOW_ENV)?
                    .unwrap_or(defaults.rate_limit.window_secs),
            },
            session_retry: SessionRetryConfig {
                max_attempts: positive(&lookup, SESSION_RETRY_ENV)?
                    .unwrap_or(defaults.session_retry.max_attempts),
            },
        })
    }

    /// Reject zero-valued settings. Deserialized configuration must pass
    /// through here before it reaches the engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        nonzero("rate_limit.max_operations", u64::from(self.rate_limit.max_operations))?;
        nonzero("rate_limit.window_secs", self.rate_limit.window_secs)?;
        nonzero("session_retry.max_attempts", u64::from(self.session_retry.max_attempts))?;
        Ok(())
    }
}

fn nonzero(key: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Parse an optional strictly positive integer setting.
fn positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value: T = raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.clone(),
        reason: e.to_string(),
    })?;
    if value == T::default() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Some(value))
}
