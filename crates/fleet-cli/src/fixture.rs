//! # Fleet Fixtures
//!
//! YAML description of a fleet (accounts, work assignments, live sessions
//! and optional engine configuration) loaded into the in-memory backends.
//!
//! ```yaml
//! config:
//!   rate_limit: { max_operations: 10, window_secs: 60 }
//! accounts:
//!   - id: 6f1c...
//!     username: ops-admin
//!     role: administrator
//!   - id: 0a9e...
//!     username: driver-17
//!     role: driver
//!     state: deactivated
//! work_assignments:
//!   - id: 3b2d...
//!     creator: 6f1c...
//!     assignee: 0a9e...
//!     status: pending
//! sessions:
//!   - account: 0a9e...
//!     count: 2
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use fleet_core::{AccountId, Role, Timestamp};
use fleet_lifecycle::{
    Account, LifecycleConfig, LifecycleState, MemorySessionStore, MemoryStore, WorkAssignment,
};
use serde::{Deserialize, Serialize};

/// A fleet loaded from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetFixture {
    /// Engine configuration. Falls back to the environment when absent.
    #[serde(default)]
    pub config: Option<LifecycleConfig>,
    /// Provisioned accounts.
    pub accounts: Vec<FixtureAccount>,
    /// Work assignments referencing the accounts.
    #[serde(default)]
    pub work_assignments: Vec<WorkAssignment>,
    /// Live sessions per account.
    #[serde(default)]
    pub sessions: Vec<FixtureSessions>,
}

/// One account in a fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureAccount {
    pub id: AccountId,
    pub username: String,
    pub role: Role,
    #[serde(default = "default_state")]
    pub state: LifecycleState,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// Live sessions held by one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSessions {
    pub account: AccountId,
    #[serde(default = "default_session_count")]
    pub count: usize,
}

fn default_state() -> LifecycleState {
    LifecycleState::Active
}

fn default_session_count() -> usize {
    1
}

impl FleetFixture {
    /// Read and parse a fixture file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        let fixture: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse fixture {}", path.display()))?;
        fixture.check()?;
        Ok(fixture)
    }

    /// Reject duplicate account ids.
    fn check(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for account in &self.accounts {
            if !seen.insert(account.id) {
                bail!("duplicate account id in fixture: {}", account.id);
            }
        }
        Ok(())
    }

    /// The configuration to run with: the fixture's own, else the
    /// environment's.
    pub fn resolve_config(&self) -> Result<LifecycleConfig> {
        match self.config {
            Some(config) => {
                config
                    .validate()
                    .context("invalid lifecycle configuration in fixture")?;
                Ok(config)
            }
            None => LifecycleConfig::from_env().context("invalid lifecycle configuration in environment"),
        }
    }

    /// Look up an account by id.
    pub fn account(&self, id: &AccountId) -> Option<&FixtureAccount> {
        self.accounts.iter().find(|a| a.id == *id)
    }

    /// Populate fresh in-memory backends.
    pub fn materialize(&self, now: Timestamp) -> (MemoryStore, Arc<MemorySessionStore>) {
        let store = MemoryStore::new();
        for a in &self.accounts {
            let mut account = Account::new(a.id, a.username.clone(), a.role, a.created_at.unwrap_or(now));
            account.state = a.state;
            store.insert_account(account);
        }
        for w in &self.work_assignments {
            store.insert_work_assignment(w.clone());
        }

        let sessions = Arc::new(MemorySessionStore::new());
        for s in &self.sessions {
            for _ in 0..s.count {
                sessions.open(s.account, now);
            }
        }
        (store, sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_lifecycle::{LifecycleStore, SessionStore};

    const FIXTURE: &str = r#"
config:
  rate_limit:
    max_operations: 5
    window_secs: 30
accounts:
  - id: 11111111-1111-4111-8111-111111111111
    username: admin
    role: administrator
  - id: 22222222-2222-4222-8222-222222222222
    username: driver
    role: driver
    state: deactivated
work_assignments:
  - id: 33333333-3333-4333-8333-333333333333
    creator: 11111111-1111-4111-8111-111111111111
    assignee: 22222222-2222-4222-8222-222222222222
    status: in_progress
sessions:
  - account: 11111111-1111-4111-8111-111111111111
    count: 2
"#;

    fn write(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_fixture_with_defaults() {
        let file = write(FIXTURE);
        let fixture = FleetFixture::load(file.path()).unwrap();
        assert_eq!(fixture.accounts.len(), 2);
        assert_eq!(fixture.accounts[0].state, LifecycleState::Active);
        assert_eq!(fixture.accounts[1].state, LifecycleState::Deactivated);
        let config = fixture.resolve_config().unwrap();
        assert_eq!(config.rate_limit.max_operations, 5);
        assert_eq!(config.session_retry.max_attempts, 3);
    }

    #[test]
    fn materializes_backends() {
        let file = write(FIXTURE);
        let fixture = FleetFixture::load(file.path()).unwrap();
        let (store, sessions) = fixture.materialize(Timestamp::now());

        let admin: AccountId = "11111111-1111-4111-8111-111111111111".parse().unwrap();
        let driver: AccountId = "22222222-2222-4222-8222-222222222222".parse().unwrap();
        assert_eq!(
            store.account(&driver).unwrap().unwrap().state,
            LifecycleState::Deactivated
        );
        assert_eq!(sessions.live_sessions(&admin).unwrap(), 2);
        assert_eq!(sessions.live_sessions(&driver).unwrap(), 0);
    }

    #[test]
    fn duplicate_accounts_are_rejected() {
        let file = write(
            r#"
accounts:
  - id: 11111111-1111-4111-8111-111111111111
    username: a
    role: viewer
  - id: 11111111-1111-4111-8111-111111111111
    username: b
    role: viewer
"#,
        );
        let err = FleetFixture::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate account id"));
    }

    #[test]
    fn zero_rate_window_is_rejected() {
        let file = write(
            r#"
config:
  rate_limit: { max_operations: 1, window_secs: 0 }
accounts: []
"#,
        );
        let fixture = FleetFixture::load(file.path()).unwrap();
        let err = fixture.resolve_config().unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("invalid lifecycle configuration in fixture"));
        assert!(msg.contains("rate_limit.window_secs"));
    }

    #[test]
    fn zero_rate_limit_is_rejected() {
        let file = write(
            r#"
config:
  rate_limit: { max_operations: 0, window_secs: 60 }
accounts: []
"#,
        );
        let fixture = FleetFixture::load(file.path()).unwrap();
        assert!(fixture.resolve_config().is_err());
    }

    #[test]
    fn missing_file_names_path() {
        let err = FleetFixture::load(Path::new("/nonexistent/fleet.yaml")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/fleet.yaml"));
    }
}
