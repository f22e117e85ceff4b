//! Service configuration.

use std::env;
use std::time::Duration;

use wallet_ledger_store::config::parse_or;
use wallet_ledger_store::DatabaseConfig;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Database pool settings.
    pub database: DatabaseConfig,

    /// Deadline for a single ledger operation, in milliseconds (default: 5000).
    pub operation_timeout_ms: u64,

    /// Apply schema migrations on startup (default: true).
    pub run_migrations: bool,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the `DATABASE_URL` / `DB_*` variables of
    /// [`DatabaseConfig::from_env`] plus:
    /// - `LEDGER_OPERATION_TIMEOUT_MS`
    /// - `LEDGER_RUN_MIGRATIONS`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, using the same keys as
    /// [`ServiceConfig::from_env`].
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            database: DatabaseConfig::from_lookup(&lookup),
            operation_timeout_ms: parse_or(
                lookup("LEDGER_OPERATION_TIMEOUT_MS"),
                defaults.operation_timeout_ms,
            ),
            run_migrations: parse_or(lookup("LEDGER_RUN_MIGRATIONS"), defaults.run_migrations),
        }
    }

    /// Operation deadline as a `Duration`.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            operation_timeout_ms: 5000,
            run_migrations: true,
        }
    }
}
