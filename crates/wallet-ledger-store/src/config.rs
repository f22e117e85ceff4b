//! Database connection configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default connection string for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgres://postgres@localhost/wallet_ledger";

/// PostgreSQL pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum number of connections in the pool.
    pub max_connections: u32,

    /// Minimum number of connections in the pool.
    pub min_connections: u32,

    /// How long to wait for a free connection, in seconds.
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds.
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds.
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables.
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 20)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 2)
    /// - `DB_ACQUIRE_TIMEOUT`: Acquire timeout in seconds (default: 10)
    /// - `DB_IDLE_TIMEOUT`: Idle timeout in seconds (default: 600)
    /// - `DB_MAX_LIFETIME`: Max lifetime in seconds (default: 1800)
    ///
    /// Missing or unparseable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, using the same keys as
    /// [`DatabaseConfig::from_env`].
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse_or(lookup("DB_MAX_CONNECTIONS"), defaults.max_connections),
            min_connections: parse_or(lookup("DB_MIN_CONNECTIONS"), defaults.min_connections),
            acquire_timeout_secs: parse_or(
                lookup("DB_ACQUIRE_TIMEOUT"),
                defaults.acquire_timeout_secs,
            ),
            idle_timeout_secs: parse_or(lookup("DB_IDLE_TIMEOUT"), defaults.idle_timeout_secs),
            max_lifetime_secs: parse_or(lookup("DB_MAX_LIFETIME"), defaults.max_lifetime_secs),
        }
    }

    /// Acquire timeout as a `Duration`.
    #[must_use]
    pub const fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Idle timeout as a `Duration`.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Max lifetime as a `Duration`.
    #[must_use]
    pub const fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            max_connections: 20,
            min_connections: 2,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

/// Parse a trimmed configuration value, falling back to `default` when it is
/// missing or malformed.
#[must_use]
pub fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
