//! Error types for wallet ledger storage.

use wallet_ledger_core::LedgerError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be decoded into a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// A write violated a schema constraint.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The operation did not finish before its deadline.
    #[error("operation timed out")]
    Timeout,
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        Self::storage(err)
    }
}
