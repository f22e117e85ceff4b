//! Error types for the wallet ledger.

use crate::ids::{IdError, UserId};

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Boxed error coming from the backing store.
pub type StorageSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Amount was zero or negative.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    /// Referenced wallet does not exist.
    #[error("wallet not found: {user_id}")]
    WalletNotFound {
        /// The user ID that was not found.
        user_id: UserId,
    },

    /// A conditional debit found insufficient funds.
    #[error("not enough balance: user={user_id}, required={required}")]
    NotEnoughBalance {
        /// The wallet that was debited.
        user_id: UserId,
        /// Amount that was requested.
        required: i64,
    },

    /// Transfer source and destination are the same wallet.
    #[error("transfer to self: {user_id}")]
    TransferToSelf {
        /// The user on both sides of the transfer.
        user_id: UserId,
    },

    /// Missing account identifier.
    #[error("user id is required")]
    UserIdRequired,

    /// The backing store failed; the enclosing transaction was rolled back.
    #[error("storage error: {0}")]
    Storage(#[source] StorageSource),
}

/// Fieldless discriminant of [`LedgerError`], for mapping to wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`LedgerError::InvalidAmount`].
    InvalidAmount,
    /// See [`LedgerError::WalletNotFound`].
    WalletNotFound,
    /// See [`LedgerError::NotEnoughBalance`].
    NotEnoughBalance,
    /// See [`LedgerError::TransferToSelf`].
    TransferToSelf,
    /// See [`LedgerError::UserIdRequired`].
    UserIdRequired,
    /// See [`LedgerError::Storage`].
    StoreFailure,
}

impl LedgerError {
    /// Wrap a store failure.
    pub fn storage(err: impl Into<StorageSource>) -> Self {
        Self::Storage(err.into())
    }

    /// The kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Self::WalletNotFound { .. } => ErrorKind::WalletNotFound,
            Self::NotEnoughBalance { .. } => ErrorKind::NotEnoughBalance,
            Self::TransferToSelf { .. } => ErrorKind::TransferToSelf,
            Self::UserIdRequired => ErrorKind::UserIdRequired,
            Self::Storage(_) => ErrorKind::StoreFailure,
        }
    }
}

impl From<IdError> for LedgerError {
    fn from(err: IdError) -> Self {
        match err {
            IdError::EmptyUserId => Self::UserIdRequired,
        }
    }
}
