//! Ledger entry types.
//!
//! Entries are append-only. A deposit or withdrawal writes one entry; a
//! transfer writes a `TransferOut` entry on the source and a `TransferIn`
//! entry on the destination in the same store transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TransactionId, UserId};

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned sequence number. Increasing, not contiguous.
    pub id: i64,

    /// Idempotency key this entry was written under.
    pub transaction_id: TransactionId,

    /// Wallet the entry belongs to.
    pub user_id: UserId,

    /// Magnitude moved, always positive.
    pub amount: i64,

    /// What kind of movement this is.
    pub operation_type: OperationType,

    /// Counterparty of a transfer leg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passive_user_id: Option<UserId>,

    /// When the engine wrote the entry, at ledger precision.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Signed effect of this entry on its wallet's balance.
    #[must_use]
    pub const fn balance_delta(&self) -> i64 {
        if self.operation_type.is_credit() {
            self.amount
        } else {
            -self.amount
        }
    }
}

/// Kind of ledger movement.
///
/// The integer codes are the persisted representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Funds added from outside the ledger.
    Deposit,

    /// Funds removed from the ledger.
    Withdraw,

    /// Credit leg of a transfer.
    TransferIn,

    /// Debit leg of a transfer.
    TransferOut,
}

impl OperationType {
    /// Persisted code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Deposit => 1,
            Self::Withdraw => 2,
            Self::TransferIn => 3,
            Self::TransferOut => 4,
        }
    }

    /// Decode a persisted code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Deposit),
            2 => Some(Self::Withdraw),
            3 => Some(Self::TransferIn),
            4 => Some(Self::TransferOut),
            _ => None,
        }
    }

    /// Check if this movement adds funds to its wallet.
    #[must_use]
    pub const fn is_credit(self) -> bool {
        matches!(self, Self::Deposit | Self::TransferIn)
    }
}
