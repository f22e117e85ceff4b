//! Wallet balance type.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// A user's wallet.
///
/// The balance is stored as a signed integer but never goes below zero;
/// the store enforces that at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Owner of the wallet.
    pub user_id: UserId,

    /// Current balance in minor units.
    pub balance: i64,
}

impl Wallet {
    /// Create an empty wallet.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: 0,
        }
    }

    /// Create a wallet with a known balance.
    #[must_use]
    pub const fn with_balance(user_id: UserId, balance: i64) -> Self {
        Self { user_id, balance }
    }
}
