//! Storage layer and ledger repository for the wallet ledger.
//!
//! The crate has two halves:
//!
//! - The **store adapter** contract ([`LedgerStore`], [`LedgerTx`]) and its
//!   backends: [`PgLedgerStore`] for PostgreSQL and [`MemoryLedgerStore`]
//!   for tests and local runs.
//! - The [`WalletRepository`], which owns every ledger invariant and is the
//!   only code that mutates balances or appends entries. It sequences its
//!   reads and writes inside the store's transaction boundary and never
//!   reads a balance to write it back.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use wallet_ledger_core::{TransactionId, UserId};
//! use wallet_ledger_store::{MemoryLedgerStore, WalletRepository};
//!
//! # async fn run() -> wallet_ledger_core::Result<()> {
//! let repo = WalletRepository::new(MemoryLedgerStore::new());
//! let alice = UserId::new("alice")?;
//!
//! repo.create(&alice).await?;
//! let wallet = repo
//!     .deposit(Utc::now(), &alice, &TransactionId::new("t1"), 1000)
//!     .await?;
//! assert_eq!(wallet.balance, 1000);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod schema;

pub use config::DatabaseConfig;
pub use error::{Result, StoreError};
pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;
pub use repository::WalletRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wallet_ledger_core::{HistoryCursor, OperationType, Transaction, UserId, Wallet};

/// A ledger entry about to be appended.
#[derive(Debug, Clone, Copy)]
pub struct LedgerEntry<'a> {
    /// Idempotency key; unique across the whole ledger.
    pub transaction_id: &'a str,
    /// Wallet the entry belongs to.
    pub user_id: &'a UserId,
    /// Positive magnitude.
    pub amount: i64,
    /// Kind of movement.
    pub operation_type: OperationType,
    /// Counterparty of a transfer leg.
    pub passive_user_id: Option<&'a UserId>,
    /// Write time, already at ledger precision.
    pub created_at: DateTime<Utc>,
}

/// The transactional store the ledger runs on.
///
/// Reads outside a transaction see committed state only.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Transaction handle type.
    type Tx: LedgerTx;

    /// Begin a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Check whether a wallet exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn wallet_exists(&self, user_id: &UserId) -> Result<bool>;

    /// Check whether an idempotency key has been used.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn transaction_id_exists(&self, transaction_id: &str) -> Result<bool>;

    /// Insert an empty wallet unless one exists. Returns affected rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn insert_wallet(&self, user_id: &UserId) -> Result<u64>;

    /// Read a wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn fetch_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>>;

    /// Read one page of a wallet's history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or a row is corrupt.
    async fn fetch_transactions(
        &self,
        user_id: &UserId,
        cursor: &HistoryCursor,
    ) -> Result<Vec<Transaction>>;
}

/// An open store transaction.
///
/// Dropping a transaction without calling [`LedgerTx::commit`] rolls it back.
#[async_trait]
pub trait LedgerTx: Send {
    /// Increment a balance unconditionally.
    ///
    /// Returns the new balance, or `None` if no wallet row matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn credit(&mut self, user_id: &UserId, amount: i64) -> Result<Option<i64>>;

    /// Decrement a balance only if it covers `amount`.
    ///
    /// Returns the new balance, or `None` if no row matched (missing wallet
    /// or insufficient funds).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn debit(&mut self, user_id: &UserId, amount: i64) -> Result<Option<i64>>;

    /// Append a ledger entry. Returns 0 if the key was already used.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn insert_entry(&mut self, entry: &LedgerEntry<'_>) -> Result<u64>;

    /// Commit the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; nothing was applied.
    async fn commit(self) -> Result<()>;

    /// Roll the transaction back.
    ///
    /// # Errors
    ///
    /// Returns an error if the store could not be told; the transaction is
    /// abandoned either way.
    async fn rollback(self) -> Result<()>;
}
