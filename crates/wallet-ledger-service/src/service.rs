//! The wallet service contract and its repository-backed implementation.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use wallet_ledger_core::{
    HistoryQuery, LedgerError, Result, Transaction, TransactionId, UserId, Wallet,
};
use wallet_ledger_store::{LedgerStore, StoreError, WalletRepository};

/// Operations the wallet ledger exposes to a transport.
///
/// Every method reports failures as a [`LedgerError`]; transports map
/// [`LedgerError::kind`] to their own status codes.
#[async_trait]
pub trait WalletService: Send + Sync {
    /// Create a wallet with zero balance, or return the existing one.
    async fn create(&self, user_id: &UserId) -> Result<Wallet>;

    /// Read a wallet.
    async fn get(&self, user_id: &UserId) -> Result<Wallet>;

    /// Mint a fresh idempotency key.
    fn create_transaction_id(&self) -> TransactionId;

    /// Add funds to a wallet.
    async fn deposit(
        &self,
        user_id: &UserId,
        transaction_id: &TransactionId,
        amount: i64,
    ) -> Result<Wallet>;

    /// Remove funds from a wallet.
    async fn withdraw(
        &self,
        user_id: &UserId,
        transaction_id: &TransactionId,
        amount: i64,
    ) -> Result<Wallet>;

    /// Move funds from `user_id` to `passive_user_id`. Returns the source wallet.
    async fn transfer(
        &self,
        user_id: &UserId,
        transaction_id: &TransactionId,
        amount: i64,
        passive_user_id: &UserId,
    ) -> Result<Wallet>;

    /// Read one page of a wallet's history, newest first.
    async fn get_transactions(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> Result<Vec<Transaction>>;
}

/// [`WalletService`] over a [`WalletRepository`].
///
/// Supplies the clock and fresh ids, and bounds each repository call by the
/// operation deadline. An expired call is dropped mid-flight, which rolls
/// back its store transaction.
pub struct Wallets<S> {
    repo: WalletRepository<S>,
    timeout: Duration,
}

impl<S> Clone for Wallets<S> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S: LedgerStore> Wallets<S> {
    /// Create a service over a repository.
    #[must_use]
    pub const fn new(repo: WalletRepository<S>, timeout: Duration) -> Self {
        Self { repo, timeout }
    }

    /// The underlying repository.
    #[must_use]
    pub const fn repository(&self) -> &WalletRepository<S> {
        &self.repo
    }

    /// The per-operation deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn within_deadline<T: Send>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or_else(|_| {
                tracing::warn!(
                    operation,
                    timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    "Ledger operation exceeded its deadline"
                );
                Err(LedgerError::from(StoreError::Timeout))
            })
    }
}

#[async_trait]
impl<S: LedgerStore> WalletService for Wallets<S> {
    async fn create(&self, user_id: &UserId) -> Result<Wallet> {
        self.within_deadline("create", self.repo.create(user_id)).await
    }

    async fn get(&self, user_id: &UserId) -> Result<Wallet> {
        self.within_deadline("get", self.repo.get(user_id)).await
    }

    fn create_transaction_id(&self) -> TransactionId {
        TransactionId::generate()
    }

    async fn deposit(
        &self,
        user_id: &UserId,
        transaction_id: &TransactionId,
        amount: i64,
    ) -> Result<Wallet> {
        let now = Utc::now();
        self.within_deadline(
            "deposit",
            self.repo.deposit(now, user_id, transaction_id, amount),
        )
        .await
    }

    async fn withdraw(
        &self,
        user_id: &UserId,
        transaction_id: &TransactionId,
        amount: i64,
    ) -> Result<Wallet> {
        let now = Utc::now();
        self.within_deadline(
            "withdraw",
            self.repo.withdraw(now, user_id, transaction_id, amount),
        )
        .await
    }

    async fn transfer(
        &self,
        user_id: &UserId,
        transaction_id: &TransactionId,
        amount: i64,
        passive_user_id: &UserId,
    ) -> Result<Wallet> {
        let now = Utc::now();
        self.within_deadline(
            "transfer",
            self.repo
                .transfer(now, user_id, transaction_id, amount, passive_user_id),
        )
        .await
    }

    async fn get_transactions(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> Result<Vec<Transaction>> {
        self.within_deadline(
            "get_transactions",
            self.repo.get_transactions(user_id, query),
        )
        .await
    }
}
