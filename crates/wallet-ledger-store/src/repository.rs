//! Wallet repository: the ledger invariants, expressed as store transactions.
//!
//! Every mutating operation follows the same shape:
//!
//! 1. validate the request (amount, self-transfer, wallet existence);
//! 2. check the idempotency key and short-circuit a replay with the current
//!    wallet;
//! 3. inside one store transaction, apply the balance change with a single
//!    conditional update and append the ledger entries;
//! 4. commit, or roll back explicitly on any failure.
//!
//! A replay that races past that check is caught at step 3: the entry insert
//! affects no rows, the transaction is rolled back and the caller receives
//! the current wallet, the same answer as a detected replay.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use wallet_ledger_core::{
    ledger_now, ledger_time, HistoryQuery, LedgerError, OperationType, Result, Transaction,
    TransactionId, UserId, Wallet,
};

use crate::error::StoreError;
use crate::{LedgerEntry, LedgerStore, LedgerTx};

/// Result of the in-transaction part of a write.
enum Outcome {
    /// Balance and entries written; commit.
    Applied(Wallet),
    /// The idempotency key was already taken; roll back.
    Replayed,
}

/// The only component allowed to mutate balances or append ledger entries.
///
/// Holds no state between calls besides a shared handle to the store, so it
/// can be cloned and used from many tasks at once.
pub struct WalletRepository<S> {
    store: Arc<S>,
}

impl<S> Clone for WalletRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> WalletRepository<S> {
    /// Create a repository over a store.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check whether a wallet exists.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Storage` if the store fails.
    pub async fn exists(&self, user_id: &UserId) -> Result<bool> {
        Ok(self.store.wallet_exists(user_id).await?)
    }

    /// Check whether an idempotency key has already been applied.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Storage` if the store fails.
    pub async fn exists_transaction_id(&self, transaction_id: &str) -> Result<bool> {
        Ok(self.store.transaction_id_exists(transaction_id).await?)
    }

    /// Create a wallet with zero balance, or return the existing one.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Storage` if the store fails.
    pub async fn create(&self, user_id: &UserId) -> Result<Wallet> {
        if self.store.insert_wallet(user_id).await? == 0 {
            tracing::debug!(user_id = %user_id, "Wallet already exists");
        }
        self.get(user_id).await
    }

    /// Read a wallet.
    ///
    /// # Errors
    ///
    /// - `LedgerError::WalletNotFound` if the wallet does not exist.
    /// - `LedgerError::Storage` if the store fails.
    pub async fn get(&self, user_id: &UserId) -> Result<Wallet> {
        self.store
            .fetch_wallet(user_id)
            .await?
            .ok_or_else(|| not_found(user_id))
    }

    /// Add funds to a wallet and record a `Deposit` entry.
    ///
    /// Replaying a `transaction_id` returns the current wallet unchanged.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InvalidAmount` if `amount <= 0`.
    /// - `LedgerError::WalletNotFound` if the wallet does not exist.
    /// - `LedgerError::Storage` if the store fails.
    pub async fn deposit(
        &self,
        now: DateTime<Utc>,
        user_id: &UserId,
        transaction_id: &TransactionId,
        amount: i64,
    ) -> Result<Wallet> {
        ensure_positive(amount)?;

        if self.exists_transaction_id(transaction_id.id()).await? {
            return self.replay(user_id, transaction_id).await;
        }

        let entry = LedgerEntry {
            transaction_id: transaction_id.id(),
            user_id,
            amount,
            operation_type: OperationType::Deposit,
            passive_user_id: None,
            created_at: ledger_time(&now),
        };

        let mut tx = self.store.begin().await?;
        let outcome = apply_credit(&mut tx, &entry).await;
        self.finish(tx, outcome, user_id, transaction_id).await
    }

    /// Remove funds from a wallet and record a `Withdraw` entry.
    ///
    /// The debit is one conditional update, so concurrent withdrawals can
    /// never jointly overdraw the wallet.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InvalidAmount` if `amount <= 0`.
    /// - `LedgerError::WalletNotFound` if the wallet does not exist.
    /// - `LedgerError::NotEnoughBalance` if the balance does not cover `amount`.
    /// - `LedgerError::Storage` if the store fails.
    pub async fn withdraw(
        &self,
        now: DateTime<Utc>,
        user_id: &UserId,
        transaction_id: &TransactionId,
        amount: i64,
    ) -> Result<Wallet> {
        ensure_positive(amount)?;
        self.ensure_exists(user_id).await?;

        if self.exists_transaction_id(transaction_id.id()).await? {
            return self.replay(user_id, transaction_id).await;
        }

        let entry = LedgerEntry {
            transaction_id: transaction_id.id(),
            user_id,
            amount,
            operation_type: OperationType::Withdraw,
            passive_user_id: None,
            created_at: ledger_time(&now),
        };

        let mut tx = self.store.begin().await?;
        let outcome = apply_debit(&mut tx, &entry).await;
        self.finish(tx, outcome, user_id, transaction_id).await
    }

    /// Move funds between two wallets.
    ///
    /// Writes a `TransferOut` entry keyed by `transaction_id.id()` on the
    /// source and a `TransferIn` entry keyed by `transaction_id.passive_id()`
    /// on the destination, in the same store transaction as both balance
    /// updates. Returns the source wallet.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InvalidAmount` if `amount <= 0`.
    /// - `LedgerError::TransferToSelf` if both sides are the same wallet.
    /// - `LedgerError::WalletNotFound` if either wallet does not exist.
    /// - `LedgerError::NotEnoughBalance` if the source cannot cover `amount`.
    /// - `LedgerError::Storage` if the store fails.
    pub async fn transfer(
        &self,
        now: DateTime<Utc>,
        user_id: &UserId,
        transaction_id: &TransactionId,
        amount: i64,
        passive_user_id: &UserId,
    ) -> Result<Wallet> {
        ensure_positive(amount)?;
        if user_id == passive_user_id {
            return Err(LedgerError::TransferToSelf {
                user_id: user_id.clone(),
            });
        }
        self.ensure_exists(user_id).await?;
        self.ensure_exists(passive_user_id).await?;

        if self.exists_transaction_id(transaction_id.id()).await? {
            return self.replay(user_id, transaction_id).await;
        }

        let created_at = ledger_time(&now);
        let passive_key = transaction_id.passive_id();
        let outgoing = LedgerEntry {
            transaction_id: transaction_id.id(),
            user_id,
            amount,
            operation_type: OperationType::TransferOut,
            passive_user_id: Some(passive_user_id),
            created_at,
        };
        let incoming = LedgerEntry {
            transaction_id: &passive_key,
            user_id: passive_user_id,
            amount,
            operation_type: OperationType::TransferIn,
            passive_user_id: Some(user_id),
            created_at,
        };

        let mut tx = self.store.begin().await?;
        let outcome = apply_transfer(&mut tx, &outgoing, &incoming).await;
        self.finish(tx, outcome, user_id, transaction_id).await
    }

    /// Read one page of a wallet's history, newest first.
    ///
    /// Entries are ordered by `(created_at, id)` descending. Pass the last
    /// entry of a page to [`HistoryQuery::after`] to get the next one.
    ///
    /// # Errors
    ///
    /// - `LedgerError::WalletNotFound` if the wallet does not exist.
    /// - `LedgerError::Storage` if the store fails.
    pub async fn get_transactions(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> Result<Vec<Transaction>> {
        self.ensure_exists(user_id).await?;
        let cursor = query.resolve(ledger_now());
        Ok(self.store.fetch_transactions(user_id, &cursor).await?)
    }

    async fn ensure_exists(&self, user_id: &UserId) -> Result<()> {
        if self.exists(user_id).await? {
            Ok(())
        } else {
            Err(not_found(user_id))
        }
    }

    async fn replay(&self, user_id: &UserId, transaction_id: &TransactionId) -> Result<Wallet> {
        tracing::debug!(
            user_id = %user_id,
            transaction_id = %transaction_id,
            "Transaction already applied, returning current wallet"
        );
        self.get(user_id).await
    }

    /// Commit an applied outcome; roll back anything else.
    async fn finish(
        &self,
        tx: S::Tx,
        outcome: Result<Outcome>,
        user_id: &UserId,
        transaction_id: &TransactionId,
    ) -> Result<Wallet> {
        match outcome {
            Ok(Outcome::Applied(wallet)) => {
                tx.commit().await?;
                Ok(wallet)
            }
            Ok(Outcome::Replayed) => {
                rollback(tx, transaction_id).await;
                self.replay(user_id, transaction_id).await
            }
            Err(err) => {
                rollback(tx, transaction_id).await;
                Err(err)
            }
        }
    }
}

async fn apply_credit<T: LedgerTx>(tx: &mut T, entry: &LedgerEntry<'_>) -> Result<Outcome> {
    let balance = tx
        .credit(entry.user_id, entry.amount)
        .await?
        .ok_or_else(|| not_found(entry.user_id))?;

    if tx.insert_entry(entry).await? == 0 {
        return Ok(Outcome::Replayed);
    }
    Ok(Outcome::Applied(Wallet::with_balance(
        entry.user_id.clone(),
        balance,
    )))
}

async fn apply_debit<T: LedgerTx>(tx: &mut T, entry: &LedgerEntry<'_>) -> Result<Outcome> {
    let balance = debit(tx, entry).await?;

    if tx.insert_entry(entry).await? == 0 {
        return Ok(Outcome::Replayed);
    }
    Ok(Outcome::Applied(Wallet::with_balance(
        entry.user_id.clone(),
        balance,
    )))
}

async fn apply_transfer<T: LedgerTx>(
    tx: &mut T,
    outgoing: &LedgerEntry<'_>,
    incoming: &LedgerEntry<'_>,
) -> Result<Outcome> {
    let balance = debit(tx, outgoing).await?;

    // The existence check ran outside this transaction; the update is
    // authoritative.
    if tx.credit(incoming.user_id, incoming.amount).await?.is_none() {
        return Err(not_found(incoming.user_id));
    }

    if tx.insert_entry(outgoing).await? == 0 {
        return Ok(Outcome::Replayed);
    }
    // The outgoing key was free, so a taken incoming key belongs to some
    // other operation.
    if tx.insert_entry(incoming).await? == 0 {
        return Err(StoreError::Constraint(format!(
            "transaction id {} is already used",
            incoming.transaction_id
        ))
        .into());
    }
    Ok(Outcome::Applied(Wallet::with_balance(
        outgoing.user_id.clone(),
        balance,
    )))
}

/// Conditional decrement; zero rows means the balance did not cover it.
async fn debit<T: LedgerTx>(tx: &mut T, entry: &LedgerEntry<'_>) -> Result<i64> {
    tx.debit(entry.user_id, entry.amount)
        .await?
        .ok_or_else(|| LedgerError::NotEnoughBalance {
            user_id: entry.user_id.clone(),
            required: entry.amount,
        })
}

async fn rollback<T: LedgerTx>(tx: T, transaction_id: &TransactionId) {
    if let Err(err) = tx.rollback().await {
        tracing::warn!(
            transaction_id = %transaction_id,
            error = %err,
            "Rollback failed, transaction abandoned"
        );
    }
}

fn ensure_positive(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

fn not_found(user_id: &UserId) -> LedgerError {
    LedgerError::WalletNotFound {
        user_id: user_id.clone(),
    }
}
