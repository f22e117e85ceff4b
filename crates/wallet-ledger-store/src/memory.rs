//! In-memory storage implementation.
//!
//! `MemoryLedgerStore` honours the same contract as the PostgreSQL backend
//! with a single async mutex standing in for the database's locking: a
//! transaction holds the lock from `begin` until it is committed, rolled
//! back or dropped. Writes are staged on the transaction and applied on
//! commit. Entry ids come from a sequence that is not rolled back, so ids
//! increase but may have gaps, as with `BIGSERIAL`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use wallet_ledger_core::{HistoryCursor, Transaction, TransactionId, UserId, Wallet};

use crate::error::{Result, StoreError};
use crate::{LedgerEntry, LedgerStore, LedgerTx};

#[derive(Debug, Default)]
struct MemoryState {
    balances: HashMap<UserId, i64>,
    entries: Vec<Transaction>,
    transaction_ids: HashSet<String>,
    last_entry_id: i64,
}

/// Memory-backed storage implementation.
///
/// Cloning yields another handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLedgerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// An open in-memory transaction.
pub struct MemoryTx {
    state: OwnedMutexGuard<MemoryState>,
    balances: HashMap<UserId, i64>,
    entries: Vec<Transaction>,
}

impl MemoryTx {
    fn balance(&self, user_id: &UserId) -> Option<i64> {
        self.balances
            .get(user_id)
            .or_else(|| self.state.balances.get(user_id))
            .copied()
    }

    fn key_taken(&self, transaction_id: &str) -> bool {
        self.state.transaction_ids.contains(transaction_id)
            || self
                .entries
                .iter()
                .any(|entry| entry.transaction_id.id() == transaction_id)
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        let state = Arc::clone(&self.state).lock_owned().await;
        Ok(MemoryTx {
            state,
            balances: HashMap::new(),
            entries: Vec::new(),
        })
    }

    async fn wallet_exists(&self, user_id: &UserId) -> Result<bool> {
        Ok(self.state.lock().await.balances.contains_key(user_id))
    }

    async fn transaction_id_exists(&self, transaction_id: &str) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .await
            .transaction_ids
            .contains(transaction_id))
    }

    async fn insert_wallet(&self, user_id: &UserId) -> Result<u64> {
        let mut state = self.state.lock().await;
        if state.balances.contains_key(user_id) {
            return Ok(0);
        }
        state.balances.insert(user_id.clone(), 0);
        Ok(1)
    }

    async fn fetch_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>> {
        let state = self.state.lock().await;
        Ok(state
            .balances
            .get(user_id)
            .map(|balance| Wallet::with_balance(user_id.clone(), *balance)))
    }

    async fn fetch_transactions(
        &self,
        user_id: &UserId,
        cursor: &HistoryCursor,
    ) -> Result<Vec<Transaction>> {
        let state = self.state.lock().await;
        let mut page: Vec<Transaction> = state
            .entries
            .iter()
            .filter(|entry| &entry.user_id == user_id && cursor.admits(entry.created_at, entry.id))
            .cloned()
            .collect();

        page.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        page.truncate(usize::try_from(cursor.limit).unwrap_or(usize::MAX));
        Ok(page)
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn credit(&mut self, user_id: &UserId, amount: i64) -> Result<Option<i64>> {
        let Some(balance) = self.balance(user_id) else {
            return Ok(None);
        };
        let updated = balance
            .checked_add(amount)
            .ok_or_else(|| StoreError::Constraint(format!("balance of {user_id} out of range")))?;
        self.balances.insert(user_id.clone(), updated);
        Ok(Some(updated))
    }

    async fn debit(&mut self, user_id: &UserId, amount: i64) -> Result<Option<i64>> {
        match self.balance(user_id) {
            Some(balance) if balance >= amount => {
                let updated = balance - amount;
                self.balances.insert(user_id.clone(), updated);
                Ok(Some(updated))
            }
            _ => Ok(None),
        }
    }

    async fn insert_entry(&mut self, entry: &LedgerEntry<'_>) -> Result<u64> {
        if self.key_taken(entry.transaction_id) {
            return Ok(0);
        }
        if self.balance(entry.user_id).is_none() {
            return Err(StoreError::Constraint(format!(
                "wallet_transactions.user_id references missing wallet {}",
                entry.user_id
            )));
        }
        if entry.amount <= 0 {
            return Err(StoreError::Constraint(format!(
                "wallet_transactions.amount must be positive, got {}",
                entry.amount
            )));
        }

        self.state.last_entry_id += 1;
        self.entries.push(Transaction {
            id: self.state.last_entry_id,
            transaction_id: TransactionId::new(entry.transaction_id),
            user_id: entry.user_id.clone(),
            amount: entry.amount,
            operation_type: entry.operation_type,
            passive_user_id: entry.passive_user_id.cloned(),
            created_at: entry.created_at,
        });
        Ok(1)
    }

    async fn commit(self) -> Result<()> {
        let Self {
            mut state,
            balances,
            entries,
        } = self;

        state.balances.extend(balances);
        for entry in entries {
            state
                .transaction_ids
                .insert(entry.transaction_id.id().to_owned());
            state.entries.push(entry);
        }
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
