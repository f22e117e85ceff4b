//! Logging decorator for any [`WalletService`].

use std::time::Instant;

use async_trait::async_trait;

use wallet_ledger_core::{HistoryQuery, Result, Transaction, TransactionId, UserId, Wallet};

use crate::service::WalletService;

/// Wraps a [`WalletService`] and emits one `tracing` event per call.
///
/// Successes are logged at `info`, failures at `warn` and id generation at
/// `debug`. Results are forwarded untouched.
#[derive(Debug, Clone)]
pub struct LoggingWalletService<T> {
    inner: T,
}

impl<T: WalletService> LoggingWalletService<T> {
    /// Wrap a service.
    #[must_use]
    pub const fn new(inner: T) -> Self {
        Self { inner }
    }

    /// The wrapped service.
    #[must_use]
    pub const fn inner(&self) -> &T {
        &self.inner
    }

    /// Unwrap the service.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Fields shared by every logged call.
struct Call<'a> {
    operation: &'static str,
    user_id: &'a UserId,
    transaction_id: Option<&'a TransactionId>,
    amount: Option<i64>,
    passive_user_id: Option<&'a UserId>,
    started: Instant,
}

impl<'a> Call<'a> {
    fn start(operation: &'static str, user_id: &'a UserId) -> Self {
        Self {
            operation,
            user_id,
            transaction_id: None,
            amount: None,
            passive_user_id: None,
            started: Instant::now(),
        }
    }

    fn movement(mut self, transaction_id: &'a TransactionId, amount: i64) -> Self {
        self.transaction_id = Some(transaction_id);
        self.amount = Some(amount);
        self
    }

    fn counterparty(mut self, passive_user_id: &'a UserId) -> Self {
        self.passive_user_id = Some(passive_user_id);
        self
    }

    fn finish<V>(&self, result: &Result<V>) {
        let elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let transaction_id = self.transaction_id.map(TransactionId::id);
        let passive_user_id = self.passive_user_id.map(UserId::as_str);

        match result {
            Ok(_) => tracing::info!(
                operation = self.operation,
                user_id = %self.user_id,
                transaction_id,
                amount = self.amount,
                passive_user_id,
                elapsed_ms,
                "Ledger call succeeded"
            ),
            Err(err) => tracing::warn!(
                operation = self.operation,
                user_id = %self.user_id,
                transaction_id,
                amount = self.amount,
                passive_user_id,
                elapsed_ms,
                kind = ?err.kind(),
                error = %err,
                "Ledger call failed"
            ),
        }
    }
}

#[async_trait]
impl<T: WalletService> WalletService for LoggingWalletService<T> {
    async fn create(&self, user_id: &UserId) -> Result<Wallet> {
        let call = Call::start("create", user_id);
        let result = self.inner.create(user_id).await;
        call.finish(&result);
        result
    }

    async fn get(&self, user_id: &UserId) -> Result<Wallet> {
        let call = Call::start("get", user_id);
        let result = self.inner.get(user_id).await;
        call.finish(&result);
        result
    }

    fn create_transaction_id(&self) -> TransactionId {
        let transaction_id = self.inner.create_transaction_id();
        tracing::debug!(transaction_id = %transaction_id, "Generated transaction id");
        transaction_id
    }

    async fn deposit(
        &self,
        user_id: &UserId,
        transaction_id: &TransactionId,
        amount: i64,
    ) -> Result<Wallet> {
        let call = Call::start("deposit", user_id).movement(transaction_id, amount);
        let result = self.inner.deposit(user_id, transaction_id, amount).await;
        call.finish(&result);
        result
    }

    async fn withdraw(
        &self,
        user_id: &UserId,
        transaction_id: &TransactionId,
        amount: i64,
    ) -> Result<Wallet> {
        let call = Call::start("withdraw", user_id).movement(transaction_id, amount);
        let result = self.inner.withdraw(user_id, transaction_id, amount).await;
        call.finish(&result);
        result
    }

    async fn transfer(
        &self,
        user_id: &UserId,
        transaction_id: &TransactionId,
        amount: i64,
        passive_user_id: &UserId,
    ) -> Result<Wallet> {
        let call = Call::start("transfer", user_id)
            .movement(transaction_id, amount)
            .counterparty(passive_user_id);
        let result = self
            .inner
            .transfer(user_id, transaction_id, amount, passive_user_id)
            .await;
        call.finish(&result);
        result
    }

    async fn get_transactions(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> Result<Vec<Transaction>> {
        let call = Call::start("get_transactions", user_id);
        let result = self.inner.get_transactions(user_id, query).await;
        call.finish(&result);
        result
    }
}
