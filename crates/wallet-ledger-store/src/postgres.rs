//! PostgreSQL storage implementation.
//!
//! This module provides the `PgLedgerStore` implementation of the
//! `LedgerStore` trait on top of an `sqlx` connection pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};

use wallet_ledger_core::{HistoryCursor, OperationType, Transaction, TransactionId, UserId, Wallet};

use crate::config::DatabaseConfig;
use crate::error::{Result, StoreError};
use crate::schema::sql;
use crate::{LedgerEntry, LedgerStore, LedgerTx};

/// PostgreSQL-backed storage implementation.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .max_lifetime(config.max_lifetime())
            .connect(&config.database_url)
            .await?;

        tracing::info!(
            max_connections = config.max_connections,
            "Connected to PostgreSQL"
        );

        Ok(Self { pool })
    }

    /// Apply the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Wallet ledger migrations applied");
        Ok(())
    }

    /// Check that the database answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the check query fails.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query(sql::PING).execute(&self.pool).await?;
        Ok(())
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// An open PostgreSQL transaction.
///
/// `sqlx` rolls the transaction back when it is dropped uncommitted.
pub struct PgTx {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx })
    }

    async fn wallet_exists(&self, user_id: &UserId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(sql::WALLET_EXISTS)
            .bind(user_id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn transaction_id_exists(&self, transaction_id: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(sql::TRANSACTION_ID_EXISTS)
            .bind(transaction_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_wallet(&self, user_id: &UserId) -> Result<u64> {
        let result = sqlx::query(sql::INSERT_WALLET)
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn fetch_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>> {
        let row = sqlx::query(sql::SELECT_WALLET)
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<Wallet> {
            let balance: i64 = row.try_get("balance")?;
            Ok(Wallet::with_balance(user_id.clone(), balance))
        })
        .transpose()
    }

    async fn fetch_transactions(
        &self,
        user_id: &UserId,
        cursor: &HistoryCursor,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(sql::SELECT_HISTORY)
            .bind(user_id.as_str())
            .bind(cursor.created_before)
            .bind(cursor.id_before)
            .bind(cursor.limit)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(user_id = %user_id, rows = rows.len(), "Fetched history page");

        rows.iter().map(decode_transaction).collect()
    }
}

#[async_trait]
impl LedgerTx for PgTx {
    async fn credit(&mut self, user_id: &UserId, amount: i64) -> Result<Option<i64>> {
        let row = sqlx::query(sql::CREDIT_WALLET)
            .bind(user_id.as_str())
            .bind(amount)
            .fetch_optional(&mut *self.tx)
            .await?;
        balance_of(row)
    }

    async fn debit(&mut self, user_id: &UserId, amount: i64) -> Result<Option<i64>> {
        let row = sqlx::query(sql::DEBIT_WALLET)
            .bind(user_id.as_str())
            .bind(amount)
            .fetch_optional(&mut *self.tx)
            .await?;
        balance_of(row)
    }

    async fn insert_entry(&mut self, entry: &LedgerEntry<'_>) -> Result<u64> {
        let result = sqlx::query(sql::INSERT_ENTRY)
            .bind(entry.transaction_id)
            .bind(entry.user_id.as_str())
            .bind(entry.operation_type.code())
            .bind(entry.amount)
            .bind(entry.passive_user_id.map_or("", UserId::as_str))
            .bind(entry.created_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Extract the `RETURNING balance` column of an update.
fn balance_of(row: Option<PgRow>) -> Result<Option<i64>> {
    row.map(|row| row.try_get::<i64, _>("balance"))
        .transpose()
        .map_err(StoreError::from)
}

/// Decode a `wallet_transactions` row.
fn decode_transaction(row: &PgRow) -> Result<Transaction> {
    let user_id: String = row.try_get("user_id")?;
    let passive_user_id: String = row.try_get("passive_user_id")?;
    let code: i16 = row.try_get("operation_type")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    let operation_type = OperationType::from_code(code)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown operation type {code}")))?;
    let user_id =
        UserId::new(user_id).map_err(|e| StoreError::Corrupt(format!("user_id: {e}")))?;
    let passive_user_id = if passive_user_id.is_empty() {
        None
    } else {
        Some(
            UserId::new(passive_user_id)
                .map_err(|e| StoreError::Corrupt(format!("passive_user_id: {e}")))?,
        )
    };

    Ok(Transaction {
        id: row.try_get("id")?,
        transaction_id: TransactionId::new(row.try_get::<String, _>("transaction_id")?),
        user_id,
        amount: row.try_get("amount")?,
        operation_type,
        passive_user_id,
        created_at,
    })
}
