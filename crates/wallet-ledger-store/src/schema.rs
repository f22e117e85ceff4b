//! The SQL issued against the wallet schema.
//!
//! The DDL lives in `migrations/`; this module holds the statements the
//! PostgreSQL backend runs.

/// Statements used by `PgLedgerStore`.
pub mod sql {
    /// Existence check for a wallet.
    pub const WALLET_EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM wallets WHERE user_id = $1)";

    /// Existence check for an idempotency key.
    pub const TRANSACTION_ID_EXISTS: &str =
        "SELECT EXISTS (SELECT 1 FROM wallet_transactions WHERE transaction_id = $1)";

    /// Create an empty wallet unless one exists.
    pub const INSERT_WALLET: &str =
        "INSERT INTO wallets (user_id, balance) VALUES ($1, 0) ON CONFLICT (user_id) DO NOTHING";

    /// Read a wallet.
    pub const SELECT_WALLET: &str = "SELECT user_id, balance FROM wallets WHERE user_id = $1";

    /// Unconditional increment.
    pub const CREDIT_WALLET: &str = "UPDATE wallets \
         SET balance = balance + $2, updated_at = NOW() \
         WHERE user_id = $1 \
         RETURNING balance";

    /// Conditional decrement. Zero rows means insufficient funds; the row
    /// lock taken by the update serializes concurrent debits.
    pub const DEBIT_WALLET: &str = "UPDATE wallets \
         SET balance = balance - $2, updated_at = NOW() \
         WHERE user_id = $1 AND balance >= $2 \
         RETURNING balance";

    /// Append a ledger entry. Zero rows means the key was already used.
    pub const INSERT_ENTRY: &str = "INSERT INTO wallet_transactions \
         (transaction_id, user_id, operation_type, amount, passive_user_id, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (transaction_id) DO NOTHING";

    /// One page of history, newest first: created no later than `$2`, with
    /// an id below `$3`.
    pub const SELECT_HISTORY: &str = "SELECT id, transaction_id, user_id, operation_type, amount, \
                passive_user_id, created_at \
         FROM wallet_transactions \
         WHERE user_id = $1 AND created_at <= $2 AND id < $3 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $4";

    /// Connectivity check.
    pub const PING: &str = "SELECT 1";
}
