//! Core types for the wallet ledger.
//!
//! This crate provides the value types and error vocabulary shared by the
//! store and service layers:
//!
//! - **Identifiers**: `UserId`, `TransactionId`
//! - **Wallets**: `Wallet`
//! - **Ledger entries**: `Transaction`, `OperationType`
//! - **History paging**: `HistoryQuery`, `HistoryCursor`
//! - **Errors**: `LedgerError`, `ErrorKind`
//!
//! # Amounts
//!
//! Amounts and balances are `i64` minor units. Every movement amount must be
//! strictly positive; balances never go below zero.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod history;
pub mod ids;
pub mod time;
pub mod transaction;
pub mod wallet;

pub use error::{ErrorKind, LedgerError, Result, StorageSource};
pub use history::{HistoryCursor, HistoryQuery, DEFAULT_PAGE_LIMIT};
pub use ids::{IdError, TransactionId, UserId, PASSIVE_SUFFIX};
pub use time::{ledger_now, ledger_time};
pub use transaction::{OperationType, Transaction};
pub use wallet::Wallet;
