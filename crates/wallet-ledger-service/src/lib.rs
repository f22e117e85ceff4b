//! Wallet ledger service.
//!
//! This crate is the boundary a transport (HTTP, gRPC, a queue consumer)
//! calls into:
//!
//! - [`WalletService`], the operation contract
//! - [`Wallets`], its implementation over a `WalletRepository`, which
//!   supplies the clock, fresh transaction ids and per-operation deadlines
//! - [`LoggingWalletService`], a decorator that logs every call
//! - [`ServiceConfig`], environment-driven settings
//!
//! Mapping results to wire responses is left to the transport.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)] // Errors are documented on the repository

pub mod config;
pub mod logging;
pub mod service;

pub use config::ServiceConfig;
pub use logging::LoggingWalletService;
pub use service::{WalletService, Wallets};

use wallet_ledger_store::{PgLedgerStore, StoreError, WalletRepository};

/// Connect to PostgreSQL and build a service from `config`.
///
/// Applies migrations first when `config.run_migrations` is set.
pub async fn connect(config: &ServiceConfig) -> Result<Wallets<PgLedgerStore>, StoreError> {
    let store = PgLedgerStore::connect(&config.database).await?;
    if config.run_migrations {
        store.migrate().await?;
    }
    store.health_check().await?;

    Ok(Wallets::new(
        WalletRepository::new(store),
        config.operation_timeout(),
    ))
}
