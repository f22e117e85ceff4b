//! Wallet ledger migrator.
//!
//! Connects with the environment configuration, applies the schema and
//! checks that the database answers. Deployments run it before starting
//! whatever transport embeds the ledger.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wallet_ledger_service::ServiceConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wallet_ledger=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ServiceConfig::from_env();
    config.run_migrations = true;

    tracing::info!(
        max_connections = config.database.max_connections,
        operation_timeout_ms = config.operation_timeout_ms,
        "Service configuration loaded"
    );

    let service = wallet_ledger_service::connect(&config).await?;
    service.repository().store().close().await;

    tracing::info!("Wallet ledger schema is up to date");
    Ok(())
}
