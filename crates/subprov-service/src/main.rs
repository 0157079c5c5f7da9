mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use subprov_domain::GroupReconciler;
use subprov_nats::{NatsClient, SubscriberEventConsumer};
use subprov_postgres::{PostgresClient, PostgresGroupsMapRepository};
use subprov_remote::HttpGroupGatewayClient;

#[tokio::main]
async fn main() {
    let config = match config::ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("Starting subprov service");

    if let Err(e) = run(config).await {
        error!(error = %e, "Service failed");
        std::process::exit(1);
    }
}

async fn run(config: config::ServiceConfig) -> Result<()> {
    let startup_timeout = Duration::from_secs(config.startup_timeout_secs);

    let postgres = PostgresClient::new(
        &config.postgres_host,
        config.postgres_port,
        &config.postgres_database,
        &config.postgres_user,
        &config.postgres_password,
        config.postgres_pool_size,
    )
    .context("Failed to create postgres pool")?;
    tokio::time::timeout(startup_timeout, postgres.ping())
        .await
        .context("Postgres ping timed out")??;

    let nats = NatsClient::connect(&config.nats_url, startup_timeout).await?;
    tokio::time::timeout(startup_timeout, nats.ensure_stream(&config.nats_stream))
        .await
        .context("Stream creation timed out")??;

    let groups = Arc::new(PostgresGroupsMapRepository::new(postgres.clone()));
    let cgw = Arc::new(HttpGroupGatewayClient::new(
        config.cgw_url.clone(),
        Duration::from_secs(config.remote_timeout_secs),
    )?);
    let reconciler = Arc::new(GroupReconciler::new(groups, cgw));

    let consumer = SubscriberEventConsumer::new(
        nats.jetstream(),
        &config.nats_stream,
        &config.nats_consumer,
        &config.nats_subject,
        config.nats_batch_size,
        config.nats_batch_wait_secs,
        reconciler,
    )
    .await?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
        }
        signal_token.cancel();
    });

    // Runs until cancelled, finishing the message in hand before returning.
    consumer.run(shutdown).await?;

    info!("subprov service stopped");
    Ok(())
}
