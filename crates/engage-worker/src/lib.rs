//! # engage-worker
//!
//! Wires the PostgreSQL and Redis adapters into a [`ServiceContext`] and
//! feeds it newline-delimited activity events.
//!
//! [`ServiceContext`]: engage_service::ServiceContext

pub mod bootstrap;
pub mod ingest;
pub mod shutdown;

pub use bootstrap::{create_service_context, Infrastructure};
pub use ingest::{process_stream, IngestStats};

use std::sync::Arc;

use engage_common::{AppConfig, AppResult};
use tokio::io::BufReader;
use tracing::info;

/// Run the worker until stdin closes or a shutdown signal arrives
pub async fn run(config: AppConfig) -> AppResult<()> {
    let infra = Infrastructure::connect(&config).await?;
    let ctx = Arc::new(create_service_context(&infra, &config)?);

    info!(
        concurrency = config.engagement.ingest_concurrency,
        reconcile_every = config.engagement.reconcile_every,
        "Reading events from stdin"
    );

    let stats = process_stream(
        ctx,
        BufReader::new(tokio::io::stdin()),
        config.engagement.ingest_concurrency,
        shutdown::shutdown_signal(),
    )
    .await?;

    info!(
        received = stats.received,
        handled = stats.handled,
        rejected = stats.rejected,
        failed = stats.failed,
        "Ingest finished"
    );

    infra.close().await;
    Ok(())
}
