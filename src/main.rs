//! stocktwits-pulse — binary entrypoint
//! Loads config and watchlists, opens the file store, starts the polling
//! scheduler and serves the read-only status API.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stocktwits_pulse::api::{create_router, AppState};
use stocktwits_pulse::config::pipeline::PipelineConfig;
use stocktwits_pulse::ingest::config::{load_watchlists_default, symbols};
use stocktwits_pulse::ingest::providers::stocktwits::StocktwitsClient;
use stocktwits_pulse::ingest::scheduler::{spawn_scheduler, IngestSchedulerCfg};
use stocktwits_pulse::ingest::types::MessageFeed;
use stocktwits_pulse::metrics::Metrics;
use stocktwits_pulse::store::{FileStore, MessageStore};

/// Compact logs by default; JSON lines with PULSE_LOG_JSON=1.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stocktwits_pulse=info,ingest=info,store=info,warn"));

    let json = std::env::var("PULSE_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = PipelineConfig::load_default()?;
    let lists = load_watchlists_default()?;
    let symbols = symbols(&lists);
    if symbols.is_empty() {
        tracing::warn!("no symbols configured; scheduler will idle");
    }
    tracing::info!(
        lists = lists.len(),
        symbols = symbols.len(),
        interval_secs = cfg.interval_secs,
        timeout_secs = cfg.timeout_secs,
        "config loaded"
    );

    let metrics = Metrics::init(cfg.interval_secs)?;
    let store: Arc<dyn MessageStore> = Arc::new(FileStore::open(&cfg.store_dir)?);
    let feed: Arc<dyn MessageFeed> = Arc::new(StocktwitsClient::from_config(&cfg)?);

    let scheduler = spawn_scheduler(
        IngestSchedulerCfg {
            interval_secs: cfg.interval_secs,
        },
        feed,
        store.clone(),
        symbols,
    );

    let router = create_router(AppState { store }, Some(&metrics));
    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("binding {}", cfg.listen_addr))?;
    tracing::info!(addr = %cfg.listen_addr, "status api listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("status api server")?;

    scheduler.abort();
    Ok(())
}
