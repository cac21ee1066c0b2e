// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ingest::types::MessageFeed;
use crate::store::MessageStore;

#[derive(Clone, Copy, Debug)]
pub struct IngestSchedulerCfg {
    pub interval_secs: u64,
}

/// Spawn the polling loop. The first tick fires immediately; a slow tick delays
/// the next one instead of triggering a burst.
pub fn spawn_scheduler(
    cfg: IngestSchedulerCfg,
    feed: Arc<dyn MessageFeed>,
    store: Arc<dyn MessageStore>,
    symbols: Vec<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;

            let summary = crate::ingest::run_tick(feed.as_ref(), store.as_ref(), &symbols).await;
            counter!("pulse_ticks_total").increment(1);

            tracing::info!(
                target: "ingest",
                ok = summary.ok,
                failed = summary.failed,
                inserted = summary.inserted,
                "polling tick"
            );
        }
    })
}
