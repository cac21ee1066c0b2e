// src/ingest/mod.rs
pub mod config;
pub mod dedup;
pub mod providers;
pub mod scheduler;
pub mod types;
pub mod window;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::ingest::dedup::{filter_new, KnownBodies};
use crate::ingest::providers::FeedError;
use crate::ingest::types::{ActivityCounts, ActivitySnapshot, Message, MessageFeed, StoredMessage};
use crate::store::MessageStore;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "pulse_messages_fetched_total",
            "Messages returned by the feed."
        );
        describe_counter!(
            "pulse_messages_inserted_total",
            "New messages written to the store."
        );
        describe_counter!(
            "pulse_messages_duplicate_total",
            "Messages skipped because their body was already stored."
        );
        describe_counter!(
            "pulse_insert_errors_total",
            "Message inserts rejected by the store."
        );
        describe_counter!(
            "pulse_feed_errors_total",
            "Feed fetch/decode errors, labelled by kind."
        );
        describe_counter!("pulse_ticks_total", "Polling ticks completed.");
        describe_histogram!("pulse_fetch_ms", "Feed request time in milliseconds.");
        describe_gauge!(
            "pulse_tick_last_run_ts",
            "Unix ts when the polling tick last ran."
        );
    });
}

/// Result of one fetch cycle: what to insert and the profile to upsert.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// New messages in feed order.
    pub to_persist: Vec<Message>,
    pub snapshot: ActivitySnapshot,
    /// Size of the fetched batch, duplicates included.
    pub fetched: usize,
}

impl CycleOutcome {
    pub fn duplicates(&self) -> usize {
        self.fetched - self.to_persist.len()
    }
}

/// Fetch `symbol`, measure its activity and pick the messages not yet stored.
///
/// Performs no storage I/O. Counts cover the whole batch, so a cycle that only
/// sees known messages still reports them in the snapshot.
pub async fn run_cycle(
    feed: &dyn MessageFeed,
    symbol: &str,
    known: &KnownBodies,
    now: DateTime<Utc>,
) -> Result<CycleOutcome, FeedError> {
    let batch = feed.fetch(symbol).await?;

    let temperature = window::classify(now, &batch.messages);
    let to_persist: Vec<Message> = filter_new(&batch.messages, known)
        .into_iter()
        .cloned()
        .collect();

    let snapshot = ActivitySnapshot {
        symbol: symbol.trim().to_string(),
        info: batch.symbol,
        response: batch.response,
        cursor: batch.cursor,
        temperature,
        updated_at: now,
    };

    Ok(CycleOutcome {
        to_persist,
        snapshot,
        fetched: batch.messages.len(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolReport {
    pub symbol: String,
    pub fetched: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub insert_errors: usize,
    pub temperature: ActivityCounts,
}

/// Full cycle for one symbol against a store: read known bodies, run the cycle,
/// insert the new messages and upsert the profile.
///
/// A failed insert is logged and counted but does not stop the remaining inserts
/// or the profile upsert. Feed errors are returned before anything is written.
pub async fn ingest_symbol(
    feed: &dyn MessageFeed,
    store: &dyn MessageStore,
    symbol: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<SymbolReport> {
    ensure_metrics_described();

    // store keys and the fetched symbol must agree
    let symbol = symbol.trim();
    let known = store.known_bodies(symbol).await?;
    let outcome = match run_cycle(feed, symbol, &known, now).await {
        Ok(o) => o,
        Err(e) => {
            counter!("pulse_feed_errors_total", "kind" => e.kind().as_str()).increment(1);
            return Err(e.into());
        }
    };

    let duplicates = outcome.duplicates();
    let symbol = outcome.snapshot.symbol.clone();
    let mut inserted = 0usize;
    let mut insert_errors = 0usize;
    for msg in &outcome.to_persist {
        match store
            .insert_message(StoredMessage::from_message(&symbol, msg))
            .await
        {
            Ok(()) => inserted += 1,
            Err(e) => {
                insert_errors += 1;
                tracing::warn!(target: "ingest", error = ?e, symbol = %symbol, id = msg.id, "message insert failed");
            }
        }
    }

    let temperature = outcome.snapshot.temperature;
    store.upsert_profile(outcome.snapshot).await?;

    counter!("pulse_messages_fetched_total").increment(outcome.fetched as u64);
    counter!("pulse_messages_inserted_total").increment(inserted as u64);
    counter!("pulse_messages_duplicate_total").increment(duplicates as u64);
    counter!("pulse_insert_errors_total").increment(insert_errors as u64);

    Ok(SymbolReport {
        symbol,
        fetched: outcome.fetched,
        inserted,
        duplicates,
        insert_errors,
        temperature,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub ok: usize,
    pub failed: usize,
    pub inserted: usize,
}

/// Run every symbol once, sequentially. A failing symbol is logged and skipped.
pub async fn run_tick(
    feed: &dyn MessageFeed,
    store: &dyn MessageStore,
    symbols: &[String],
) -> TickSummary {
    ensure_metrics_described();

    let mut summary = TickSummary::default();
    for symbol in symbols {
        tracing::debug!(target: "ingest", symbol = %symbol, provider = feed.name(), "polling symbol");
        let now = Utc::now();
        match ingest_symbol(feed, store, symbol, now).await {
            Ok(report) => {
                summary.ok += 1;
                summary.inserted += report.inserted;
                tracing::info!(
                    target: "ingest",
                    symbol = %report.symbol,
                    fetched = report.fetched,
                    inserted = report.inserted,
                    duplicates = report.duplicates,
                    last10m = report.temperature.recent,
                    last1h = report.temperature.short_term,
                    last3h = report.temperature.mid_term,
                    "symbol ingested"
                );
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(target: "ingest", error = %e, symbol = %symbol, "symbol skipped");
            }
        }
    }

    gauge!("pulse_tick_last_run_ts").set(Utc::now().timestamp().max(0) as f64);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::providers::fixture::FixtureFeed;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap()
    }

    fn payload(messages: &[(u64, &str, DateTime<Utc>)]) -> String {
        let msgs: Vec<serde_json::Value> = messages
            .iter()
            .map(|(id, body, at)| {
                serde_json::json!({
                    "id": id,
                    "body": body,
                    "created_at": at.to_rfc3339(),
                    "user": {"id": 7, "username": "trader"},
                    "source": {"id": 1, "title": "StockTwits"},
                    "symbols": [{"id": 686, "symbol": "AAPL"}]
                })
            })
            .collect();
        serde_json::json!({
            "response": {"status": 200},
            "symbol": {"id": 686, "symbol": "AAPL", "title": "Apple Inc."},
            "cursor": {"more": false, "since": 1, "max": 2},
            "messages": msgs
        })
        .to_string()
    }

    #[tokio::test]
    async fn windowing_and_dedup_are_independent() {
        let n = now();
        let feed = FixtureFeed::from_fixture_str(
            "AAPL",
            &payload(&[
                (2, "AAPL up", n - Duration::minutes(5)),
                (1, "AAPL up", n - Duration::hours(4)),
            ]),
        );
        let out = run_cycle(&feed, "AAPL", &KnownBodies::new(), n).await.unwrap();
        assert_eq!(
            out.snapshot.temperature,
            ActivityCounts {
                recent: 1,
                short_term: 0,
                mid_term: 0
            }
        );
        assert_eq!(out.to_persist.len(), 2);
        assert_eq!(out.duplicates(), 0);
    }

    #[tokio::test]
    async fn known_body_is_skipped_but_still_counted() {
        let n = now();
        let feed = FixtureFeed::from_fixture_str("AAPL", &payload(&[(1, "AAPL up", n)]));
        let known: KnownBodies = ["AAPL up".to_string()].into_iter().collect();
        let out = run_cycle(&feed, "AAPL", &known, n).await.unwrap();
        assert!(out.to_persist.is_empty());
        assert_eq!(out.snapshot.temperature.recent, 1);
        assert_eq!(out.snapshot.cursor.max, 2);
        assert_eq!(out.snapshot.info.title, "Apple Inc.");
        assert_eq!(out.snapshot.updated_at, n);
    }

    #[tokio::test]
    async fn feed_error_yields_no_snapshot_and_no_writes() {
        let store = MemoryStore::new();
        let feed = FixtureFeed::new();
        let err = ingest_symbol(&feed, &store, "MSFT", now()).await.unwrap_err();
        assert!(err.downcast_ref::<FeedError>().is_some());
        assert!(store.profile("MSFT").await.unwrap().is_none());
        assert_eq!(store.message_count("MSFT").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn second_ingest_is_idempotent() {
        let n = now();
        let feed = FixtureFeed::from_fixture_str(
            "AAPL",
            &payload(&[
                (3, "c", n - Duration::minutes(1)),
                (2, "b", n - Duration::minutes(30)),
                (1, "a", n - Duration::hours(2)),
            ]),
        );
        let store = MemoryStore::new();

        let first = ingest_symbol(&feed, &store, "AAPL", n).await.unwrap();
        assert_eq!(first.inserted, 3);

        let second = ingest_symbol(&feed, &store, "AAPL", n).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 3);
        assert_eq!(second.temperature, first.temperature);
        assert_eq!(store.message_count("AAPL").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn padded_symbol_dedups_against_trimmed_key() {
        let n = now();
        let feed = FixtureFeed::from_fixture_str(
            "AAPL",
            &payload(&[
                (2, "b", n - Duration::minutes(2)),
                (1, "a", n - Duration::minutes(20)),
            ]),
        );
        let store = MemoryStore::new();

        let first = ingest_symbol(&feed, &store, " AAPL", n).await.unwrap();
        assert_eq!(first.symbol, "AAPL");
        assert_eq!(first.inserted, 2);

        let second = ingest_symbol(&feed, &store, " AAPL", n).await.unwrap();
        assert_eq!(second.inserted, 0);

        let summary = run_tick(&feed, &store, &["AAPL ".to_string()]).await;
        assert_eq!(summary.inserted, 0);
        assert_eq!(store.message_count("AAPL").await.unwrap(), 2);
        assert_eq!(store.message_count(" AAPL").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn tick_skips_failing_symbols() {
        let n = Utc::now();
        let feed = FixtureFeed::from_fixture_str("AAPL", &payload(&[(1, "hi", n)]));
        let store = MemoryStore::new();
        let symbols = vec!["AAPL".to_string(), "GONE".to_string()];
        let summary = run_tick(&feed, &store, &symbols).await;
        assert_eq!(
            summary,
            TickSummary {
                ok: 1,
                failed: 1,
                inserted: 1
            }
        );
    }
}
