// src/lib.rs
// Public library surface for integration tests and the binary.

pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod store;

pub use crate::ingest::providers::{FeedError, FeedErrorKind};
pub use crate::ingest::{ingest_symbol, run_cycle, run_tick, CycleOutcome, SymbolReport, TickSummary};
pub use crate::store::{FileStore, MemoryStore, MessageStore};
