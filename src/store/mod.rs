//! Storage collaborator for the ingest pipeline.
//!
//! Messages are insert-only and keyed by `(symbol, body)` for dedup lookups;
//! profiles are upserted, one per symbol.

pub mod file;

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::ingest::dedup::KnownBodies;
use crate::ingest::types::{ActivitySnapshot, StoredMessage};

pub use file::FileStore;

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Bodies of every message stored for `symbol`.
    async fn known_bodies(&self, symbol: &str) -> Result<KnownBodies>;
    async fn insert_message(&self, msg: StoredMessage) -> Result<()>;
    /// Replace the profile for `snapshot.symbol`, creating it if absent.
    async fn upsert_profile(&self, snapshot: ActivitySnapshot) -> Result<()>;
    async fn profile(&self, symbol: &str) -> Result<Option<ActivitySnapshot>>;
    async fn profiles(&self) -> Result<Vec<ActivitySnapshot>>;
    async fn message_count(&self, symbol: &str) -> Result<usize>;
}

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) messages: HashMap<String, Vec<StoredMessage>>,
    pub(crate) profiles: BTreeMap<String, ActivitySnapshot>,
}

impl StoreState {
    pub(crate) fn known_bodies(&self, symbol: &str) -> KnownBodies {
        self.messages
            .get(symbol)
            .map(|v| v.iter().map(|m| m.body.clone()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn push_message(&mut self, msg: StoredMessage) {
        self.messages.entry(msg.symbol.clone()).or_default().push(msg);
    }

    pub(crate) fn message_count(&self, symbol: &str) -> usize {
        self.messages.get(symbol).map(Vec::len).unwrap_or(0)
    }
}

/// Process-local store; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().expect("memory store mutex poisoned")
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn known_bodies(&self, symbol: &str) -> Result<KnownBodies> {
        Ok(self.lock().known_bodies(symbol))
    }

    async fn insert_message(&self, msg: StoredMessage) -> Result<()> {
        self.lock().push_message(msg);
        Ok(())
    }

    async fn upsert_profile(&self, snapshot: ActivitySnapshot) -> Result<()> {
        self.lock()
            .profiles
            .insert(snapshot.symbol.clone(), snapshot);
        Ok(())
    }

    async fn profile(&self, symbol: &str) -> Result<Option<ActivitySnapshot>> {
        Ok(self.lock().profiles.get(symbol).cloned())
    }

    async fn profiles(&self) -> Result<Vec<ActivitySnapshot>> {
        Ok(self.lock().profiles.values().cloned().collect())
    }

    async fn message_count(&self, symbol: &str) -> Result<usize> {
        Ok(self.lock().message_count(symbol))
    }
}
