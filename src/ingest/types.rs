// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::providers::FeedError;

/// Author of a stream message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub avatar_url_ssl: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub classification: Vec<String>,
}

/// Client the message was posted from (web, app, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Source {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// Ticker metadata, used both for the stream's symbol and for per-message annotations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SymbolInfo {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub is_following: bool,
    #[serde(default)]
    pub watchlist_count: u64,
}

/// Pagination cursor passed through from the feed; opaque to the pipeline.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cursor {
    #[serde(default)]
    pub more: bool,
    #[serde(default)]
    pub since: u64,
    #[serde(default)]
    pub max: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseStatus {
    pub status: i64,
}

/// A single feed post. Never mutated after decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: u64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

/// Wire envelope of `GET /api/2/streams/symbol/{symbol}.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub response: ResponseStatus,
    #[serde(default)]
    pub symbol: SymbolInfo,
    #[serde(default)]
    pub cursor: Cursor,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// One decoded fetch: the message batch plus the metadata the snapshot carries along.
#[derive(Debug, Clone)]
pub struct FeedBatch {
    pub response: ResponseStatus,
    pub symbol: SymbolInfo,
    pub cursor: Cursor,
    pub messages: Vec<Message>,
}

impl From<Envelope> for FeedBatch {
    fn from(env: Envelope) -> Self {
        Self {
            response: env.response,
            symbol: env.symbol,
            cursor: env.cursor,
            messages: env.messages,
        }
    }
}

/// Recency buckets ("temperature"). Each message lands in at most one bucket.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityCounts {
    #[serde(rename = "last10Minutes")]
    pub recent: u32,
    #[serde(rename = "last1Hour")]
    pub short_term: u32,
    #[serde(rename = "last3Hours")]
    pub mid_term: u32,
}

impl ActivityCounts {
    pub fn total(&self) -> u32 {
        self.recent + self.short_term + self.mid_term
    }
}

/// Latest recency profile for a symbol. Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivitySnapshot {
    pub symbol: String,
    pub info: SymbolInfo,
    pub response: ResponseStatus,
    pub cursor: Cursor,
    pub temperature: ActivityCounts,
    pub updated_at: DateTime<Utc>,
}

/// A message as persisted for one symbol; `(symbol, body)` is the dedup key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredMessage {
    pub symbol: String,
    pub id: u64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub user: User,
    pub source: Source,
    pub symbols: Vec<SymbolInfo>,
}

impl StoredMessage {
    pub fn from_message(symbol: &str, msg: &Message) -> Self {
        Self {
            symbol: symbol.to_string(),
            id: msg.id,
            body: msg.body.clone(),
            created_at: msg.created_at,
            user: msg.user.clone(),
            source: msg.source.clone(),
            symbols: msg.symbols.clone(),
        }
    }
}

#[async_trait::async_trait]
pub trait MessageFeed: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<FeedBatch, FeedError>;
    fn name(&self) -> &'static str;
}
