// src/ingest/providers/fixture.rs
use std::collections::HashMap;

use async_trait::async_trait;

use super::{parse_envelope, FeedError};
use crate::ingest::types::{FeedBatch, MessageFeed};

/// Serves canned stream payloads keyed by symbol. Unknown symbols answer HTTP 404.
#[derive(Debug, Clone, Default)]
pub struct FixtureFeed {
    payloads: HashMap<String, String>,
}

impl FixtureFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture_str(symbol: &str, json: &str) -> Self {
        Self::new().with(symbol, json)
    }

    pub fn with(mut self, symbol: &str, json: &str) -> Self {
        self.payloads.insert(symbol.to_string(), json.to_string());
        self
    }
}

#[async_trait]
impl MessageFeed for FixtureFeed {
    async fn fetch(&self, symbol: &str) -> Result<FeedBatch, FeedError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(FeedError::EmptySymbol);
        }
        match self.payloads.get(symbol) {
            Some(body) => parse_envelope(symbol, body),
            None => Err(FeedError::HttpStatus {
                symbol: symbol.to_string(),
                status: 404,
            }),
        }
    }

    fn name(&self) -> &'static str {
        "Fixture"
    }
}
