// src/ingest/providers/stocktwits.rs
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;

use super::{parse_envelope, FeedError};
use crate::config::pipeline::PipelineConfig;
use crate::ingest::types::{FeedBatch, MessageFeed};

pub const DEFAULT_BASE_URL: &str = "https://api.stocktwits.com";
/// The API refuses requests carrying reqwest's default agent.
pub const DEFAULT_USER_AGENT: &str = "Not Firefox";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// HTTP client for the per-symbol message stream. One request per fetch, no retries.
pub struct StocktwitsClient {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl StocktwitsClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("building stocktwits http client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn from_config(cfg: &PipelineConfig) -> Result<Self> {
        Self::new(
            &cfg.base_url,
            &cfg.user_agent,
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    pub fn stream_url(&self, symbol: &str) -> String {
        format!("{}/api/2/streams/symbol/{}.json", self.base_url, symbol)
    }

    fn transport_error(&self, symbol: &str, e: reqwest::Error) -> FeedError {
        if e.is_timeout() {
            FeedError::Timeout {
                symbol: symbol.to_string(),
                timeout: self.timeout,
            }
        } else {
            FeedError::Transport {
                symbol: symbol.to_string(),
                source: e,
            }
        }
    }
}

#[async_trait]
impl MessageFeed for StocktwitsClient {
    async fn fetch(&self, symbol: &str) -> Result<FeedBatch, FeedError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(FeedError::EmptySymbol);
        }

        let t0 = Instant::now();
        let resp = self
            .client
            .get(self.stream_url(symbol))
            .send()
            .await
            .map_err(|e| self.transport_error(symbol, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::HttpStatus {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| self.transport_error(symbol, e))?;
        histogram!("pulse_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        parse_envelope(symbol, &body)
    }

    fn name(&self) -> &'static str {
        "StockTwits"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_strips_trailing_slash() {
        let c = StocktwitsClient::new("http://localhost:9000/", DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
            .unwrap();
        assert_eq!(
            c.stream_url("AAPL"),
            "http://localhost:9000/api/2/streams/symbol/AAPL.json"
        );
    }

    #[tokio::test]
    async fn empty_symbol_is_rejected_without_io() {
        let c = StocktwitsClient::new("http://127.0.0.1:9", DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
            .unwrap();
        let err = c.fetch("   ").await.unwrap_err();
        assert!(matches!(err, FeedError::EmptySymbol));
    }
}
