// src/ingest/providers/mod.rs
pub mod fixture;
pub mod stocktwits;

use std::time::Duration;

use crate::ingest::types::{Envelope, FeedBatch};

/// Coarse error class used for logging and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedErrorKind {
    Fetch,
    Decode,
}

impl FeedErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedErrorKind::Fetch => "fetch",
            FeedErrorKind::Decode => "decode",
        }
    }
}

/// Failure of a single feed request. All variants are recoverable: the caller skips
/// the symbol for this tick.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("symbol must not be empty")]
    EmptySymbol,
    #[error("request for {symbol} timed out after {timeout:?}")]
    Timeout { symbol: String, timeout: Duration },
    #[error("request for {symbol} failed: {source}")]
    Transport {
        symbol: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("feed returned HTTP {status} for {symbol}")]
    HttpStatus { symbol: String, status: u16 },
    #[error("feed reported status {status} for {symbol}")]
    ProviderStatus { symbol: String, status: i64 },
    #[error("malformed feed payload for {symbol}: {source}")]
    Decode {
        symbol: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FeedError {
    pub fn kind(&self) -> FeedErrorKind {
        match self {
            FeedError::Decode { .. } => FeedErrorKind::Decode,
            _ => FeedErrorKind::Fetch,
        }
    }
}

/// Decode a stream envelope and reject non-2xx provider statuses.
pub fn parse_envelope(symbol: &str, body: &str) -> Result<FeedBatch, FeedError> {
    let env: Envelope = serde_json::from_str(body).map_err(|source| FeedError::Decode {
        symbol: symbol.to_string(),
        source,
    })?;
    if !(200..300).contains(&env.response.status) {
        return Err(FeedError::ProviderStatus {
            symbol: symbol.to_string(),
            status: env.response.status,
        });
    }
    Ok(env.into())
}
