// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "PULSE_WATCHLISTS_PATH";
const DEFAULT_PATHS: [&str; 2] = ["config/watchlists.toml", "config/watchlists.json"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stock {
    #[serde(default)]
    pub companyname: String,
    pub symbol: String,
}

/// A named list of stocks to poll.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Watchlist {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub stocks: Vec<Stock>,
}

/// Load watchlists from an explicit path. The extension picks the format:
/// `.toml` holds `[[lists]]` tables, `.json` a top-level array of lists.
pub fn load_watchlists_from(path: &Path) -> Result<Vec<Watchlist>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading watchlists from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_watchlists(&content, &ext)
        .with_context(|| format!("parsing watchlists {}", path.display()))
}

/// First hit wins: `$PULSE_WATCHLISTS_PATH` (must exist), then
/// `config/watchlists.toml`, then `config/watchlists.json`. No file means no lists.
pub fn load_watchlists_default() -> Result<Vec<Watchlist>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
        return load_watchlists_from(&pb);
    }
    DEFAULT_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map_or_else(|| Ok(Vec::new()), load_watchlists_from)
}

/// Every symbol of every list, trimmed, without blanks or repeats.
pub fn symbols(lists: &[Watchlist]) -> Vec<String> {
    let mut set = BTreeSet::new();
    for stock in lists.iter().flat_map(|l| l.stocks.iter()) {
        let t = stock.symbol.trim();
        if !t.is_empty() {
            set.insert(t.to_string());
        }
    }
    set.into_iter().collect()
}

fn parse_watchlists(s: &str, ext: &str) -> Result<Vec<Watchlist>> {
    match ext {
        "toml" => parse_toml(s),
        "json" => parse_json(s),
        other => Err(anyhow!("unsupported watchlist extension {other:?}")),
    }
}

fn parse_toml(s: &str) -> Result<Vec<Watchlist>> {
    #[derive(Deserialize)]
    struct TomlLists {
        #[serde(default)]
        lists: Vec<Watchlist>,
    }
    let v: TomlLists = toml::from_str(s)?;
    Ok(v.lists)
}

fn parse_json(s: &str) -> Result<Vec<Watchlist>> {
    let v: Vec<Watchlist> = serde_json::from_str(s)?;
    Ok(v)
}
