// src/config/pipeline.rs
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};

use crate::ingest::providers::stocktwits::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};

pub const ENV_CONFIG_PATH: &str = "PULSE_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/pulse.json";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_timeout_secs() -> u64 {
    2
}
fn default_interval_secs() -> u64 {
    300
}
fn default_store_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request deadline for the feed call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Delay between two polling ticks.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            interval_secs: default_interval_secs(),
            store_dir: default_store_dir(),
            listen_addr: default_listen_addr(),
        }
    }
}

impl PipelineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        let mut cfg: PipelineConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing pipeline config {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// $PULSE_CONFIG_PATH, else `config/pulse.json`, else defaults; env overrides last.
    pub fn load_default() -> anyhow::Result<Self> {
        let mut cfg = match env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
                }
                Self::load_from_file(&pb)?
            }
            Err(_) => {
                let p = PathBuf::from(DEFAULT_CONFIG_PATH);
                if p.exists() {
                    Self::load_from_file(&p)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    fn sanitize(&mut self) {
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if self.interval_secs == 0 {
            self.interval_secs = default_interval_secs();
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = default_user_agent();
        }
        if self.base_url.trim().is_empty() {
            self.base_url = default_base_url();
        }
    }

    fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(v) = env::var("PULSE_BASE_URL") {
            self.base_url = v;
        }
        if let Ok(v) = env::var("PULSE_USER_AGENT") {
            self.user_agent = v;
        }
        if let Ok(v) = env::var("PULSE_STORE_DIR") {
            self.store_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("PULSE_INTERVAL_SECS") {
            self.interval_secs = v
                .trim()
                .parse()
                .with_context(|| format!("PULSE_INTERVAL_SECS is not a number: {v}"))?;
        }
        self.sanitize();
        Ok(())
    }
}
