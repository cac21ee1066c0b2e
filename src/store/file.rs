// src/store/file.rs
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{MessageStore, StoreState};
use crate::ingest::dedup::KnownBodies;
use crate::ingest::types::{ActivitySnapshot, StoredMessage};

const MESSAGES_FILE: &str = "messages.jsonl";
const PROFILES_FILE: &str = "profiles.json";

/// Directory-backed store: an append-only JSON-lines message log plus a profile map
/// rewritten atomically on every upsert.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    state: Mutex<StoreState>,
}

impl FileStore {
    /// Open (or create) a store in `dir`, loading whatever was persisted before.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("creating store dir {}", dir.display()))?;

        let mut state = StoreState::default();
        load_messages(&dir.join(MESSAGES_FILE), &mut state)?;
        load_profiles(&dir.join(PROFILES_FILE), &mut state)?;

        tracing::info!(
            target: "store",
            dir = %dir.display(),
            symbols = state.messages.len(),
            profiles = state.profiles.len(),
            "file store opened"
        );

        Ok(Self {
            dir,
            state: Mutex::new(state),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().expect("file store mutex poisoned")
    }
}

fn load_messages(path: &Path, state: &mut StoreState) -> Result<()> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("opening {}", path.display())),
    };
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<StoredMessage>(&line) {
            Ok(msg) => state.push_message(msg),
            Err(e) => {
                tracing::warn!(target: "store", error = %e, line = lineno + 1, "skipping malformed message line");
            }
        }
    }
    Ok(())
}

fn load_profiles(path: &Path, state: &mut StoreState) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    state.profiles =
        serde_json::from_str(&s).with_context(|| format!("parsing {}", path.display()))?;
    Ok(())
}

fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(value)?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(&data)?;
    f.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl MessageStore for FileStore {
    async fn known_bodies(&self, symbol: &str) -> Result<KnownBodies> {
        Ok(self.lock().known_bodies(symbol))
    }

    async fn insert_message(&self, msg: StoredMessage) -> Result<()> {
        let mut line = serde_json::to_string(&msg)?;
        line.push('\n');

        let mut state = self.lock();
        let path = self.dir.join(MESSAGES_FILE);
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        let len = f.metadata()?.len();
        if let Err(e) = f.write_all(line.as_bytes()) {
            // a torn line would swallow the next append on reload
            let _ = f.set_len(len);
            return Err(e).with_context(|| format!("appending to {}", path.display()));
        }
        state.push_message(msg);
        Ok(())
    }

    async fn upsert_profile(&self, snapshot: ActivitySnapshot) -> Result<()> {
        let mut state = self.lock();
        let mut next = state.profiles.clone();
        next.insert(snapshot.symbol.clone(), snapshot);
        let path = self.dir.join(PROFILES_FILE);
        write_json_atomic(&path, &next).with_context(|| format!("writing {}", path.display()))?;
        state.profiles = next;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{ActivityCounts, Cursor, ResponseStatus, Source, SymbolInfo, User};
    use chrono::Utc;

    fn snapshot(symbol: &str, recent: u32) -> ActivitySnapshot {
        ActivitySnapshot {
            symbol: symbol.into(),
            info: SymbolInfo::default(),
            response: ResponseStatus { status: 200 },
            cursor: Cursor::default(),
            temperature: ActivityCounts {
                recent,
                ..Default::default()
            },
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn failed_profile_write_keeps_previous_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.upsert_profile(snapshot("AAPL", 1)).await.unwrap();

        // a directory in place of profiles.json makes the rename fail
        let path = dir.path().join(PROFILES_FILE);
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(store.upsert_profile(snapshot("AAPL", 9)).await.is_err());
        assert!(store.upsert_profile(snapshot("TSLA", 2)).await.is_err());

        let p = store.profile("AAPL").await.unwrap().unwrap();
        assert_eq!(p.temperature.recent, 1);
        assert!(store.profile("TSLA").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped_on_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store
                .insert_message(StoredMessage {
                    symbol: "AAPL".into(),
                    id: 1,
                    body: "first".into(),
                    created_at: Utc::now(),
                    user: User::default(),
                    source: Source::default(),
                    symbols: vec![],
                })
                .await
                .unwrap();
        }
        let mut f = OpenOptions::new()
            .append(true)
            .open(dir.path().join(MESSAGES_FILE))
            .unwrap();
        f.write_all(b"{\"symbol\": \"AAPL\", \"bo\n").unwrap();

        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.message_count("AAPL").await.unwrap(), 1);
        assert!(store.known_bodies("AAPL").await.unwrap().contains("first"));
    }
}
