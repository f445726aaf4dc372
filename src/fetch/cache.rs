use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

fn hash_url(url: &str) -> String {
    format!("{:016x}", xxh3_64(url.as_bytes()))
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    stored_at: u64,
    body: String,
}

/// On-disk HTTP response cache keyed by request URL. Entries expire after a
/// fixed TTL; stale or unreadable entries are treated as misses.
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new<P: AsRef<Path>>(dir: P, ttl: Duration) -> io::Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            ttl,
        })
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hash_url(url)))
    }

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    pub fn get(&self, url: &str) -> Option<String> {
        let path = self.entry_path(url);
        let raw = fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = serde_json::from_str(&raw).ok()?;
        let age = Self::now_secs().saturating_sub(entry.stored_at);
        if age > self.ttl.as_secs() {
            debug!("Cache entry for {} expired ({}s old)", url, age);
            return None;
        }
        Some(entry.body)
    }

    pub fn put(&self, url: &str, body: &str) -> io::Result<()> {
        let entry = CacheEntry {
            stored_at: Self::now_secs(),
            body: body.to_string(),
        };
        let serialized = serde_json::to_string(&entry)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        fs::write(self.entry_path(url), serialized)
    }
}
