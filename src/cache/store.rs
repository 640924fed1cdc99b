//! Storage backends for the local response cache.
//!
//! Stores hold raw serialized entries keyed by string. They know nothing
//! about versions or expiry; [`LocalResponseCache`](super::LocalResponseCache)
//! interprets the contents.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;

use crate::{FitgenError, Result};

/// Default maximum number of entries in a [`MemoryStore`].
const DEFAULT_MEMORY_MAX: u64 = 10_000;

/// Raw key/value storage.
pub trait CacheStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `raw` under `key`, replacing any previous value.
    fn put(&self, key: &str, raw: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

// ============================================================================
// FileStore
// ============================================================================

/// Durable store with one JSON file per key under a directory.
///
/// Writes go to a temporary file unique to the writer, which is then renamed
/// into place, so a reader never observes a half-written entry. Concurrent
/// writers to the same key are last-write-wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store entries under `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<user cache dir>/fitgen`, if the platform has one.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|d| d.join("fitgen"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Map a key to a filesystem-safe stem.
///
/// Bytes outside `[A-Za-z0-9_-]` are written as `%XX`, so distinct keys never
/// share a file.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            stem.push(char::from(b));
        } else {
            let _ = write!(stem, "%{b:02X}");
        }
    }
    stem
}

/// Temporary sibling of `path`, distinct per process and per write.
fn temp_path(path: &Path) -> PathBuf {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let seq = NEXT.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.{seq}.tmp", std::process::id()));
    path.with_file_name(name)
}

fn storage_err(action: &str, path: &Path, e: io::Error) -> FitgenError {
    FitgenError::Storage(format!("failed to {action} {}: {e}", path.display()))
}

impl CacheStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err("read", &path, e)),
        }
    }

    fn put(&self, key: &str, raw: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| storage_err("create", &self.dir, e))?;
        let path = self.path_for(key);
        let tmp = temp_path(&path);
        fs::write(&tmp, raw).map_err(|e| storage_err("write", &tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            storage_err("replace", &path, e)
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_err("remove", &path, e)),
        }
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// Bounded in-process store (moka). Not durable across restarts.
pub struct MemoryStore {
    entries: Cache<String, String>,
}

impl MemoryStore {
    /// Create a store with the default capacity (10,000 entries).
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MEMORY_MAX)
    }

    pub fn with_max_entries(max: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(max).build(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key))
    }

    fn put(&self, key: &str, raw: &str) -> Result<()> {
        self.entries.insert(key.to_string(), raw.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.invalidate(key);
        Ok(())
    }
}
