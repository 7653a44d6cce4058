//! Durable storage for the two proxy pools.
//!
//! The store is a plain key/collection abstraction: it has no locking and
//! no cross-pool transactions. Callers that share a store between tasks
//! must serialize access themselves.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// File name of the available pool inside a [`FilePoolStore`] directory.
pub const AVAILABLE_FILENAME: &str = "proxies_list.txt";
/// File name of the used pool inside a [`FilePoolStore`] directory.
pub const USED_FILENAME: &str = "used_proxies.txt";

/// The two proxy collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    /// Entries not yet handed out. Consumed from the end.
    Available,
    /// Append-only log of entries already handed out.
    Used,
}

impl Pool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pool::Available => "available",
            Pool::Used => "used",
        }
    }

    fn file_name(&self) -> &'static str {
        match self {
            Pool::Available => AVAILABLE_FILENAME,
            Pool::Used => USED_FILENAME,
        }
    }
}

/// A proxy address in `ip:port` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyEntry(String);

impl ProxyEntry {
    /// Parse an `ip:port` line. Surrounding whitespace is ignored.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (host, port) = s.rsplit_once(':')?;
        if host.is_empty() || port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self(s.to_string()))
    }

    /// Build an entry from separate host and port cells.
    pub fn from_parts(host: &str, port: &str) -> Option<Self> {
        Self::parse(&format!("{}:{}", host.trim(), port.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// HTTP proxy URL for this entry.
    pub fn to_url(&self) -> String {
        format!("http://{}", self.0)
    }
}

impl fmt::Display for ProxyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage for the available and used pools.
pub trait PoolStore {
    /// Whether the pool has ever been written (an empty pool still exists).
    fn exists(&self, pool: Pool) -> bool;

    /// Read the pool in order. A missing pool reads as empty.
    fn read(&self, pool: Pool) -> io::Result<Vec<ProxyEntry>>;

    /// Replace the entire content of the pool.
    fn replace(&mut self, pool: Pool, entries: &[ProxyEntry]) -> io::Result<()>;

    /// Append entries to the end of the pool, creating it if needed.
    fn append(&mut self, pool: Pool, entries: &[ProxyEntry]) -> io::Result<()>;

    /// Delete the pool. Deleting a missing pool is not an error.
    fn clear(&mut self, pool: Pool) -> io::Result<()>;

    /// Remove and return the last entry of the pool.
    fn pop_last(&mut self, pool: Pool) -> io::Result<Option<ProxyEntry>> {
        let mut entries = self.read(pool)?;
        let last = entries.pop();
        if last.is_some() {
            self.replace(pool, &entries)?;
        }
        Ok(last)
    }
}

/// Pools persisted as newline-delimited text files in one directory.
#[derive(Debug, Clone)]
pub struct FilePoolStore {
    dir: PathBuf,
}

impl FilePoolStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, pool: Pool) -> PathBuf {
        self.dir.join(pool.file_name())
    }
}

impl PoolStore for FilePoolStore {
    fn exists(&self, pool: Pool) -> bool {
        self.path(pool).is_file()
    }

    fn read(&self, pool: Pool) -> io::Result<Vec<ProxyEntry>> {
        let content = match fs::read_to_string(self.path(pool)) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(content.lines().filter_map(ProxyEntry::parse).collect())
    }

    fn replace(&mut self, pool: Pool, entries: &[ProxyEntry]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        // Write to a sibling temp file and rename so readers never see a
        // half-written pool.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        for entry in entries {
            writeln!(tmp, "{}", entry)?;
        }
        tmp.flush()?;
        tmp.persist(self.path(pool)).map_err(|e| e.error)?;
        Ok(())
    }

    fn append(&mut self, pool: Pool, entries: &[ProxyEntry]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(pool))?;
        for entry in entries {
            writeln!(file, "{}", entry)?;
        }
        Ok(())
    }

    fn clear(&mut self, pool: Pool) -> io::Result<()> {
        match fs::remove_file(self.path(pool)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// In-memory pools, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryPoolStore {
    available: Option<Vec<ProxyEntry>>,
    used: Option<Vec<ProxyEntry>>,
}

impl MemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, pool: Pool) -> &Option<Vec<ProxyEntry>> {
        match pool {
            Pool::Available => &self.available,
            Pool::Used => &self.used,
        }
    }

    fn slot_mut(&mut self, pool: Pool) -> &mut Option<Vec<ProxyEntry>> {
        match pool {
            Pool::Available => &mut self.available,
            Pool::Used => &mut self.used,
        }
    }
}

impl PoolStore for MemoryPoolStore {
    fn exists(&self, pool: Pool) -> bool {
        self.slot(pool).is_some()
    }

    fn read(&self, pool: Pool) -> io::Result<Vec<ProxyEntry>> {
        Ok(self.slot(pool).clone().unwrap_or_default())
    }

    fn replace(&mut self, pool: Pool, entries: &[ProxyEntry]) -> io::Result<()> {
        *self.slot_mut(pool) = Some(entries.to_vec());
        Ok(())
    }

    fn append(&mut self, pool: Pool, entries: &[ProxyEntry]) -> io::Result<()> {
        self.slot_mut(pool)
            .get_or_insert_with(Vec::new)
            .extend_from_slice(entries);
        Ok(())
    }

    fn clear(&mut self, pool: Pool) -> io::Result<()> {
        *self.slot_mut(pool) = None;
        Ok(())
    }
}
