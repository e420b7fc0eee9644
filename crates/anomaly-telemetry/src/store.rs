//! Append-only session stores
//!
//! A store keeps loaded sessions so repeated lookups don't hit the provider
//! again. Entries are never evicted and never overwritten: a second `put`
//! for a key already present fails with [`Error::StoreConflict`].
//!
//! Stores are injected by the caller; nothing in this crate keeps a global
//! cache.

use crate::session::{Session, SessionKind};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Identity of a stored session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey {
    pub year: u16,
    pub event: String,
    pub kind: SessionKind,
}

impl StoreKey {
    pub fn new(year: u16, event: impl Into<String>, kind: SessionKind) -> Self {
        Self {
            year,
            event: event.into(),
            kind,
        }
    }

    /// File name used by [`DirectoryStore`]
    ///
    /// Characters other than ASCII letters and digits in the event name
    /// become `_`.
    pub fn file_name(&self) -> String {
        format!("{}_{}_{}.json", self.year, slug(&self.event), self.kind.code())
    }
}

/// Event name reduced to ASCII letters, digits and `_`, safe as one path
/// component
pub(crate) fn slug(event: &str) -> String {
    event
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.year, self.event, self.kind)
    }
}

/// Lookup statistics of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StoreStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

/// Append-only, eviction-free storage of loaded sessions
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &StoreKey) -> Result<Option<Session>>;

    /// Add a session; fails with `StoreConflict` if the key is present
    fn put(&self, key: StoreKey, session: Session) -> Result<()>;

    fn contains(&self, key: &StoreKey) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn stats(&self) -> StoreStats;
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn get(&self, key: &StoreKey) -> Result<Option<Session>> {
        (**self).get(key)
    }

    fn put(&self, key: StoreKey, session: Session) -> Result<()> {
        (**self).put(key, session)
    }

    fn contains(&self, key: &StoreKey) -> Result<bool> {
        (**self).contains(key)
    }

    fn stats(&self) -> StoreStats {
        (**self).stats()
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl Counters {
    fn record<T>(&self, found: &Option<T>) {
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// In-process store
///
/// Entries only ever get added, so a poisoned lock still guards a consistent
/// map and is recovered rather than reported.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<StoreKey, Arc<Session>>>,
    counters: Counters,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<Option<Session>> {
        let found = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|s| Session::clone(s));
        self.counters.record(&found);
        Ok(found)
    }

    fn put(&self, key: StoreKey, session: Session) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&key) {
            return Err(Error::StoreConflict(key.to_string()));
        }
        debug!(key = %key, laps = session.laps.len(), "stored session in memory");
        entries.insert(key, Arc::new(session));
        Ok(())
    }

    fn contains(&self, key: &StoreKey) -> Result<bool> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key))
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
        }
    }
}

/// One JSON file per session under a root directory
///
/// Files are created with create-new semantics, so two writers racing on
/// the same key cannot both succeed.
#[derive(Debug)]
pub struct DirectoryStore {
    root: PathBuf,
    counters: Counters,
}

impl DirectoryStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            counters: Counters::default(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, key: &StoreKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    fn write_new(path: &Path, session: &Session) -> Result<()> {
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, session)?;
        writer.flush()?;
        Ok(())
    }
}

impl SessionStore for DirectoryStore {
    fn get(&self, key: &StoreKey) -> Result<Option<Session>> {
        let found: Option<Session> = match File::open(self.path_of(key)) {
            Ok(file) => Some(serde_json::from_reader(BufReader::new(file))?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        self.counters.record(&found);
        Ok(found)
    }

    fn put(&self, key: StoreKey, session: Session) -> Result<()> {
        let path = self.path_of(&key);
        match Self::write_new(&path, &session) {
            Ok(()) => {
                debug!(key = %key, path = %path.display(), "stored session on disk");
                Ok(())
            }
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(Error::StoreConflict(key.to_string()))
            }
            Err(e) => {
                // drop the partial file so the key stays free
                let _ = fs::remove_file(&path);
                Err(e)
            }
        }
    }

    fn contains(&self, key: &StoreKey) -> Result<bool> {
        Ok(self.path_of(key).is_file())
    }

    fn stats(&self) -> StoreStats {
        let entries = fs::read_dir(&self.root)
            .map(|dir| {
                dir.filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
                    .count()
            })
            .unwrap_or(0);
        StoreStats {
            entries,
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
        }
    }
}
