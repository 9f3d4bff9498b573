//! Local key-value store of last-known-good collections.
//!
//! Entries are keyed by [`ResourceKind`] and hold raw JSON so one store can
//! serve every collection type. There is no expiry: a stale entry is better
//! than nothing when the network is down.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::CacheError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Providers,
    Bookings,
    Offers,
}

impl ResourceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Providers => "providers",
            ResourceKind::Bookings => "bookings",
            ResourceKind::Offers => "offers",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synchronous, local cache contract. Concurrent readers are allowed;
/// writers overwrite the whole entry (last writer wins).
pub trait CacheStore: Send + Sync {
    fn get(&self, kind: ResourceKind) -> Option<serde_json::Value>;

    /// # Errors
    ///
    /// Returns [`CacheError`] if a persistent store cannot write the entry.
    fn set(&self, kind: ResourceKind, value: serde_json::Value) -> Result<(), CacheError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<ResourceKind, serde_json::Value>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, kind: ResourceKind) -> Option<serde_json::Value> {
        // A poisoned lock still holds a usable map; the cache is best-effort.
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.get(&kind).cloned()
    }

    fn set(&self, kind: ResourceKind, value: serde_json::Value) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(kind, value);
        Ok(())
    }
}

/// One `<kind>.json` file per resource under a directory. Survives restarts.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    dir: PathBuf,
}

impl JsonFileCache {
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, kind: ResourceKind) -> PathBuf {
        self.dir.join(format!("{kind}.json"))
    }
}

impl CacheStore for JsonFileCache {
    fn get(&self, kind: ResourceKind) -> Option<serde_json::Value> {
        let path = self.path_for(kind);
        let raw = std::fs::read(&path).ok()?;
        match serde_json::from_slice(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt cache entry");
                None
            }
        }
    }

    fn set(&self, kind: ResourceKind, value: serde_json::Value) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(&value)?;
        // Unique staging file beside the target; persist is a rename.
        let mut staged = tempfile::NamedTempFile::new_in(&self.dir)?;
        staged.write_all(&bytes)?;
        staged.persist(self.path_for(kind)).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn memory_cache_round_trips_and_overwrites() {
        let cache = MemoryCache::new();
        assert!(cache.get(ResourceKind::Offers).is_none());
        cache.set(ResourceKind::Offers, json!([{"id": "o1"}])).unwrap();
        cache.set(ResourceKind::Offers, json!([{"id": "o2"}])).unwrap();
        assert_eq!(cache.get(ResourceKind::Offers), Some(json!([{"id": "o2"}])));
        assert!(cache.get(ResourceKind::Bookings).is_none());
    }

    #[test]
    fn memory_cache_supports_concurrent_readers() {
        let cache = std::sync::Arc::new(MemoryCache::new());
        cache.set(ResourceKind::Providers, json!([1, 2, 3])).unwrap();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = std::sync::Arc::clone(&cache);
                std::thread::spawn(move || cache.get(ResourceKind::Providers))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Some(json!([1, 2, 3])));
        }
    }

    #[test]
    fn file_cache_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let first = JsonFileCache::open(dir.path()).unwrap();
        first
            .set(ResourceKind::Bookings, json!([{"id": "b1"}]))
            .unwrap();

        let second = JsonFileCache::open(dir.path()).unwrap();
        assert_eq!(
            second.get(ResourceKind::Bookings),
            Some(json!([{"id": "b1"}]))
        );
        assert!(dir.path().join("bookings.json").exists());
    }

    #[test]
    fn file_cache_survives_concurrent_writers() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::open(dir.path()).unwrap();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|writer| {
                    let cache = &cache;
                    scope.spawn(move || {
                        for round in 0..25 {
                            cache.set(
                                ResourceKind::Providers,
                                json!([{"writer": writer, "round": round}]),
                            )?;
                        }
                        Ok::<_, CacheError>(())
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap().unwrap();
            }
        });

        let last = cache.get(ResourceKind::Providers).expect("entry parses");
        assert_eq!(last[0]["round"], 24);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name() != "providers.json")
            .collect();
        assert!(leftovers.is_empty(), "stray files: {leftovers:?}");
    }

    #[test]
    fn file_cache_ignores_corrupt_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("offers.json"), b"{not json").unwrap();
        let cache = JsonFileCache::open(dir.path()).unwrap();
        assert!(cache.get(ResourceKind::Offers).is_none());
    }
}
