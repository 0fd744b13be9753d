//! Cache Storage seam.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use async_trait::async_trait;

use crate::error::CacheResult;
use crate::key::CacheKey;
use crate::request::Response;

/// A single named cache store (`Cache`).
#[async_trait(?Send)]
pub trait CacheStore {
    /// Look up an entry.
    async fn lookup(&self, key: &CacheKey) -> CacheResult<Option<Response>>;

    /// Store an entry, replacing any previous one.
    async fn put(&self, key: &CacheKey, response: Response) -> CacheResult<()>;
}

/// The origin's set of named cache stores (`CacheStorage`).
#[async_trait(?Send)]
pub trait CacheStorage {
    /// Handle to one store.
    type Store: CacheStore;

    /// Open a store, creating it if missing.
    async fn open(&self, name: &str) -> CacheResult<Self::Store>;

    /// Names of all existing stores.
    async fn names(&self) -> CacheResult<Vec<String>>;

    /// Delete a store. Returns whether it existed.
    async fn delete(&self, name: &str) -> CacheResult<bool>;
}

type Entries = Rc<RefCell<BTreeMap<CacheKey, Response>>>;

/// In-memory cache storage (for native builds and tests).
///
/// Clones share the same stores, like every worker of an origin sharing one
/// `CacheStorage`.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStorage {
    stores: Rc<RefCell<BTreeMap<String, Entries>>>,
}

impl MemoryCacheStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a store exists.
    pub fn has_store(&self, name: &str) -> bool {
        self.stores.borrow().contains_key(name)
    }

    /// Names of all stores, sorted.
    pub fn store_names(&self) -> Vec<String> {
        self.stores.borrow().keys().cloned().collect()
    }

    /// Read an entry directly, bypassing the async API.
    pub fn entry(&self, name: &str, key: &CacheKey) -> Option<Response> {
        self.stores
            .borrow()
            .get(name)
            .and_then(|entries| entries.borrow().get(key).cloned())
    }

    /// Number of entries in a store (0 if missing).
    pub fn entry_count(&self, name: &str) -> usize {
        self.stores
            .borrow()
            .get(name)
            .map(|entries| entries.borrow().len())
            .unwrap_or(0)
    }
}

/// Handle to one in-memory store.
#[derive(Debug, Clone)]
pub struct MemoryCacheStore {
    entries: Entries,
}

#[async_trait(?Send)]
impl CacheStore for MemoryCacheStore {
    async fn lookup(&self, key: &CacheKey) -> CacheResult<Option<Response>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    async fn put(&self, key: &CacheKey, response: Response) -> CacheResult<()> {
        self.entries.borrow_mut().insert(key.clone(), response);
        Ok(())
    }
}

#[async_trait(?Send)]
impl CacheStorage for MemoryCacheStorage {
    type Store = MemoryCacheStore;

    async fn open(&self, name: &str) -> CacheResult<Self::Store> {
        let entries = self
            .stores
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .clone();
        Ok(MemoryCacheStore { entries })
    }

    async fn names(&self) -> CacheResult<Vec<String>> {
        Ok(self.store_names())
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        Ok(self.stores.borrow_mut().remove(name).is_some())
    }
}
