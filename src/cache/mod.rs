//! Cache Module
//!
//! Read-through / write-through memory layer over any `Storage`.
//!
//! ## Responsibilities
//! - Serve repeated reads from memory
//! - Remember misses as well as hits
//! - Update memory only after the wrapped store has committed
//!
//! ## Data Structure Choice
//! `HashMap<String, Option<V>>` behind one Mutex:
//! - `Some(v)`: last value read or written
//! - `None`: the wrapped store reported the key absent
//! - no entry: not queried yet
//!
//! A cached miss is served like a hit. A record written to disk by another
//! process or another store instance is not seen until the entry is dropped
//! by `delete` or `delete_all` through this overlay.

use std::collections::HashMap;
use std::marker::PhantomData;

use parking_lot::Mutex;
use tracing::trace;

use crate::codec::Serializer;
use crate::error::Result;
use crate::storage::{DiskStore, Durability, Storage};

/// Memory overlay over a storage backend
///
/// ## Concurrency:
/// - `entries` is held across the call into the wrapped store and the map
///   update, so the map is never ahead of disk and no reader sees a
///   half-applied write
/// - A write drops the key's entry before delegating and re-inserts it only
///   on success, so a write that fails after touching disk leaves the key
///   to be re-read from the wrapped store
/// - Listeners of the wrapped store run while `entries` is held; they must
///   not call back into this overlay
/// - `entries` is one lock for all keys and is held across disk I/O, so a
///   cache hit on one key waits behind a slow read or write of another
pub struct MemoryStore<V, S> {
    inner: S,
    entries: Mutex<HashMap<String, Option<V>>>,
    _value: PhantomData<fn() -> V>,
}

impl<V, S> MemoryStore<V, S>
where
    V: Clone + Send,
    S: Storage<V>,
{
    /// Wrap `inner` with an empty cache
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
            _value: PhantomData,
        }
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of cached entries, absent markers included
    pub fn cached_len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether `key` has a cache entry (value or absent marker)
    pub fn is_cached(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Unwrap into the wrapped store, dropping the cache
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<V, Ser> MemoryStore<V, DiskStore<V, Ser>>
where
    V: Clone + Send,
    Ser: Serializer<V>,
{
    /// See [`DiskStore::set_listener`]
    pub fn set_listener<F>(&self, key: &str, listener: F)
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.inner.set_listener(key, listener);
    }

    /// See [`DiskStore::remove_listener`]
    pub fn remove_listener(&self, key: &str) {
        self.inner.remove_listener(key);
    }
}

impl<V, S> Storage<V> for MemoryStore<V, S>
where
    V: Clone + Send,
    S: Storage<V>,
{
    fn write(&self, key: &str, value: &V, durability: Durability) -> Result<()> {
        let mut entries = self.entries.lock();
        // The inner write may commit and still fail or unwind (commit
        // cleanup, a panicking listener); the next read must go to disk.
        entries.remove(key);
        self.inner.write(key, value, durability)?;
        entries.insert(key.to_string(), Some(value.clone()));
        Ok(())
    }

    fn read(&self, key: &str, durability: Durability) -> Result<Option<V>> {
        let mut entries = self.entries.lock();
        if let Some(cached) = entries.get(key) {
            trace!(key, hit = cached.is_some(), "cache hit");
            return Ok(cached.clone());
        }

        let value = self.inner.read(key, durability)?;
        entries.insert(key.to_string(), value.clone());
        Ok(value)
    }

    fn exist(&self, key: &str) -> Result<bool> {
        self.inner.exist(key)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        self.inner.delete(key)?;
        entries.remove(key);
        Ok(())
    }

    fn delete_all(&self) -> Result<()> {
        let mut entries = self.entries.lock();
        self.inner.delete_all()?;
        entries.clear();
        Ok(())
    }

    fn durability(&self) -> Durability {
        self.inner.durability()
    }
}
