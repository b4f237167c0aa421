//! Engine Module
//!
//! Opens named stores under one data directory.
//!
//! ## Responsibilities
//! - Create the data directory on startup
//! - Hand out disk stores and cached stores by name
//! - Destroy a store by name

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::MemoryStore;
use crate::codec::{BincodeSerializer, Serializer};
use crate::config::Config;
use crate::error::{Result, ShelfError};
use crate::storage::{DiskStore, Durability, Storage};

/// Entry point for a data directory of named stores
///
/// Each call to `disk` / `memory` opens a fresh store instance. Two
/// instances of the same store share files but not listeners or caches;
/// keep one instance per store name inside a process.
pub struct Shelf {
    config: Config,
}

impl Shelf {
    /// Open or create a shelf with the given config
    pub fn open(config: Config) -> Result<Self> {
        if config.data_dir.as_os_str().is_empty() {
            return Err(ShelfError::Config("data_dir is empty".to_string()));
        }

        fs::create_dir_all(&config.data_dir)
            .map_err(|e| ShelfError::structural("create data dir", &config.data_dir, e))?;

        info!(
            data_dir = %config.data_dir.display(),
            durability = ?config.durability,
            "shelf opened"
        );

        Ok(Self { config })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Open the disk store `name` with the default serializer
    pub fn disk<V>(&self, name: &str) -> Result<DiskStore<V, BincodeSerializer>>
    where
        V: Serialize + DeserializeOwned,
    {
        self.disk_with(name, BincodeSerializer::new())
    }

    /// Open the disk store `name` with an explicit serializer
    pub fn disk_with<V, S>(&self, name: &str, serializer: S) -> Result<DiskStore<V, S>>
    where
        S: Serializer<V>,
    {
        let store = DiskStore::open(name, &self.config.data_dir, serializer)?;
        Ok(store.with_durability(self.config.durability))
    }

    /// Open the store `name` behind a memory cache
    pub fn memory<V>(&self, name: &str) -> Result<MemoryStore<V, DiskStore<V, BincodeSerializer>>>
    where
        V: Serialize + DeserializeOwned + Clone + Send,
    {
        Ok(MemoryStore::new(self.disk(name)?))
    }

    /// Delete every record of the store `name`, and its directory
    ///
    /// Same best-effort semantics as `Storage::delete_all`. Instances of
    /// the store that are still open keep stale caches.
    pub fn destroy(&self, name: &str) -> Result<()> {
        debug!(store = name, "destroying store");
        // Value type is irrelevant to delete_all; raw bytes avoid a decode bound.
        let store: DiskStore<Vec<u8>, BincodeSerializer> = self.disk(name)?;
        store.delete_all()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Default durability of stores opened by this shelf
    pub fn durability(&self) -> Durability {
        self.config.durability
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
