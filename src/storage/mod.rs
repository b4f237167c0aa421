//! Storage Module
//!
//! Per-key file storage with crash-consistent writes.
//!
//! ## Responsibilities
//! - Persist each record as one file under the store directory
//! - Protect the previous value with a backup during safe writes
//! - Recover interrupted writes lazily on the next safe read
//! - Notify per-key listeners after a successful write
//!
//! ## File Layout
//! ```text
//! {base_path}/{store}/
//!   ├── {key}.pt        current value
//!   └── {key}.pt.bak    previous value, only while a safe write is in flight
//! ```
//!
//! ## Record States (safe mode)
//! ```text
//! STABLE ──rename .pt → .pt.bak──▶ PROTECTED ──write .pt──▶ COMMITTING
//!    ▲                                 │                        │
//!    └────────remove .pt.bak───────────┼────────────────────────┘
//!                                      │
//!    crash in PROTECTED or COMMITTING: the next safe read drops .pt
//!    and renames .pt.bak back, restoring the old value
//! ```

mod disk;
mod listener;
pub mod paths;

pub use disk::DiskStore;
pub use listener::{Listener, ListenerRegistry};

use crate::error::Result;

/// How much crash protection a read or write gets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Durability {
    /// Keep a backup of the previous value until the new one is on disk,
    /// and recover from a leftover backup on read
    #[default]
    Safe,

    /// Write straight over the record file. A crash mid-write leaves a
    /// corrupt record with nothing to recover from
    Fast,
}

/// Storage capability shared by the file store and the cache overlay
pub trait Storage<V>: Send + Sync {
    /// Write `value` under `key`
    fn write(&self, key: &str, value: &V, durability: Durability) -> Result<()>;

    /// Read the value under `key`, `Ok(None)` if there is none
    fn read(&self, key: &str, durability: Durability) -> Result<Option<V>>;

    /// Whether a record file exists for `key`
    fn exist(&self, key: &str) -> Result<bool>;

    /// Remove the record for `key`; missing keys are ignored
    fn delete(&self, key: &str) -> Result<()>;

    /// Remove every record and the store directory itself
    fn delete_all(&self) -> Result<()>;

    /// Durability used by `put` and `get`
    fn durability(&self) -> Durability {
        Durability::Safe
    }

    /// Write with the store's default durability
    fn put(&self, key: &str, value: &V) -> Result<()> {
        self.write(key, value, self.durability())
    }

    /// Read with the store's default durability
    fn get(&self, key: &str) -> Result<Option<V>> {
        self.read(key, self.durability())
    }
}
