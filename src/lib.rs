//! # ShelfKV
//!
//! A crash-consistent, per-key file-backed object store with:
//! - One file per key, written through a backup-swap protocol
//! - Lazy recovery of interrupted writes on the next read
//! - Safe and fast durability modes
//! - Per-key write listeners
//! - A read-through / write-through memory cache
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Shelf                               │
//! │               (named stores under data_dir)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         │
//!   ┌─────────────┐                  │
//!   │ MemoryStore │                  │
//!   │   (Mutex)   │                  │
//!   └──────┬──────┘                  │
//!          │        Storage trait    │
//!          ▼                         ▼
//!   ┌─────────────────────────────────────┐     ┌─────────────┐
//!   │              DiskStore              │────▶│  Listeners  │
//!   │   {key}.pt  +  {key}.pt.bak         │     │  (RwLock)   │
//!   └──────────────────┬──────────────────┘     └─────────────┘
//!                      │
//!                      ▼
//!               ┌─────────────┐
//!               │ Serializer  │
//!               │  (bincode)  │
//!               └─────────────┘
//! ```
//!
//! Each key is independently consistent; there is no atomicity across keys
//! and no locking across processes.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod storage;
pub mod cache;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ShelfError, Result};
pub use config::Config;
pub use codec::{BincodeSerializer, Serializer};
pub use storage::{DiskStore, Durability, Storage};
pub use cache::MemoryStore;
pub use engine::Shelf;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ShelfKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
