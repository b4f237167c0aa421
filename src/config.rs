//! Configuration for ShelfKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::storage::Durability;

/// Main configuration for a Shelf instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all stores
    /// Internal structure:
    ///   {data_dir}/
    ///     └── {store}/
    ///           ├── {key}.pt       (current value)
    ///           └── {key}.pt.bak   (backup, only after an interrupted write)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Write Configuration
    // -------------------------------------------------------------------------
    /// Durability used by `Storage::put` / `Storage::get`
    pub durability: Durability,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./shelfkv_data"),
            durability: Durability::Safe,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all stores)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the default durability
    pub fn durability(mut self, durability: Durability) -> Self {
        self.config.durability = durability;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
