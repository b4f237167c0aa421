//! Disk Store
//!
//! One file per key, written with the backup-swap protocol.

use std::fs::{self, File};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::codec::Serializer;
use crate::error::{Result, ShelfError};

use super::listener::ListenerRegistry;
use super::paths;
use super::{Durability, Storage};

/// File-backed record store
///
/// ## Concurrency:
/// - `io_lock`: Serializes every check-then-act sequence on record files
///   (backup rename, recovery, delete), so two writers never both see
///   "no backup" and race on the protective rename
/// - `listeners`: Own RwLock; listeners run after `io_lock` is released,
///   so notifications for concurrent writes to one key are unordered
/// - No cross-process locking: two processes writing the same key
///   have undefined results
pub struct DiskStore<V, S> {
    /// Store name (last component of `files_dir`)
    name: String,

    /// Directory holding the record files
    files_dir: PathBuf,

    /// Encodes and decodes record contents
    serializer: S,

    /// Default durability for `put` / `get`
    durability: Durability,

    /// Per-key write listeners
    listeners: ListenerRegistry<V>,

    /// Guards file-level sequences
    io_lock: Mutex<()>,

    _value: PhantomData<fn() -> V>,
}

impl<V, S> DiskStore<V, S>
where
    S: Serializer<V>,
{
    /// Open or create the store `name` under `base_path`
    ///
    /// Creates `base_path/name` if it doesn't exist.
    pub fn open(name: &str, base_path: impl AsRef<Path>, serializer: S) -> Result<Self> {
        let files_dir = paths::store_dir(base_path.as_ref(), name)?;

        if !files_dir.is_dir() {
            fs::create_dir_all(&files_dir)
                .map_err(|e| ShelfError::structural("create store dir", &files_dir, e))?;
        }

        debug!(store = name, dir = %files_dir.display(), "opened disk store");

        Ok(Self {
            name: name.to_string(),
            files_dir,
            serializer,
            durability: Durability::Safe,
            listeners: ListenerRegistry::new(),
            io_lock: Mutex::new(()),
            _value: PhantomData,
        })
    }

    /// Set the durability used by `put` / `get`
    pub fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Call `listener` after every successful write to `key`
    ///
    /// Replaces any listener already set for `key`. The listener runs
    /// synchronously on the writing thread; a panic inside it propagates
    /// out of `write`, after the value is already on disk.
    ///
    /// Listeners run after the file lock is released. With concurrent
    /// writers on one key, notifications may arrive in a different order
    /// than the writes hit disk, so the last value a listener sees is not
    /// necessarily the one stored.
    pub fn set_listener<F>(&self, key: &str, listener: F)
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.listeners.set(key, listener);
    }

    /// Stop notifying on writes to `key`
    pub fn remove_listener(&self, key: &str) {
        self.listeners.remove(key);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Store name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory holding the record files
    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    /// Path of the record file for `key`
    pub fn record_path(&self, key: &str) -> Result<PathBuf> {
        paths::record_path(&self.files_dir, key)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Move the current value aside before it is overwritten
    ///
    /// A backup that already exists belongs to an interrupted write and
    /// stays authoritative; the original next to it is dropped.
    fn protect(&self, key: &str, original: &Path, backup: &Path) -> Result<()> {
        if !original.exists() {
            return Ok(());
        }

        if backup.exists() {
            info!(store = %self.name, key, "stale backup found, dropping original");
            remove_if_exists(original)
                .map_err(|e| ShelfError::structural("delete", original, e))?;
            return Ok(());
        }

        fs::rename(original, backup).map_err(|e| {
            ShelfError::Structural(format!(
                "couldn't rename file {} to backup file {}: {}",
                original.display(),
                backup.display(),
                e
            ))
        })
    }

    /// Create or truncate `path` and stream the encoded value into it
    fn write_record(&self, path: &Path, value: &V) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.serializer.serialize_into(value, &mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Put the backup back in place of a partial original
    fn recover(&self, key: &str, original: &Path, backup: &Path) -> Result<()> {
        if !backup.exists() {
            return Ok(());
        }

        info!(store = %self.name, key, "restoring record from backup");
        remove_if_exists(original).map_err(|e| ShelfError::structural("delete", original, e))?;
        fs::rename(backup, original).map_err(|e| {
            ShelfError::Structural(format!(
                "couldn't restore backup file {} to {}: {}",
                backup.display(),
                original.display(),
                e
            ))
        })
    }
}

impl<V, S> Storage<V> for DiskStore<V, S>
where
    S: Serializer<V>,
{
    /// Write `value` to `{key}.pt`
    ///
    /// Safe mode:
    /// 1. Rename the current file to `{key}.pt.bak` (or drop it if a stale
    ///    backup already exists)
    /// 2. Write and flush the new bytes
    /// 3. Remove the backup
    ///
    /// On a failure in step 2 the backup stays behind and the next safe
    /// read restores it. With no backup to fall back to, the partial file
    /// is removed.
    ///
    /// Fast mode writes in place, then drops any leftover backup so a later
    /// safe read can't roll the new value back.
    fn write(&self, key: &str, value: &V, durability: Durability) -> Result<()> {
        let original = self.record_path(key)?;
        let backup = paths::backup_path(&original);

        {
            let _guard = self.io_lock.lock();

            if durability == Durability::Safe {
                self.protect(key, &original, &backup)?;
                if let Err(err) = self.write_record(&original, value) {
                    if !backup.exists() {
                        if let Err(e) = remove_if_exists(&original) {
                            debug!(store = %self.name, key, error = %e, "couldn't remove partial record");
                        }
                    }
                    return Err(err);
                }
            } else {
                self.write_record(&original, value)?;
            }

            // Commit. Covers a backup made above and a stale one left by an
            // earlier interrupted write.
            remove_if_exists(&backup).map_err(|e| ShelfError::structural("delete", &backup, e))?;

            debug!(store = %self.name, key, ?durability, "wrote record");
        }

        self.listeners.notify(key, value);
        Ok(())
    }

    /// Read `{key}.pt`
    ///
    /// Safe mode restores a leftover backup first, and deletes an original
    /// that fails to decode. Fast mode leaves files untouched.
    fn read(&self, key: &str, durability: Durability) -> Result<Option<V>> {
        let original = self.record_path(key)?;
        let _guard = self.io_lock.lock();

        if durability == Durability::Safe {
            let backup = paths::backup_path(&original);
            self.recover(key, &original, &backup)?;
        }

        let bytes = match fs::read(&original) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match self.serializer.deserialize(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                if durability == Durability::Safe {
                    warn!(store = %self.name, key, error = %err, "dropping corrupt record");
                    remove_if_exists(&original)
                        .map_err(|e| ShelfError::structural("delete", &original, e))?;
                }
                Err(err)
            }
        }
    }

    fn exist(&self, key: &str) -> Result<bool> {
        let original = self.record_path(key)?;
        let _guard = self.io_lock.lock();
        Ok(original.is_file())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let original = self.record_path(key)?;
        let _guard = self.io_lock.lock();

        match fs::remove_file(&original) {
            Ok(()) => {
                debug!(store = %self.name, key, "deleted record");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ShelfError::Structural(format!(
                "couldn't delete file {} for table {}: {}",
                original.display(),
                key,
                e
            ))),
        }
    }

    /// Remove every file under the store directory, then the directory
    ///
    /// Best effort: entries that can't be removed are skipped, and failing
    /// to remove the directory itself is logged instead of returned.
    fn delete_all(&self) -> Result<()> {
        let _guard = self.io_lock.lock();

        if let Err(e) = remove_dir_contents(&self.files_dir) {
            debug!(store = %self.name, error = %e, "couldn't list store dir");
        }

        match fs::remove_dir(&self.files_dir) {
            Ok(()) => debug!(store = %self.name, "deleted store"),
            Err(e) => warn!(
                store = %self.name,
                dir = %self.files_dir.display(),
                error = %e,
                "couldn't delete store dir"
            ),
        }
        Ok(())
    }

    fn durability(&self) -> Durability {
        self.durability
    }
}

// =============================================================================
// File Helpers
// =============================================================================

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Remove everything inside `dir`, skipping entries that refuse
fn remove_dir_contents(dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(_) => continue,
        };
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        if let Err(e) = removed {
            debug!(path = %path.display(), error = %e, "couldn't remove entry");
        }
    }
    Ok(())
}
