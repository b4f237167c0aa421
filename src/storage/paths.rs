//! File layout helpers
//!
//! Maps store names and keys onto paths, rejecting names that would
//! escape the store directory.

use std::path::{Path, PathBuf};

use crate::error::{Result, ShelfError};

/// Extension of a record file
pub const RECORD_EXT: &str = "pt";

/// Suffix appended to a record file name for its backup
pub const BACKUP_SUFFIX: &str = ".bak";

/// Check that `name` can be used as a single path component
///
/// Rejects empty names, `.` and `..`, and anything containing a path
/// separator or NUL.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ShelfError::InvalidKey("name is empty".to_string()));
    }
    if name == "." || name == ".." {
        return Err(ShelfError::InvalidKey(format!("{:?} is reserved", name)));
    }
    if name.chars().any(|c| c == '/' || c == '\\' || c == '\0') {
        return Err(ShelfError::InvalidKey(format!(
            "{:?} contains a path separator or NUL",
            name
        )));
    }
    Ok(())
}

/// Directory of the store `name` under `base_path`
pub fn store_dir(base_path: &Path, name: &str) -> Result<PathBuf> {
    validate_name(name)?;
    Ok(base_path.join(name))
}

/// "{dir}/{key}.pt"
pub fn record_path(dir: &Path, key: &str) -> Result<PathBuf> {
    validate_name(key)?;
    Ok(dir.join(format!("{}.{}", key, RECORD_EXT)))
}

/// "{dir}/{key}.pt" → "{dir}/{key}.pt.bak"
pub fn backup_path(record: &Path) -> PathBuf {
    let mut name = record.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}
