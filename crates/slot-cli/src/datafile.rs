//! Reading and writing the JSON data file.
//!
//! Commands that change the file hold an exclusive advisory lock on a sibling
//! `<data>.lock` file from load until save, so concurrent `slots` runs apply
//! their writes one after another. Saves go to a temporary file in the same
//! directory that is then renamed over the data file, so readers see either
//! the old contents or the new ones.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use slot_engine::MemoryStore;
use tempfile::NamedTempFile;
use tracing::debug;

/// Exclusive lock over a data file. Released when dropped.
#[derive(Debug)]
pub struct DataLock {
    file: File,
    path: PathBuf,
}

impl DataLock {
    /// Block until no other process holds the lock for `data_path`.
    pub fn acquire(data_path: &Path) -> Result<Self> {
        let path = lock_path(data_path);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;
        FileExt::lock_exclusive(&file)
            .with_context(|| format!("Failed to lock data file: {}", data_path.display()))?;
        debug!(path = %path.display(), "acquired data lock");
        Ok(Self { file, path })
    }
}

impl Drop for DataLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(path = %self.path.display(), error = %e, "failed to release data lock");
        }
    }
}

fn lock_path(data_path: &Path) -> PathBuf {
    let mut name = OsString::from(data_path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// Load the data file, starting empty when it does not exist yet.
pub fn load_store(path: &Path) -> Result<MemoryStore> {
    if !path.exists() {
        debug!(path = %path.display(), "no data file, starting empty");
        return Ok(MemoryStore::new());
    }
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {}", path.display()))?;
    MemoryStore::from_json(&json)
        .with_context(|| format!("Failed to load data file: {}", path.display()))
}

/// Replace the data file with the store's contents in one rename.
pub fn save_store(path: &Path, store: &MemoryStore) -> Result<()> {
    let json = store.to_json().context("Failed to serialize data")?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(json.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .with_context(|| format!("Failed to write data file: {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write data file: {}", path.display()))?;
    debug!(path = %path.display(), "saved data file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slot_engine::{NewEventType, SchedulingStore};

    #[test]
    fn lock_file_sits_next_to_the_data_file() {
        assert_eq!(
            lock_path(Path::new("/tmp/data/slots.json")),
            PathBuf::from("/tmp/data/slots.json.lock")
        );
    }

    #[test]
    fn save_replaces_the_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("slots.json");
        fs::write(&data, "x".repeat(10_000)).unwrap();
        let store = MemoryStore::new();
        store
            .insert_event_type(NewEventType::new("Intro", 30, "intro"))
            .unwrap();

        save_store(&data, &store).unwrap();

        let loaded = load_store(&data).unwrap();
        assert_eq!(loaded.list_event_types().unwrap().len(), 1);
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "temporary file must be renamed away");
    }

    #[test]
    fn lock_can_be_taken_again_after_release() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("slots.json");

        drop(DataLock::acquire(&data).unwrap());
        let again = DataLock::acquire(&data);

        assert!(again.is_ok());
        assert!(!data.exists(), "locking must not create the data file");
    }
}
