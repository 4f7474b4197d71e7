//! JSON-file storage for the CLI.
//!
//! The whole store is one JSON object keyed by [`StorageKey::as_str`]. Every
//! write replaces the file through a sibling temp file and a rename, so a
//! reader sees either the old record or the new one.

#[cfg(test)]
#[path = "file_test.rs"]
mod file_test;

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{SessionStorage, StorageError, StorageKey, StoredSession};

type Entries = BTreeMap<String, String>;

#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Entries {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Entries::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session file unreadable");
                return Entries::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session file corrupt; treating as empty");
                Entries::new()
            }
        }
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = open_private(&tmp)?;
            file.write_all(&encoded)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut Entries)) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut entries = self.read_entries();
        apply(&mut entries);
        self.write_entries(&entries)
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new().write(true).create(true).truncate(true).mode(0o600).open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create(true).truncate(true).open(path)
}

impl SessionStorage for FileStorage {
    fn get(&self, key: StorageKey) -> Option<String> {
        self.read_entries().remove(key.as_str())
    }

    fn write_session(&self, session: &StoredSession) -> Result<(), StorageError> {
        self.update(|entries| {
            for (key, value) in session.entries() {
                entries.insert(key.as_str().to_owned(), value.to_owned());
            }
        })
    }

    fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
