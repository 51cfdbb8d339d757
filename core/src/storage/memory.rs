use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::storage::{DirectoryLister, DocumentHandle, DocumentStore, Error, Result};

/// In-process store keyed by file name.
///
/// Lists names in sorted order. Directories are not modelled; every handle
/// is treated as living in the one listed folder.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `(name, content)` pairs.
    pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = files
            .into_iter()
            .map(|(name, content)| (name.to_string(), content.as_bytes().to_vec()))
            .collect();
        MemoryStore { files: Mutex::new(map) }
    }

    fn files(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        // Every mutation is a single map call, so a poisoned map is still consistent
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Content of `name` as UTF-8, if present.
    pub fn content(&self, name: &str) -> Option<String> {
        let map = self.files();
        map.get(name).map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Every file name currently stored.
    pub fn names(&self) -> Vec<String> {
        self.files().keys().cloned().collect()
    }
}

fn not_found(handle: &DocumentHandle) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", handle.name()))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, handle: &DocumentHandle) -> Result<Vec<u8>> {
        let map = self.files();
        map.get(handle.name()).cloned().ok_or_else(|| Error::Read {
            path: handle.path().to_path_buf(),
            source: not_found(handle),
        })
    }

    async fn write(&self, handle: &DocumentHandle, content: &[u8]) -> Result<()> {
        let mut map = self.files();
        map.insert(handle.name().to_string(), content.to_vec());
        Ok(())
    }

    async fn delete(&self, handle: &DocumentHandle) -> Result<()> {
        let mut map = self.files();
        map.remove(handle.name()).map(|_| ()).ok_or_else(|| Error::Delete {
            path: handle.path().to_path_buf(),
            source: not_found(handle),
        })
    }

    async fn rename(&self, from: &DocumentHandle, to: &DocumentHandle) -> Result<()> {
        let mut map = self.files();
        let content = map.remove(from.name()).ok_or_else(|| Error::Rename {
            from: from.path().to_path_buf(),
            to: to.path().to_path_buf(),
            source: not_found(from),
        })?;
        map.insert(to.name().to_string(), content);
        Ok(())
    }

    async fn exists(&self, handle: &DocumentHandle) -> Result<bool> {
        Ok(self.files().contains_key(handle.name()))
    }
}

#[async_trait]
impl DirectoryLister for MemoryStore {
    async fn list(&self, _dir: &Path) -> io::Result<Vec<String>> {
        Ok(self.names())
    }
}
