use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::storage::{DirectoryLister, DocumentHandle, DocumentStore, Error, Result};

/// [`DocumentStore`] and [`DirectoryLister`] backed by the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        FsStore
    }
}

#[async_trait]
impl DocumentStore for FsStore {
    #[instrument(skip(self), fields(path = %handle.path().display()))]
    async fn read(&self, handle: &DocumentHandle) -> Result<Vec<u8>> {
        fs::read(handle.path())
            .await
            .map_err(|e| Error::Read { path: handle.path().to_path_buf(), source: e })
    }

    #[instrument(skip(self, content), fields(path = %handle.path().display(), bytes = content.len()))]
    async fn write(&self, handle: &DocumentHandle, content: &[u8]) -> Result<()> {
        let target = handle.path().to_path_buf();
        let content = content.to_vec();

        let result = tokio::task::spawn_blocking(move || write_atomic(&target, &content))
            .await
            .map_err(std::io::Error::other)
            .and_then(|inner| inner);

        result.map_err(|e| {
            warn!("Write failed, previous content left in place: {}", e);
            Error::Write { path: handle.path().to_path_buf(), source: e }
        })?;
        debug!("Content written");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %handle.path().display()))]
    async fn delete(&self, handle: &DocumentHandle) -> Result<()> {
        fs::remove_file(handle.path())
            .await
            .map_err(|e| Error::Delete { path: handle.path().to_path_buf(), source: e })
    }

    #[instrument(skip(self), fields(from = %from.path().display(), to = %to.path().display()))]
    async fn rename(&self, from: &DocumentHandle, to: &DocumentHandle) -> Result<()> {
        fs::rename(from.path(), to.path()).await.map_err(|e| Error::Rename {
            from: from.path().to_path_buf(),
            to: to.path().to_path_buf(),
            source: e,
        })
    }

    async fn exists(&self, handle: &DocumentHandle) -> Result<bool> {
        fs::try_exists(handle.path())
            .await
            .map_err(|e| Error::ExistenceCheck { path: handle.path().to_path_buf(), source: e })
    }
}

#[async_trait]
impl DirectoryLister for FsStore {
    async fn list(&self, dir: &Path) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut read_dir = fs::read_dir(dir).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            // Follows symlinks, so linked notes are listed too
            match fs::metadata(entry.path()).await {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => continue,
                Err(e) => {
                    debug!("Skipping unreadable entry {:?}: {}", entry.file_name(), e);
                    continue;
                }
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => debug!("Skipping non-UTF-8 file name: {:?}", raw),
            }
        }
        Ok(names)
    }
}

/// Writes `content` to a temporary file next to `target`, flushes it to disk
/// and renames it over `target`.
fn write_atomic(target: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir: PathBuf = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
