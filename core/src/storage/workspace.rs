use crate::error::{ConfigError, Error, Result};
use crate::storage::DocumentHandle;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument};

/// The single directory holding all managed documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    // Absolute path to the workspace root
    absolute_path: PathBuf,
}

impl Workspace {
    /// Opens an existing directory as a workspace.
    ///
    /// Checks that the path exists, is a directory and can be listed.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Workspace> {
        debug!("Attempting to open workspace");

        let meta = fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::from(ConfigError::MissingFolder(path.to_path_buf()))
            } else {
                Error::List { path: path.to_path_buf(), source: e }
            }
        })?;

        if !meta.is_dir() {
            return Err(ConfigError::NotADirectory(path.to_path_buf()).into());
        }

        // Fail early if the directory cannot be listed
        fs::read_dir(path)
            .await
            .map_err(|e| Error::List { path: path.to_path_buf(), source: e })?;

        let absolute_path = fs::canonicalize(path)
            .await
            .map_err(|e| Error::List { path: path.to_path_buf(), source: e })?;
        debug!("Canonicalized workspace path: {}", absolute_path.display());

        Ok(Workspace { absolute_path })
    }

    /// Uses `path` as the workspace root without touching the filesystem.
    ///
    /// Meant for stores that do not live on disk, such as
    /// [`MemoryStore`](crate::storage::MemoryStore).
    pub fn detached(path: impl Into<PathBuf>) -> Workspace {
        Workspace { absolute_path: path.into() }
    }

    /// Returns the root path of the workspace.
    pub fn path(&self) -> &Path {
        &self.absolute_path
    }

    /// Returns the handle for the document called `name` in this workspace.
    /// The file need not exist.
    pub fn handle(&self, name: &str) -> DocumentHandle {
        DocumentHandle::new(&self.absolute_path, name)
    }
}
