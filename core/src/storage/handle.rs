use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of one document file inside a workspace.
///
/// Handles are plain values: renaming a document produces a new handle and
/// leaves the old one pointing at a name that no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentHandle {
    // Absolute path of the file
    path: PathBuf,
    // File name including extension, as shown to the user
    name: String,
}

impl DocumentHandle {
    pub(crate) fn new(dir: &Path, name: &str) -> Self {
        DocumentHandle {
            path: dir.join(name),
            name: name.to_string(),
        }
    }

    /// Returns the absolute path to the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file name, extension included.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a handle for a sibling file called `name`.
    pub(crate) fn sibling(&self, name: &str) -> Self {
        let dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        DocumentHandle::new(dir, name)
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One row of the directory index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentIndexEntry {
    pub name: String,
    pub handle: DocumentHandle,
}
