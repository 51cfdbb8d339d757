use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, instrument};

use crate::storage::{DirectoryLister, DocumentHandle, DocumentIndexEntry, Error, Result};

/// Extension of managed documents, compared case-insensitively.
const MANAGED_EXTENSION: &str = "md";

/// One complete listing of the workspace.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    entries: Vec<DocumentIndexEntry>,
    names: HashSet<String>,
}

impl IndexSnapshot {
    fn new(entries: Vec<DocumentIndexEntry>) -> Self {
        let names = entries.iter().map(|e| e.name.clone()).collect();
        IndexSnapshot { entries, names }
    }

    /// Entries in listing order.
    pub fn entries(&self) -> &[DocumentIndexEntry] {
        &self.entries
    }

    pub fn names(&self) -> &HashSet<String> {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DocumentIndexEntry> {
        self.entries.get(index)
    }

    /// Position of `handle` in the listing.
    pub fn position(&self, handle: &DocumentHandle) -> Option<usize> {
        self.entries.iter().position(|e| &e.handle == handle)
    }
}

/// Cached listing of the documents in one directory.
///
/// The cache only changes on [`refresh`](Self::refresh), which swaps in a new
/// snapshot as a whole. Readers holding an older snapshot keep a consistent
/// view of it.
pub struct DirectoryIndex {
    dir: PathBuf,
    lister: Arc<dyn DirectoryLister>,
    current: ArcSwap<IndexSnapshot>,
}

impl DirectoryIndex {
    /// Creates an empty index for `dir`. Call [`refresh`](Self::refresh) to
    /// populate it.
    pub fn new(dir: PathBuf, lister: Arc<dyn DirectoryLister>) -> Self {
        DirectoryIndex {
            dir,
            lister,
            current: ArcSwap::from_pointee(IndexSnapshot::default()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists the directory again and replaces the cached index.
    ///
    /// On failure the previous index stays in place.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub async fn refresh(&self) -> Result<Arc<IndexSnapshot>> {
        let names = self.lister.list(&self.dir).await.map_err(|e| Error::List {
            path: self.dir.clone(),
            source: e,
        })?;

        let entries: Vec<DocumentIndexEntry> = names
            .into_iter()
            .filter(|name| is_managed(name))
            .map(|name| DocumentIndexEntry {
                handle: DocumentHandle::new(&self.dir, &name),
                name,
            })
            .collect();
        debug!("Found {} documents", entries.len());

        let snapshot = Arc::new(IndexSnapshot::new(entries));
        self.current.store(snapshot.clone());
        Ok(snapshot)
    }

    /// Whether `name` was present as of the last refresh.
    pub fn contains(&self, name: &str) -> bool {
        self.current.load().contains(name)
    }

    /// The index as of the last refresh.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.current.load_full()
    }

    /// Entries as of the last refresh.
    pub fn entries(&self) -> Vec<DocumentIndexEntry> {
        self.current.load().entries().to_vec()
    }
}

impl std::fmt::Debug for DirectoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryIndex")
            .field("dir", &self.dir)
            .field("entries", &self.current.load().len())
            .finish()
    }
}

fn is_managed(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MANAGED_EXTENSION))
}
