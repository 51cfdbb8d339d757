use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::filename::{self, DOCUMENT_EXTENSION, NEW_DOCUMENT_PREFIX};
use crate::storage::{
    DirectoryIndex, DirectoryLister, DocumentHandle, DocumentIndexEntry, DocumentStore, FsStore,
    IndexSnapshot, Workspace,
};
use crate::sync::{Clock, OpenDocument, SystemClock};

/// Result of a successful [`SyncEngine::create_new`].
#[derive(Debug)]
pub struct CreateOutcome {
    /// The new document, bound to its file.
    pub document: OpenDocument,
    /// Set when the file was created but the index could not be refreshed
    /// afterwards. The index then still shows the previous listing.
    pub refresh_error: Option<Error>,
}

/// Result of a successful [`SyncEngine::save`].
#[derive(Debug)]
pub struct SaveOutcome {
    /// Handle the content now lives under.
    pub handle: DocumentHandle,
    /// The previous handle, when the save renamed the file.
    pub renamed_from: Option<DocumentHandle>,
    /// Whether another file already had the new name and was replaced.
    pub overwrote: bool,
    /// Set when the save went through but the index could not be refreshed.
    pub refresh_error: Option<Error>,
}

/// Result of a successful [`SyncEngine::delete`].
#[derive(Debug)]
pub struct DeleteOutcome {
    /// Document to show next, or `None` when the workspace is empty.
    pub next: Option<DocumentHandle>,
    /// Set when the file was deleted but the index could not be refreshed.
    /// `next` is then picked from the previous listing.
    pub refresh_error: Option<Error>,
}

/// Keeps documents in a workspace in step with their content-derived names.
///
/// Mutating operations (create, save, delete) are serialized by one lock per
/// engine. Clones share the lock, the store and the index, so work can be
/// handed to other tasks.
#[derive(Clone)]
pub struct SyncEngine {
    workspace: Workspace,
    store: Arc<dyn DocumentStore>,
    index: Arc<DirectoryIndex>,
    clock: Arc<dyn Clock>,
    timeout: Option<Duration>,
    lock: Arc<Mutex<()>>,
}

impl SyncEngine {
    pub fn new(
        workspace: Workspace,
        store: Arc<dyn DocumentStore>,
        lister: Arc<dyn DirectoryLister>,
    ) -> Self {
        let index = DirectoryIndex::new(workspace.path().to_path_buf(), lister);
        SyncEngine {
            workspace,
            store,
            index: Arc::new(index),
            clock: Arc::new(SystemClock),
            timeout: None,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Engine working on the real files of `workspace`.
    pub fn on_disk(workspace: Workspace) -> Self {
        let store = Arc::new(FsStore::new());
        Self::new(workspace, store.clone(), store)
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Fails reads and existence checks that take longer than `after` with
    /// [`Error::Timeout`].
    ///
    /// Writes, renames and deletes are never cut short: once handed to the
    /// filesystem they run to completion, so the engine waits for their
    /// result to know which name the content lives under.
    pub fn with_timeout(mut self, after: Duration) -> Self {
        self.timeout = Some(after);
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn index(&self) -> &DirectoryIndex {
        &self.index
    }

    /// Rebuilds the directory index.
    pub async fn refresh(&self) -> Result<Arc<IndexSnapshot>> {
        self.index.refresh().await
    }

    /// Entries as of the last refresh.
    pub fn entries(&self) -> Vec<DocumentIndexEntry> {
        self.index.entries()
    }

    /// Reads the document behind `handle`.
    #[instrument(skip(self), fields(name = %handle.name()))]
    pub async fn load(&self, handle: &DocumentHandle) -> Result<OpenDocument> {
        let bytes = self.bounded("read", self.store.read(handle)).await?;
        debug!("Loaded {} bytes", bytes.len());
        Ok(OpenDocument::bound(handle.clone(), String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Creates a document with a fresh timestamped name and a heading.
    #[instrument(skip(self))]
    pub async fn create_new(&self) -> Result<CreateOutcome> {
        let _guard = self.lock.lock().await;

        // Pick up files created outside this session before choosing a name
        let snapshot = self.index.refresh().await?;
        let name = filename::generate_unique_name(
            snapshot.names(),
            NEW_DOCUMENT_PREFIX,
            DOCUMENT_EXTENSION,
            self.clock.now(),
        )?;

        let handle = self.workspace.handle(&name);
        let header = format!("# {}\n", filename::title_from_generated_name(&name));
        self.store.write(&handle, header.as_bytes()).await?;
        info!("Created {}", name);

        let refresh_error = self.refresh_after_change().await;
        Ok(CreateOutcome { document: OpenDocument::bound(handle, header), refresh_error })
    }

    /// Persists the content of `doc`, renaming its file to match the title.
    ///
    /// When the name changes the file is renamed first and the content is
    /// then written atomically under the new name. If that write fails the
    /// rename is undone, so the caller sees either the whole save or none of
    /// it. `doc` is only marked saved once the content is on disk.
    ///
    /// An existing file with the new name is replaced and reported through
    /// [`SaveOutcome::overwrote`].
    #[instrument(skip(self, doc), fields(name = doc.handle().map(|h| h.name())))]
    pub async fn save(&self, doc: &mut OpenDocument) -> Result<SaveOutcome> {
        let current = doc.handle().cloned().ok_or(Error::NoActiveDocument)?;
        let _guard = self.lock.lock().await;

        let desired = format!("{}{}", filename::slug_or_untitled(doc.content()), DOCUMENT_EXTENSION);
        if desired == current.name() {
            debug!("Name unchanged, skipping rename");
            self.store.write(&current, doc.content().as_bytes()).await?;
            doc.mark_saved(current.clone());
            let refresh_error = self.refresh_after_change().await;
            return Ok(SaveOutcome { handle: current, renamed_from: None, overwrote: false, refresh_error });
        }

        let target = current.sibling(&desired);
        // The index can lag behind files created elsewhere
        let overwrote = self.index.contains(&desired)
            || self.bounded("exists", self.store.exists(&target)).await?;
        if overwrote {
            info!("Replacing existing file {}", target.name());
        }

        self.store.rename(&current, &target).await?;
        if let Err(e) = self.store.write(&target, doc.content().as_bytes()).await {
            self.undo_rename(doc, &current, &target).await;
            return Err(e);
        }
        info!("Renamed {} to {}", current.name(), target.name());

        doc.mark_saved(target.clone());
        let refresh_error = self.refresh_after_change().await;
        Ok(SaveOutcome { handle: target, renamed_from: Some(current), overwrote, refresh_error })
    }

    /// Moves the file back after a failed write. When that is impossible the
    /// document follows the file, keeping its unsaved content.
    async fn undo_rename(&self, doc: &mut OpenDocument, current: &DocumentHandle, target: &DocumentHandle) {
        match self.store.rename(target, current).await {
            Ok(()) => debug!("Restored {} after failed write", current.name()),
            Err(e) => {
                warn!("Could not restore {}, file stays at {}: {}", current.name(), target.name(), e);
                doc.rebind(target.clone());
                // Leave the index in step with the file's new name
                self.refresh_after_change().await;
            }
        }
    }

    /// Deletes the file behind `handle`, which sat at `current_index` in the
    /// listing, and picks the document to show next.
    ///
    /// See [`next_selection`] for the policy.
    #[instrument(skip(self), fields(name = %handle.name()))]
    pub async fn delete(&self, handle: &DocumentHandle, current_index: usize) -> Result<DeleteOutcome> {
        let _guard = self.lock.lock().await;

        let before = self.index.snapshot();
        self.store.delete(handle).await?;
        info!("Deleted {}", handle.name());

        let (remaining, refresh_error) = match self.index.refresh().await {
            Ok(snapshot) => (snapshot.entries().to_vec(), None),
            Err(e) => {
                warn!("Index refresh failed after delete: {}", e);
                let remaining = before
                    .entries()
                    .iter()
                    .filter(|entry| &entry.handle != handle)
                    .cloned()
                    .collect::<Vec<_>>();
                (remaining, Some(e))
            }
        };

        let next = next_selection(remaining.len(), current_index)
            .and_then(|i| remaining.get(i))
            .map(|entry| entry.handle.clone());
        Ok(DeleteOutcome { next, refresh_error })
    }

    /// Refreshes the index after a change that already reached the disk.
    /// A failure is returned rather than raised, since the change stands.
    async fn refresh_after_change(&self) -> Option<Error> {
        match self.index.refresh().await {
            Ok(_) => None,
            Err(e) => {
                warn!("Index refresh failed after a completed change: {}", e);
                Some(e)
            }
        }
    }

    /// Applies the configured timeout to a call that is safe to abandon.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match self.timeout {
            Some(after) => tokio::time::timeout(after, fut)
                .await
                .map_err(|_| Error::Timeout { operation, after })?,
            None => fut.await,
        }
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("workspace", &self.workspace)
            .field("index", &self.index)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Index to select after deleting the entry at `deleted_index`, given the
/// number of entries that remain.
///
/// Keeps the same position (which now holds the following entry), moves to
/// the last entry when the deleted one was last, and yields `None` when
/// nothing is left.
pub fn next_selection(remaining: usize, deleted_index: usize) -> Option<usize> {
    if remaining == 0 {
        None
    } else {
        Some(deleted_index.min(remaining - 1))
    }
}
