use std::path::Path;

use tracing::{debug, instrument};

use crate::config::{self, RetryPolicy, WorkspaceSource};
use crate::error::{Error, Result};
use crate::event::define_event_listeners;
use crate::notice::{Notice, NoticeKind};
use crate::storage::{DocumentHandle, DocumentIndexEntry, Workspace};
use crate::sync::{DocumentState, OpenDocument, SaveOutcome, SyncEngine};

define_event_listeners!(SessionEvents {
    notice: Notice,
});

/// One editing session: the open workspace, the document being edited and
/// the listeners told about every outcome.
///
/// Each operation reports success or failure as a [`Notice`] on
/// [`SessionEvents::notice`] and also returns the result. On failure the
/// open document keeps its last known good state.
#[derive(Debug, Default)]
pub struct Session {
    engine: Option<SyncEngine>,
    document: OpenDocument,
    pub on: SessionEvents,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(&self) -> Option<&SyncEngine> {
        self.engine.as_ref()
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.engine.as_ref().map(|engine| engine.workspace())
    }

    pub fn document(&self) -> &OpenDocument {
        &self.document
    }

    /// Opens the workspace named by `source`, retrying per `policy`.
    ///
    /// When no workspace can be loaded the session stays without one.
    pub async fn initialize(&mut self, source: &dyn WorkspaceSource, policy: RetryPolicy) -> Result<()> {
        let path = match config::load_with_retry(source, policy).await {
            Ok(path) => path,
            Err(e) => return self.fail(e),
        };
        self.open_workspace(&path).await
    }

    /// Switches to the folder at `path` using the real filesystem.
    pub async fn open_workspace(&mut self, path: &Path) -> Result<()> {
        match Workspace::open(path).await {
            Ok(workspace) => self.attach(SyncEngine::on_disk(workspace)).await,
            Err(e) => self.fail(e),
        }
    }

    /// Replaces the current workspace with the one `engine` manages.
    #[instrument(skip(self, engine), fields(path = %engine.workspace().path().display()))]
    pub async fn attach(&mut self, engine: SyncEngine) -> Result<()> {
        self.document = OpenDocument::unbound();
        let snapshot = match engine.refresh().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.engine = None;
                return self.fail(e);
            }
        };
        let message = format!(
            "{} ({} documents)",
            engine.workspace().path().display(),
            snapshot.len()
        );
        self.engine = Some(engine);
        self.notify(Notice::info(NoticeKind::WorkspaceReady, "Workspace Opened", message));
        Ok(())
    }

    /// Lists the workspace again.
    pub async fn refresh(&self) -> Result<Vec<DocumentIndexEntry>> {
        let engine = self.require_engine()?;
        match engine.refresh().await {
            Ok(snapshot) => Ok(snapshot.entries().to_vec()),
            Err(e) => self.fail(e),
        }
    }

    /// Documents as of the last refresh; empty without a workspace.
    pub fn entries(&self) -> Vec<DocumentIndexEntry> {
        self.engine.as_ref().map(SyncEngine::entries).unwrap_or_default()
    }

    /// Position of `handle` in the current listing.
    pub fn position(&self, handle: &DocumentHandle) -> Option<usize> {
        self.engine.as_ref()?.index().snapshot().position(handle)
    }

    /// Creates a new document and makes it the open one.
    pub async fn create_new(&mut self) -> Result<DocumentHandle> {
        let engine = self.require_engine()?.clone();
        match engine.create_new().await {
            Ok(outcome) => {
                let handle = outcome.document.handle().cloned().ok_or(Error::NoActiveDocument)?;
                self.document = outcome.document;
                self.notify(Notice::info(NoticeKind::Created, "File Created", handle.name()));
                self.report_stale_listing(outcome.refresh_error.as_ref());
                Ok(handle)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Opens the document behind `handle`.
    pub async fn load(&mut self, handle: &DocumentHandle) -> Result<&str> {
        let engine = self.require_engine()?.clone();
        match engine.load(handle).await {
            Ok(document) => {
                self.replace_document(document, handle);
                Ok(self.document.content())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Replaces the content of the open document without saving it.
    pub fn edit(&mut self, content: impl Into<String>) {
        self.document.edit(content);
    }

    /// Saves `content` as the open document, renaming its file to match the
    /// title.
    pub async fn save(&mut self, content: impl Into<String>) -> Result<SaveOutcome> {
        if self.document.handle().is_none() {
            return self.fail(Error::NoActiveDocument);
        }
        let engine = self.require_engine()?.clone();

        self.document.edit(content);
        match engine.save(&mut self.document).await {
            Ok(outcome) => {
                if outcome.overwrote {
                    self.notify(Notice::info(
                        NoticeKind::Overwriting,
                        "File Overwritten",
                        format!("Replaced the existing {}", outcome.handle.name()),
                    ));
                }
                if let Some(old) = &outcome.renamed_from {
                    self.notify(Notice::info(
                        NoticeKind::Renamed,
                        "File Renamed",
                        format!("{} to {}", old.name(), outcome.handle.name()),
                    ));
                }
                self.notify(Notice::info(NoticeKind::Saved, "File Saved", outcome.handle.name()));
                self.report_stale_listing(outcome.refresh_error.as_ref());
                Ok(outcome)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Deletes the document behind `handle`, shown at `index` in the listing,
    /// and opens the document that takes its place.
    ///
    /// Returns the newly opened document, or `None` once the workspace is
    /// empty and the editor is cleared. The delete stands even when the
    /// following document cannot be opened; that failure is only notified
    /// and `None` is returned.
    pub async fn delete(&mut self, handle: &DocumentHandle, index: usize) -> Result<Option<DocumentHandle>> {
        let engine = self.require_engine()?.clone();
        let outcome = match engine.delete(handle, index).await {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(e),
        };
        self.notify(Notice::info(NoticeKind::Deleted, "File Deleted", handle.name()));
        self.report_stale_listing(outcome.refresh_error.as_ref());

        if self.document.handle() == Some(handle) {
            self.document = OpenDocument::unbound();
        }
        let Some(next) = outcome.next else {
            debug!("Workspace is empty, clearing the editor");
            self.warn_if_discarding();
            self.document = OpenDocument::unbound();
            return Ok(None);
        };
        match engine.load(&next).await {
            Ok(document) => {
                self.replace_document(document, &next);
                Ok(Some(next))
            }
            Err(e) => {
                self.notify(Notice::failure(&e));
                Ok(None)
            }
        }
    }

    /// Makes `document` the open one, warning first when that drops unsaved
    /// edits of the previous one.
    fn replace_document(&mut self, document: OpenDocument, handle: &DocumentHandle) {
        self.warn_if_discarding();
        self.document = document;
        self.notify(Notice::info(NoticeKind::Loaded, "File Opened", handle.name()));
    }

    fn warn_if_discarding(&self) {
        if self.document.state() != DocumentState::Dirty {
            return;
        }
        let name = self.document.handle().map_or("the open document", |h| h.name());
        self.notify(Notice::warning(
            "Unsaved Changes Discarded",
            format!("Changes to {name} were not saved"),
        ));
    }

    fn report_stale_listing(&self, err: Option<&Error>) {
        if let Some(err) = err {
            self.notify(Notice::stale_listing(err));
        }
    }

    fn require_engine(&self) -> Result<&SyncEngine> {
        match &self.engine {
            Some(engine) => Ok(engine),
            None => self.fail(Error::NoWorkspace),
        }
    }

    fn notify(&self, notice: Notice) {
        notice.log();
        self.on.notice.dispatch(&notice);
    }

    fn fail<T>(&self, err: Error) -> Result<T> {
        self.notify(Notice::failure(&err));
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::event::Subscription;
    use crate::storage::MemoryStore;
    use crate::sync::FixedClock;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use crate::storage::DirectoryLister;
    use std::io;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn engine_with(files: &[(&str, &str)]) -> (SyncEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_files(files.iter().copied()));
        let now = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let engine = SyncEngine::new(Workspace::detached("/ws"), store.clone(), store.clone())
            .with_clock(FixedClock(now));
        (engine, store)
    }

    /// Lister that starts failing from the `fail_from`-th call, counted from 0.
    struct FailingLister {
        inner: Arc<MemoryStore>,
        calls: AtomicUsize,
        fail_from: usize,
    }

    #[async_trait]
    impl DirectoryLister for FailingLister {
        async fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= self.fail_from {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "listing denied"));
            }
            self.inner.list(dir).await
        }
    }

    /// Engine whose listing works for the first `fail_from` refreshes only.
    fn engine_with_failing_lister(files: &[(&str, &str)], fail_from: usize) -> (SyncEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_files(files.iter().copied()));
        let lister = Arc::new(FailingLister { inner: store.clone(), calls: AtomicUsize::new(0), fail_from });
        (SyncEngine::new(Workspace::detached("/ws"), store.clone(), lister), store)
    }

    fn record(session: &Session) -> (Arc<Mutex<Vec<Notice>>>, Subscription<Notice>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = session.on.notice.subscribe(move |n: &Notice| sink.lock().unwrap().push(n.clone()));
        (seen, sub)
    }

    fn kinds(seen: &Mutex<Vec<Notice>>) -> Vec<NoticeKind> {
        seen.lock().unwrap().iter().map(|n| n.kind).collect()
    }

    struct Unconfigured;

    #[async_trait]
    impl WorkspaceSource for Unconfigured {
        async fn load_workspace_path(&self) -> Result<PathBuf> {
            Err(ConfigError::NotConfigured(PathBuf::from("/cfg/config.json")).into())
        }
    }

    #[tokio::test]
    async fn operations_without_workspace_fail() {
        let mut session = Session::new();
        let (seen, _sub) = record(&session);

        assert!(matches!(session.create_new().await, Err(Error::NoWorkspace)));
        assert!(session.entries().is_empty());
        assert_eq!(kinds(&seen), vec![NoticeKind::Failed]);
        assert_eq!(seen.lock().unwrap()[0].title, "Error Creating File");
    }

    #[tokio::test]
    async fn failed_initialize_leaves_no_workspace() {
        let mut session = Session::new();
        let (seen, _sub) = record(&session);
        let policy = RetryPolicy { attempts: 2, backoff: Duration::ZERO };

        let result = session.initialize(&Unconfigured, policy).await;

        assert!(matches!(result, Err(Error::Configuration(ConfigError::RetriesExhausted { .. }))));
        assert!(session.workspace().is_none());
        let notices = seen.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Configuration Error");
        assert!(notices[0].cause.as_deref().unwrap().contains("No workspace folder"));
    }

    #[tokio::test]
    async fn save_requires_open_document() {
        let (engine, _store) = engine_with(&[("a.md", "# A")]);
        let mut session = Session::new();
        session.attach(engine).await.unwrap();

        let result = session.save("# Anything").await;
        assert!(matches!(result, Err(Error::NoActiveDocument)));
        assert_eq!(session.document().state(), DocumentState::Unbound);
    }

    #[tokio::test]
    async fn create_edit_save_flow() {
        let (engine, store) = engine_with(&[]);
        let mut session = Session::new();
        let (seen, _sub) = record(&session);
        session.attach(engine).await.unwrap();

        let created = session.create_new().await.unwrap();
        assert_eq!(created.name(), "note-20240101_120000.md");
        assert_eq!(session.document().content(), "# note-20240101_120000\n");

        let outcome = session.save("# My First Note\n\nHello").await.unwrap();

        assert_eq!(outcome.handle.name(), "my-first-note.md");
        assert_eq!(session.document().handle(), Some(&outcome.handle));
        assert_eq!(session.position(&outcome.handle), Some(0));
        assert_eq!(store.names(), vec!["my-first-note.md".to_string()]);
        assert_eq!(
            kinds(&seen),
            vec![NoticeKind::WorkspaceReady, NoticeKind::Created, NoticeKind::Renamed, NoticeKind::Saved]
        );
    }

    #[tokio::test]
    async fn save_over_existing_name_notifies() {
        let (engine, store) = engine_with(&[("target.md", "old"), ("draft.md", "# Draft")]);
        let mut session = Session::new();
        session.attach(engine).await.unwrap();
        let draft = session.workspace().unwrap().handle("draft.md");
        session.load(&draft).await.unwrap();
        let (seen, _sub) = record(&session);

        session.save("# Target\nnew").await.unwrap();

        assert_eq!(kinds(&seen), vec![NoticeKind::Overwriting, NoticeKind::Renamed, NoticeKind::Saved]);
        assert_eq!(store.content("target.md").as_deref(), Some("# Target\nnew"));
        assert_eq!(session.entries().len(), 1);
    }

    #[tokio::test]
    async fn delete_opens_next_document() {
        let (engine, _store) = engine_with(&[("a.md", "# A"), ("b.md", "# B"), ("c.md", "# C")]);
        let mut session = Session::new();
        session.attach(engine).await.unwrap();
        let ws = session.workspace().unwrap().clone();

        session.load(&ws.handle("c.md")).await.unwrap();
        let next = session.delete(&ws.handle("c.md"), 2).await.unwrap();

        assert_eq!(next.as_ref().map(|h| h.name()), Some("b.md"));
        assert_eq!(session.document().content(), "# B");
        assert_eq!(session.document().state(), DocumentState::Bound);
    }

    #[tokio::test]
    async fn deleting_last_document_clears_editor() {
        let (engine, _store) = engine_with(&[("only.md", "# Only")]);
        let mut session = Session::new();
        session.attach(engine).await.unwrap();
        let handle = session.workspace().unwrap().handle("only.md");
        session.load(&handle).await.unwrap();

        let next = session.delete(&handle, 0).await.unwrap();

        assert!(next.is_none());
        assert_eq!(session.document().state(), DocumentState::Unbound);
        assert_eq!(session.document().content(), "");
    }

    #[tokio::test]
    async fn failed_delete_keeps_document() {
        let (engine, _store) = engine_with(&[("a.md", "# A")]);
        let mut session = Session::new();
        session.attach(engine).await.unwrap();
        let ws = session.workspace().unwrap().clone();
        session.load(&ws.handle("a.md")).await.unwrap();
        let (seen, _sub) = record(&session);

        let result = session.delete(&ws.handle("missing.md"), 0).await;

        assert!(matches!(result, Err(Error::Delete { .. })));
        assert_eq!(session.document().handle().unwrap().name(), "a.md");
        assert_eq!(kinds(&seen), vec![NoticeKind::Failed]);
    }
    #[tokio::test]
    async fn untouched_new_document_saves_under_its_name() {
        let (engine, store) = engine_with(&[]);
        let mut session = Session::new();
        session.attach(engine).await.unwrap();

        session.create_new().await.unwrap();
        let content = session.document().content().to_string();
        let outcome = session.save(content).await.unwrap();

        assert!(outcome.renamed_from.is_none());
        assert_eq!(store.names(), vec!["note-20240101_120000.md".to_string()]);
    }

    #[tokio::test]
    async fn save_survives_failed_refresh() {
        let (engine, store) = engine_with_failing_lister(&[("draft.md", "# Draft")], 1);
        let mut session = Session::new();
        session.attach(engine).await.unwrap();
        let draft = session.workspace().unwrap().handle("draft.md");
        session.load(&draft).await.unwrap();
        let (seen, _sub) = record(&session);

        let outcome = session.save("# Kept").await.unwrap();

        assert_eq!(outcome.handle.name(), "kept.md");
        assert_eq!(session.document().handle(), Some(&outcome.handle));
        assert_eq!(session.document().state(), DocumentState::Bound);
        assert_eq!(store.names(), vec!["kept.md".to_string()]);
        assert_eq!(kinds(&seen), vec![NoticeKind::Renamed, NoticeKind::Saved, NoticeKind::Warning]);
    }

    #[tokio::test]
    async fn delete_survives_failed_refresh() {
        let (engine, store) = engine_with_failing_lister(&[("a.md", "# A"), ("b.md", "# B")], 1);
        let mut session = Session::new();
        session.attach(engine).await.unwrap();
        let ws = session.workspace().unwrap().clone();
        session.load(&ws.handle("a.md")).await.unwrap();
        let (seen, _sub) = record(&session);

        let next = session.delete(&ws.handle("a.md"), 0).await.unwrap();

        assert_eq!(next.as_ref().map(|h| h.name()), Some("b.md"));
        assert_eq!(store.names(), vec!["b.md".to_string()]);
        assert_eq!(session.document().handle().unwrap().name(), "b.md");
        assert_eq!(session.document().content(), "# B");
        assert_eq!(kinds(&seen), vec![NoticeKind::Deleted, NoticeKind::Warning, NoticeKind::Loaded]);
    }

    #[tokio::test]
    async fn deleting_another_document_warns_about_unsaved_edits() {
        let (engine, _store) = engine_with(&[("a.md", "# A"), ("b.md", "# B"), ("c.md", "# C")]);
        let mut session = Session::new();
        session.attach(engine).await.unwrap();
        let ws = session.workspace().unwrap().clone();
        session.load(&ws.handle("a.md")).await.unwrap();
        session.edit("# A\nunsaved");
        let (seen, _sub) = record(&session);

        let next = session.delete(&ws.handle("c.md"), 2).await.unwrap();

        assert_eq!(next.as_ref().map(|h| h.name()), Some("b.md"));
        assert_eq!(kinds(&seen), vec![NoticeKind::Deleted, NoticeKind::Warning, NoticeKind::Loaded]);
        let notices = seen.lock().unwrap();
        assert_eq!(notices[1].message, "Changes to a.md were not saved");
    }
}
