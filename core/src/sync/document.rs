use crate::storage::DocumentHandle;

/// Lifecycle of the document open in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// No backing file; nothing can be saved.
    Unbound,
    /// Content matches the file as of the last load or save.
    Bound,
    /// Content was edited since the last load or save.
    Dirty,
}

/// The document currently open in the editor: its backing file, if any, and
/// the content to persist.
///
/// `content` is the source of truth. The file on disk only catches up when a
/// save succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenDocument {
    handle: Option<DocumentHandle>,
    content: String,
    dirty: bool,
}

impl OpenDocument {
    /// An empty, unbound document.
    pub fn unbound() -> Self {
        Self::default()
    }

    /// A document whose content matches the file behind `handle`.
    pub fn bound(handle: DocumentHandle, content: impl Into<String>) -> Self {
        OpenDocument {
            handle: Some(handle),
            content: content.into(),
            dirty: false,
        }
    }

    pub fn handle(&self) -> Option<&DocumentHandle> {
        self.handle.as_ref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn state(&self) -> DocumentState {
        match (&self.handle, self.dirty) {
            (None, _) => DocumentState::Unbound,
            (Some(_), false) => DocumentState::Bound,
            (Some(_), true) => DocumentState::Dirty,
        }
    }

    /// Replaces the content. The handle is left alone.
    pub fn edit(&mut self, content: impl Into<String>) {
        let content = content.into();
        if content != self.content {
            self.content = content;
            self.dirty = true;
        }
    }

    /// Records a successful save under `handle`.
    pub(crate) fn mark_saved(&mut self, handle: DocumentHandle) {
        self.handle = Some(handle);
        self.dirty = false;
    }

    /// Points the document at the file's new name without marking it saved.
    pub(crate) fn rebind(&mut self, handle: DocumentHandle) {
        self.handle = Some(handle);
    }
}
