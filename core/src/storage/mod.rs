//! Filesystem storage for a flat folder of Markdown documents.
//!
//! # Core Concepts
//!
//! *   **[`Workspace`]:** The directory that holds every managed document. It is
//!     opened once per session; choosing another folder means building a new
//!     workspace and index from scratch.
//! *   **[`DocumentHandle`]:** Identity of one `.md` file in the workspace. A
//!     rename yields a new handle; handles are never mutated in place.
//! *   **[`DocumentStore`]:** Reads, writes, deletes and renames the file behind
//!     a handle, translating I/O failures into the typed [`Error`] kinds.
//! *   **[`DirectoryIndex`]:** A cached listing of the workspace's documents,
//!     rebuilt wholesale on every refresh and used for name collision checks.
//!
//! Both store traits are implemented by [`FsStore`] for real folders and by
//! [`MemoryStore`] for tests and other in-process use.
//!
//! # Asynchronous API
//!
//! All I/O is `async` and runs on `tokio`. Every method that touches the
//! filesystem returns [`Result`].
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use mdnote_core::storage::{DirectoryIndex, DocumentStore, FsStore, Workspace};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ws = Workspace::open("notes".as_ref()).await?;
//!     let store = Arc::new(FsStore::new());
//!
//!     store.write(&ws.handle("hello.md"), b"# Hello\n").await?;
//!
//!     let index = DirectoryIndex::new(ws.path().to_path_buf(), store.clone());
//!     for entry in index.refresh().await?.entries() {
//!         println!("{}", entry.name);
//!     }
//!     Ok(())
//! }
//! ```

pub use self::file::FsStore;
pub use self::handle::{DocumentHandle, DocumentIndexEntry};
pub use self::index::{DirectoryIndex, IndexSnapshot};
pub use self::memory::MemoryStore;
pub use self::workspace::Workspace;

mod file;
mod handle;
mod index;
mod memory;
mod workspace;

pub use crate::error::{Error, Result};

use async_trait::async_trait;
use std::path::Path;

/// File operations on documents identified by a [`DocumentHandle`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads the full content of the file.
    async fn read(&self, handle: &DocumentHandle) -> Result<Vec<u8>>;

    /// Replaces the content of the file, creating it if needed.
    ///
    /// Either the new content is in place afterwards or an error is returned
    /// and the previous content is untouched.
    async fn write(&self, handle: &DocumentHandle, content: &[u8]) -> Result<()>;

    /// Removes the file.
    async fn delete(&self, handle: &DocumentHandle) -> Result<()>;

    /// Moves `from` to `to`, replacing `to` if it exists.
    async fn rename(&self, from: &DocumentHandle, to: &DocumentHandle) -> Result<()>;

    /// Reports whether the file exists.
    async fn exists(&self, handle: &DocumentHandle) -> Result<bool>;
}

/// Something whose entries can be listed by name.
#[async_trait]
pub trait DirectoryLister: Send + Sync {
    /// Returns the names of the files directly inside `dir`, in listing order.
    async fn list(&self, dir: &Path) -> std::io::Result<Vec<String>>;
}
