//! Core of a Markdown notes editor whose file names follow document titles.
//!
//! A [`Session`] owns the open [`Workspace`] (a flat folder of `.md` files)
//! and the document being edited. Saving a document renames its file after
//! the slug of its first line; new documents get a timestamped name.
//! Outcomes are reported as [`Notice`]s to whoever listens on
//! [`Session::on`].

pub mod config;
pub mod error;
pub mod event;
pub mod filename;
pub mod notice;
pub mod storage;
pub mod sync;

mod session;

pub use config::{Config, ConfigStore, RetryPolicy, WorkspaceSource};
pub use error::{ConfigError, Error, Result};
pub use notice::{Notice, NoticeKind};
pub use session::{Session, SessionEvents};
pub use storage::{DocumentHandle, DocumentIndexEntry, Workspace};
pub use sync::{CreateOutcome, DeleteOutcome, DocumentState, OpenDocument, SaveOutcome, SyncEngine};
