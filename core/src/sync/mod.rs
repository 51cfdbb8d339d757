//! Keeping document file names in step with their titles.
//!
//! [`SyncEngine`] owns the mutating operations on a workspace: creating a new
//! timestamped document, saving content (renaming the file when the title
//! changed) and deleting documents. [`OpenDocument`] tracks the single
//! document open in the editor.

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::document::{DocumentState, OpenDocument};
pub use self::engine::{next_selection, CreateOutcome, DeleteOutcome, SaveOutcome, SyncEngine};

mod clock;
mod document;
mod engine;
