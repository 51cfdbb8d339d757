use std::fmt;

use tracing::{error, info, warn};

use crate::error::Error;
use crate::event::Event;

/// What a [`Notice`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    WorkspaceReady,
    Created,
    Loaded,
    Saved,
    Renamed,
    /// A save replaced another file that already had the target name.
    Overwriting,
    Deleted,
    /// The operation went through, with something the user should know.
    Warning,
    Failed,
}

/// A user-facing notification emitted by a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
    /// Underlying cause of a failure, outermost first.
    pub cause: Option<String>,
}

impl Event for Notice {}

impl Notice {
    pub fn info(kind: NoticeKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice { kind, title: title.into(), message: message.into(), cause: None }
    }

    /// Notice describing `err`, titled after the failed operation.
    pub fn failure(err: &Error) -> Self {
        Notice {
            kind: NoticeKind::Failed,
            title: err.title().to_string(),
            message: err.to_string(),
            cause: err.cause_chain(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice::info(NoticeKind::Warning, title, message)
    }

    /// Warning for a change that reached the disk while the listing could
    /// not be refreshed afterwards.
    pub fn stale_listing(err: &Error) -> Self {
        Notice {
            kind: NoticeKind::Warning,
            title: "File List Out of Date".to_string(),
            message: err.to_string(),
            cause: err.cause_chain(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Failed
    }

    /// Records the notice in the log at a level matching its kind.
    pub(crate) fn log(&self) {
        let cause = self.cause.as_deref().unwrap_or("");
        match self.kind {
            NoticeKind::Failed => error!(title = %self.title, cause, "{}", self.message),
            NoticeKind::Warning => warn!(title = %self.title, cause, "{}", self.message),
            _ => info!(kind = ?self.kind, title = %self.title, "{}", self.message),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " ({cause})")?;
        }
        Ok(())
    }
}
