use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures of the configuration collaborator (locating, reading and
/// validating the configured workspace folder).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine the user configuration directory")]
    NoConfigDir,

    #[error("Failed to read the configuration file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file format is invalid: {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not serialize the configuration")]
    Serialize(#[source] serde_json::Error),

    #[error("Could not write the configuration file: {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No workspace folder has been configured yet ({0} does not exist)")]
    NotConfigured(PathBuf),

    #[error("The configured notes folder does not exist: {0}")]
    MissingFolder(PathBuf),

    #[error("The configured notes folder is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Gave up loading the configuration after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<Error>,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to list directory contents: {path}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read content from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write content to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not delete file {path}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rename file from {from} to {to}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not check whether {path} exists")]
    ExistenceCheck {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No file selected to save")]
    NoActiveDocument,

    #[error("No workspace directory selected")]
    NoWorkspace,

    #[error("Failed to generate a unique file name with prefix '{prefix}' after {attempts} attempts")]
    Exhausted { prefix: String, attempts: usize },

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("{operation} did not finish within {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl Error {
    /// Short title for a notification reporting this error.
    pub fn title(&self) -> &'static str {
        match self {
            Error::List { .. } => "Error Listing Files",
            Error::Read { .. } => "Error Loading File",
            Error::Write { .. } => "Error Saving File",
            Error::Delete { .. } => "Error Deleting File",
            Error::Rename { .. } => "Error Renaming File",
            Error::ExistenceCheck { .. } => "Error Checking File",
            Error::NoActiveDocument => "Error Saving File",
            Error::NoWorkspace => "Error Creating File",
            Error::Exhausted { .. } => "Error Creating File",
            Error::Configuration(_) => "Configuration Error",
            Error::Timeout { .. } => "Operation Timed Out",
        }
    }

    /// Renders the full chain of underlying causes, outermost first.
    /// Returns `None` when the error has no source.
    pub fn cause_chain(&self) -> Option<String> {
        let mut source = std::error::Error::source(self)?;
        let mut chain = source.to_string();
        while let Some(next) = source.source() {
            chain.push_str(": ");
            chain.push_str(&next.to_string());
            source = next;
        }
        Some(chain)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
