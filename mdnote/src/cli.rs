use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// mdnote: Markdown notes whose file names follow their titles.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Notes folder to use instead of the configured one.
    #[arg(long, global = true, env = "MDNOTE_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Configuration file to use instead of the default location.
    #[arg(long, global = true, env = "MDNOTE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the notes in the workspace.
    List,
    /// Create a new note with a timestamped name.
    New,
    /// Print the content of a note.
    Show(ShowArgs),
    /// Replace the content of a note and rename it after its title.
    Save(SaveArgs),
    /// Delete a note.
    Delete(DeleteArgs),
    /// Manage the configured notes folder.
    Workspace(WorkspaceArgs),
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// File name of the note, e.g. `my-first-note.md`.
    pub name: String,
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// File name of the note to save.
    pub name: String,

    /// Read the new content from this file instead of stdin.
    #[arg(long, short)]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// File name of the note to delete.
    pub name: String,

    /// Skip the confirmation prompt.
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct WorkspaceArgs {
    #[command(subcommand)]
    pub command: WorkspaceCommands,
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceCommands {
    /// Remember `path` as the notes folder.
    Set {
        /// Existing directory holding the notes.
        path: PathBuf,
    },
    /// Show the configuration file and the configured folder.
    Show {},
}
