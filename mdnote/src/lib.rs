use std::path::PathBuf;

use console::style;
use mdnote_core::event::Subscription;
use mdnote_core::{ConfigStore, Notice, NoticeKind, RetryPolicy, Session};
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod commands;

/// State shared by every command.
pub struct AppContext {
    pub config: ConfigStore,
    /// Folder given on the command line, overriding the configured one.
    pub workspace: Option<PathBuf>,
    pub session: Session,
    _printer: Subscription<Notice>,
}

impl AppContext {
    /// Creates a context whose session notices are printed to stderr.
    /// With `quiet`, only failures and warnings are printed.
    pub fn new(config: ConfigStore, workspace: Option<PathBuf>, quiet: bool) -> Self {
        let session = Session::new();
        let printer = session.on.notice.subscribe(move |notice: &Notice| {
            if notice.is_error() || notice.kind == NoticeKind::Warning || !quiet {
                report(notice);
            }
        });
        AppContext { config, workspace, session, _printer: printer }
    }

    /// Opens the folder given on the command line, or the configured one.
    pub async fn open_workspace(&mut self) -> mdnote_core::Result<()> {
        match &self.workspace {
            Some(path) => self.session.open_workspace(path).await,
            None => self.session.initialize(&self.config, RetryPolicy::default()).await,
        }
    }
}

/// Prints a notice to stderr.
pub fn report(notice: &Notice) {
    let title = match notice.kind {
        NoticeKind::Failed => style(&notice.title).red().bold(),
        NoticeKind::Warning => style(&notice.title).yellow(),
        _ => style(&notice.title).green(),
    };
    eprintln!("{} {}", title, notice.message);
    if let Some(cause) = &notice.cause {
        eprintln!("  {} {}", style("caused by:").dim(), cause);
    }
}

/// Installs the global `tracing` subscriber. `RUST_LOG` takes precedence
/// over the verbosity flags.
pub fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
