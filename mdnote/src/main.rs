use anyhow::Result;
use clap::Parser;
use mdnote::cli::{Cli, Commands};
use mdnote::{commands, AppContext};
use mdnote_core::{ConfigStore, Notice};
use tracing::debug;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    mdnote::init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        // Core errors were already reported as notices
        if e.downcast_ref::<mdnote_core::Error>().is_none() {
            eprintln!("{} {:#}", console::style("Error:").red().bold(), e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(path) => ConfigStore::at(path),
        None => ConfigStore::default_location().inspect_err(|e| mdnote::report(&Notice::failure(e)))?,
    };
    debug!("Using configuration at {}", config.path().display());
    let mut cx = AppContext::new(config, cli.workspace, cli.quiet);

    match cli.command {
        Commands::List => commands::handle_list(&mut cx).await,
        Commands::New => commands::handle_new(&mut cx).await,
        Commands::Show(args) => commands::handle_show(args, &mut cx).await,
        Commands::Save(args) => commands::handle_save(args, &mut cx).await,
        Commands::Delete(args) => commands::handle_delete(args, &mut cx).await,
        Commands::Workspace(args) => commands::handle_workspace(args, &cx).await,
    }
}
