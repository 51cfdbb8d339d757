use anyhow::{anyhow, Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm};
use mdnote_core::{Config, ConfigError, DocumentIndexEntry, Error, Notice, Workspace};
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::cli::{DeleteArgs, SaveArgs, ShowArgs, WorkspaceArgs, WorkspaceCommands};
use crate::{report, AppContext};

// --- Handler Functions ---

pub async fn handle_list(cx: &mut AppContext) -> Result<()> {
    cx.open_workspace().await?;
    for entry in cx.session.entries() {
        println!("{}", entry.name);
    }
    Ok(())
}

pub async fn handle_new(cx: &mut AppContext) -> Result<()> {
    cx.open_workspace().await?;
    let handle = cx.session.create_new().await?;
    println!("{}", handle.name());
    Ok(())
}

pub async fn handle_show(args: ShowArgs, cx: &mut AppContext) -> Result<()> {
    cx.open_workspace().await?;
    let (_, entry) = find(cx, &args.name)?;
    let content = cx.session.load(&entry.handle).await?;
    print!("{}", content);
    Ok(())
}

pub async fn handle_save(args: SaveArgs, cx: &mut AppContext) -> Result<()> {
    cx.open_workspace().await?;
    let (_, entry) = find(cx, &args.name)?;

    let content = match &args.input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read content from stdin")?;
            buf
        }
    };

    cx.session.load(&entry.handle).await?;
    let outcome = cx.session.save(content).await?;
    println!("{}", outcome.handle.name());
    Ok(())
}

pub async fn handle_delete(args: DeleteArgs, cx: &mut AppContext) -> Result<()> {
    cx.open_workspace().await?;
    let (index, entry) = find(cx, &args.name)?;

    if !args.force && !confirm(format!("Are you sure you want to delete {}?", entry.name)).await? {
        info!("Deletion of {} cancelled", entry.name);
        return Ok(());
    }

    if let Some(next) = cx.session.delete(&entry.handle, index).await? {
        println!("{}", next.name());
    }
    Ok(())
}

pub async fn handle_workspace(args: WorkspaceArgs, cx: &AppContext) -> Result<()> {
    match args.command {
        WorkspaceCommands::Set { path } => {
            let workspace = Workspace::open(&path).await.inspect_err(report_error)?;
            let config = Config { default_folder: Some(workspace.path().to_path_buf()) };
            cx.config.save(&config).await.inspect_err(report_error)?;
            println!("{}", workspace.path().display());
        }
        WorkspaceCommands::Show {} => {
            println!("Configuration: {}", cx.config.path().display());
            match cx.config.load().await {
                Ok(Config { default_folder: Some(folder) }) => {
                    println!("Notes folder: {}", folder.display());
                }
                Ok(_) | Err(Error::Configuration(ConfigError::NotConfigured(_))) => {
                    println!("Notes folder: not configured");
                }
                Err(e) => {
                    report_error(&e);
                    return Err(e.into());
                }
            }
        }
    }
    Ok(())
}

fn find(cx: &AppContext, name: &str) -> Result<(usize, DocumentIndexEntry)> {
    cx.session
        .entries()
        .into_iter()
        .enumerate()
        .find(|(_, entry)| entry.name == name)
        .ok_or_else(|| anyhow!("No note named '{}' in the workspace", name))
}

fn report_error(err: &Error) {
    report(&Notice::failure(err));
}

async fn confirm(prompt: String) -> Result<bool> {
    let answer = tokio::task::spawn_blocking(move || {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
    })
    .await
    .context("Confirmation prompt failed (panic)")??;
    Ok(answer)
}
