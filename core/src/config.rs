//! Locating the workspace folder through a small JSON configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::error::{ConfigError, Result};

const APP_DIR: &str = "mdnote";
const CONFIG_FILE: &str = "config.json";

/// Persisted settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Absolute path of the notes folder.
    #[serde(default)]
    pub default_folder: Option<PathBuf>,
}

/// Provides the path of the workspace to open at startup.
#[async_trait]
pub trait WorkspaceSource: Send + Sync {
    async fn load_workspace_path(&self) -> Result<PathBuf>;
}

/// Reads and writes [`Config`] as JSON at a fixed location.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// `<config dir>/mdnote/config.json` for the current user.
    pub fn default_location() -> Result<Self> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::at(base.join(APP_DIR).join(CONFIG_FILE)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        ConfigStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Config> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotConfigured(self.path.clone()).into());
            }
            Err(e) => return Err(ConfigError::Read { path: self.path.clone(), source: e }.into()),
        };
        let config = serde_json::from_slice(&raw)
            .map_err(|e| ConfigError::Parse { path: self.path.clone(), source: e })?;
        debug!("Configuration loaded");
        Ok(config)
    }

    /// Writes `config`, creating the parent directory if needed.
    #[instrument(skip(self, config), fields(path = %self.path.display()))]
    pub async fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_vec_pretty(config).map_err(ConfigError::Serialize)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::Write { path: parent.to_path_buf(), source: e })?;
        }
        fs::write(&self.path, json)
            .await
            .map_err(|e| ConfigError::Write { path: self.path.clone(), source: e })?;
        info!("Configuration saved");
        Ok(())
    }
}

#[async_trait]
impl WorkspaceSource for ConfigStore {
    async fn load_workspace_path(&self) -> Result<PathBuf> {
        let folder = self
            .load()
            .await?
            .default_folder
            .ok_or_else(|| ConfigError::NotConfigured(self.path.clone()))?;

        match fs::metadata(&folder).await {
            Ok(meta) if meta.is_dir() => Ok(folder),
            Ok(_) => Err(ConfigError::NotADirectory(folder).into()),
            Err(_) => Err(ConfigError::MissingFolder(folder).into()),
        }
    }
}

/// How often and how patiently to retry loading the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { attempts: 3, backoff: Duration::from_secs(1) }
    }
}

/// Loads the workspace path, retrying failed attempts after a fixed backoff.
pub async fn load_with_retry(source: &dyn WorkspaceSource, policy: RetryPolicy) -> Result<PathBuf> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match source.load_workspace_path().await {
            Ok(path) => return Ok(path),
            Err(e) if attempt < attempts => {
                warn!("Loading configuration failed (attempt {}/{}): {}", attempt, attempts, e);
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("Loading configuration failed (attempt {}/{}): {}", attempt, attempts, e);
                return Err(ConfigError::RetriesExhausted { attempts, last: Box::new(e) }.into());
            }
        }
    }
}
