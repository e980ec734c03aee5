use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::SessionStore;

pub const DEFAULT_SERVER_URL: &str = "https://postsphere-backend-1.onrender.com/api";
pub const SERVER_URL_ENV: &str = "POSTSPHERE_SERVER_URL";

/// Server configuration stored locally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub server_url: String,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            last_updated: chrono::Utc::now(),
        }
    }
}

/// Configuration manager for the `~/.postsphere` directory
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Could not determine home directory")?;
        Self::with_dir(home_dir.join(".postsphere"))
    }

    /// Uses `dir` instead of the home directory, creating it if needed
    pub fn with_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let config_dir = dir.as_ref().to_path_buf();
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }
        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Session store living next to the config files
    pub fn session_store(&self) -> SessionStore {
        SessionStore::in_dir(&self.config_dir)
    }

    fn server_config_file(&self) -> PathBuf {
        self.config_dir.join("server_config.json")
    }

    pub fn save_server_config(&self, config: &ServerConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config).context("Failed to serialize server config")?;
        fs::write(self.server_config_file(), json).context("Failed to write server config file")?;
        Ok(())
    }

    pub fn load_server_config(&self) -> Result<Option<ServerConfig>> {
        let config_file = self.server_config_file();
        if !config_file.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&config_file).context("Failed to read server config file")?;
        let config: ServerConfig = serde_json::from_str(&json).context("Failed to parse server config")?;
        Ok(Some(config))
    }

    pub fn save_server_url(&self, server_url: impl Into<String>) -> Result<()> {
        let config = ServerConfig {
            server_url: server_url.into(),
            last_updated: chrono::Utc::now(),
        };
        self.save_server_config(&config)
    }

    /// Determine the server URL to use based on priority:
    /// 1. CLI argument (highest priority)
    /// 2. Environment variable `POSTSPHERE_SERVER_URL`
    /// 3. Saved configuration file
    /// 4. Built-in default
    pub fn determine_server_url(&self, cli_override: Option<String>) -> Result<String> {
        let env_url = std::env::var(SERVER_URL_ENV).ok();
        if let Some(url) = first_non_blank(cli_override.into_iter().chain(env_url)) {
            return Ok(url);
        }

        // The file is only read when nothing overrides it
        let saved = self.load_server_config()?;
        Ok(resolve_server_url(None, None, saved))
    }
}

fn first_non_blank(sources: impl IntoIterator<Item = String>) -> Option<String> {
    sources
        .into_iter()
        .map(|url| url.trim().to_string())
        .find(|url| !url.is_empty())
}

/// Picks the first non-empty source, falling back to [`DEFAULT_SERVER_URL`]
pub fn resolve_server_url(
    cli_override: Option<String>,
    env_url: Option<String>,
    saved: Option<ServerConfig>,
) -> String {
    first_non_blank(cli_override.into_iter().chain(env_url).chain(saved.map(|c| c.server_url)))
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
}

/// Display-friendly description of a server URL
pub fn describe_server(url: &str) -> &'static str {
    if url.trim_end_matches('/') == DEFAULT_SERVER_URL {
        "Production Server (default)"
    } else if url.contains("localhost") || url.contains("127.0.0.1") {
        "Local Development Server"
    } else {
        "Custom Server"
    }
}
