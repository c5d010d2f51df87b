//! Configuration loading and data folder resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is never fatal: a warning is logged and defaults
//! are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the data folder
pub const DATA_FOLDER_ENV: &str = "CREWDESK_DATA_FOLDER";

/// File name of the persisted worker list inside the data folder
pub const WORKERS_FILE_NAME: &str = "workers.json";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DIRECTORY_URL: &str = "https://asoldi.com";
pub const DEFAULT_DIRECTORY_ROLE: &str = "employee";
pub const DEFAULT_DIRECTORY_ROLE_ALIAS: &str = "ansatt";
pub const DEFAULT_CALL_STATS_URL: &str = "https://www.myphoner.com/api/v1";
pub const DEFAULT_ACCOUNTING_URL: &str = "https://go.lucaregnskap.no/api/v1/graphql";

/// Bootstrap configuration read from `crewdesk.toml`
///
/// All fields are optional; absent values fall through to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub data_folder: Option<PathBuf>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub directory: DirectoryToml,
    #[serde(default)]
    pub call_stats: CallStatsToml,
    #[serde(default)]
    pub accounting: AccountingToml,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[directory]` section: WordPress user directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryToml {
    pub url: Option<String>,
    pub username: Option<String>,
    pub app_password: Option<String>,
    pub role: Option<String>,
    pub role_alias: Option<String>,
    pub prune_missing: Option<bool>,
}

/// `[call_stats]` section: MyPhoner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallStatsToml {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

/// `[accounting]` section: Luca
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountingToml {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub data_folder: PathBuf,
    pub port: u16,
    pub bind: String,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            data_folder: dirs::data_local_dir()
                .map(|d| d.join("crewdesk"))
                .unwrap_or_else(|| PathBuf::from("./crewdesk_data")),
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            log_level: default_log_level(),
        }
    }
}

/// Candidate locations for `crewdesk.toml`, in lookup order
pub fn config_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("crewdesk").join("crewdesk.toml"));
    }
    if cfg!(unix) {
        candidates.push(PathBuf::from("/etc/crewdesk/crewdesk.toml"));
    }
    candidates
}

/// Load the TOML config from an explicit path or the first existing
/// candidate location
///
/// An explicit path that does not exist is a configuration error. When no
/// explicit path is given and no candidate exists, defaults are returned.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return read_toml_config(path);
    }

    match config_file_candidates().into_iter().find(|p| p.exists()) {
        Some(path) => read_toml_config(&path),
        None => {
            warn!("No config file found, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Resolves the folder holding the persisted worker file
pub struct DataFolderResolver<'a> {
    cli_arg: Option<&'a Path>,
    toml_config: &'a TomlConfig,
}

impl<'a> DataFolderResolver<'a> {
    pub fn new(cli_arg: Option<&'a Path>, toml_config: &'a TomlConfig) -> Self {
        Self {
            cli_arg,
            toml_config,
        }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = self.cli_arg {
            return path.to_path_buf();
        }
        if let Some(path) = env_value(DATA_FOLDER_ENV) {
            return PathBuf::from(path);
        }
        if let Some(path) = &self.toml_config.data_folder {
            return path.clone();
        }
        CompiledDefaults::for_current_platform().data_folder
    }
}

/// Creates the data folder and names files inside it
pub struct DataFolderInitializer {
    data_folder: PathBuf,
}

impl DataFolderInitializer {
    pub fn new(data_folder: PathBuf) -> Self {
        Self { data_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.data_folder.exists() {
            std::fs::create_dir_all(&self.data_folder)?;
            info!("Created data folder: {}", self.data_folder.display());
        }
        Ok(())
    }

    pub fn workers_file_path(&self) -> PathBuf {
        self.data_folder.join(WORKERS_FILE_NAME)
    }
}

/// Trim a value and strip one layer of matching surrounding quotes
///
/// Hosting panels often store `"user@example.com"` or `'abcd efgh'` with
/// the quotes included.
pub fn strip_quotes(value: &str) -> String {
    let trimmed = value.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' || first == b'\'') && first == last {
            return trimmed[1..trimmed.len() - 1].trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Read an environment variable with quote stripping; empty counts as unset
pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| strip_quotes(&v))
        .filter(|v| !v.is_empty())
}

/// Resolve a setting from environment first, then TOML
pub fn env_or_toml(env_name: &str, toml_value: Option<&String>) -> Option<String> {
    env_value(env_name).or_else(|| {
        toml_value
            .map(|v| strip_quotes(v))
            .filter(|v| !v.is_empty())
    })
}

/// Describe a secret for logs without revealing it
pub fn describe_secret(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("SET (length: {})", v.len()),
        None => "NOT SET".to_string(),
    }
}
